// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Unit tests for [super::CPU]
//!
//! These run instructions, and ensure their output is consistent with previous builds
//!
//! General test format:
//! 1. Prepare to do the thing
//! 2. Do the thing
//! 3. Compare the result to the expected result

use super::*;
use crate::{
    error::Fault,
    io::Layout,
    mem::{Region::*, CHARSET, FONT_ADDR},
};
use rand::random;


fn setup_environment() -> (CPU, Mem, Screen) {
    (
        CPU {
            flags: Flags {
                debug: true,
                pause: false,
            },
            ..CPU::default()
        },
        Mem::new(),
        Screen::new(),
    )
}

fn legacy() -> CPU {
    CPU::new(Policy::new(Mode::Legacy, Layout::Cosmac))
}

/// Loads `program` and runs `steps` cycles of it
fn run_program(mut cpu: CPU, program: &[u8], steps: usize) -> (CPU, Mem, Screen) {
    let (mut mem, mut screen) = (Mem::new(), Screen::new());
    mem.load_program(program).unwrap();
    for _ in 0..steps {
        cpu.tick(&mut mem, &mut screen).unwrap();
    }
    (cpu, mem, screen)
}

/// Words that aren't instructions
mod unimplemented {
    use super::*;
    fn expect_unimplemented(word: u16) {
        let (mut cpu, mut mem, mut screen) = setup_environment();
        mem.write(0x200u16, word);
        let err = cpu
            .tick(&mut mem, &mut screen)
            .expect_err("should not be an instruction");
        assert!(matches!(err, Error::UnimplementedInstruction { word: w, addr: 0x200 } if w == word));
        assert!(!err.is_fatal());
        // pc has already moved on
        assert_eq!(0x202, cpu.pc);
    }
    #[test]
    fn ins_0nnn() {
        expect_unimplemented(0x0420)
    }
    #[test]
    fn ins_5xyn() {
        expect_unimplemented(0x500f)
    }
    #[test]
    fn ins_8xyn() {
        expect_unimplemented(0x800f)
    }
    #[test]
    fn ins_9xyn() {
        expect_unimplemented(0x900f)
    }
    #[test]
    fn ins_exbb() {
        expect_unimplemented(0xe00f)
    }
    #[test]
    fn ins_fxbb() {
        expect_unimplemented(0xf00f)
    }
    /// multistep reports the word and carries on
    #[test]
    fn multistep_continues() {
        let (mut cpu, mut mem, mut screen) = setup_environment();
        mem.load_program(&[0xff, 0xff, 0x60, 0x01]).unwrap();
        cpu.multistep(&mut mem, &mut screen, 2).unwrap();
        assert_eq!(1, cpu.v[0]);
        assert_eq!(0x204, cpu.pc);
    }
}

/// 0000 is idle memory
#[test]
fn idle_word_is_a_no_op() {
    let (mut cpu, mut mem, mut screen) = setup_environment();
    let before = cpu.clone();
    cpu.tick(&mut mem, &mut screen).unwrap();
    assert_eq!(0x202, cpu.pc);
    assert_eq!(before.v, cpu.v);
    assert_eq!(before.i, cpu.i);
    assert_eq!(1, cpu.cycle);
}

/// A paused CPU does nothing at all
#[test]
fn paused_cpu_does_nothing() {
    let (mut cpu, mut mem, mut screen) = setup_environment();
    mem.load_program(&[0x60, 0x55]).unwrap();
    cpu.flags.pause();
    let before = cpu.clone();
    cpu.tick(&mut mem, &mut screen).unwrap();
    assert_eq!(before, cpu);
}

mod sys {
    use super::*;
    /// 00e0: Clears the screen memory to 0
    #[test]
    fn clear_screen() {
        let (mut cpu, _, mut screen) = setup_environment();
        for y in 0..32 {
            screen.blit_row(random::<usize>() % 64, y, random(), false);
        }
        cpu.clear_screen(&mut screen);
        assert!(screen.is_blank());
    }

    /// 00ee: Returns from subroutine
    #[test]
    fn ret() {
        let test_addr = random::<u16>() & 0x7ff;
        let (mut cpu, _, _) = setup_environment();
        // Place the address on the stack
        cpu.stack.push(test_addr).unwrap();

        cpu.ret().unwrap();

        // Verify the current address is the address from the stack
        assert_eq!(test_addr, cpu.pc);
        assert!(cpu.stack.is_empty());
    }
}

/// Tests control-flow instructions
///
/// Basically anything that touches the program counter
mod cf {
    use super::*;
    /// 1aaa: Sets the program counter to an absolute address
    #[test]
    fn jump() {
        let (mut cpu, _, _) = setup_environment();
        // Test all valid addresses
        for addr in 0x000..0x1000 {
            // Jump to an address
            cpu.jump(addr);
            // Verify the current address is the jump target address
            assert_eq!(addr, cpu.pc);
        }
    }

    /// 2aaa: Pushes pc onto the stack, then jumps to a
    #[test]
    fn call() {
        let (mut cpu, _, _) = setup_environment();
        // Test all valid addresses
        for addr in 0x000..0x1000 {
            cpu.stack.clear();
            let curr_pc = cpu.pc;
            // Call an address
            cpu.call(addr).unwrap();
            // Verify the current address is the jump target address
            assert_eq!(addr, cpu.pc);
            // Verify the previous address was stored on the stack (sp)
            assert_eq!(&[curr_pc], cpu.stack());
        }
    }

    /// 2300 then 00ee: the return lands just after the call
    #[test]
    fn call_then_return() {
        let mut program = vec![0; 0x102];
        program[..2].copy_from_slice(&[0x23, 0x00]);
        program[0x100..].copy_from_slice(&[0x00, 0xee]);
        let (cpu, _, _) = run_program(CPU::default(), &program, 1);
        assert_eq!(0x300, cpu.pc);
        assert_eq!(&[0x202], cpu.stack());

        let (cpu, _, _) = run_program(CPU::default(), &program, 2);
        assert_eq!(0x202, cpu.pc);
        assert!(cpu.stack().is_empty());
    }

    /// 3xbb: Skips the next instruction if register X == b
    #[test]
    fn skip_equals_immediate() {
        for x in 0..=0xf {
            for n in 0..=0xff {
                for b in [n, n ^ 1, random()] {
                    let (mut cpu, _, _) = setup_environment();
                    cpu.v[x] = n;

                    cpu.skip_equals_immediate(x, b);

                    if n == b {
                        assert_eq!(cpu.pc, 0x202);
                    } else {
                        assert_eq!(cpu.pc, 0x200);
                    }
                }
            }
        }
    }

    /// 4xbb: Skips the next instruction if register X != b
    #[test]
    fn skip_not_equals_immediate() {
        for x in 0..=0xf {
            for n in 0..=0xff {
                let b = random();
                let (mut cpu, _, _) = setup_environment();
                cpu.v[x] = n;

                cpu.skip_not_equals_immediate(x, b);

                if n != b {
                    assert_eq!(cpu.pc, 0x202);
                } else {
                    assert_eq!(cpu.pc, 0x200);
                }
            }
        }
    }

    /// 5xy0: Skips the next instruction if register X == register Y
    #[test]
    fn skip_equals() {
        for x in 0..=0xf {
            for y in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                let (a, b) = (random::<u8>() & 1, random::<u8>() & 1);
                cpu.v[x] = a;
                cpu.v[y] = b;

                cpu.skip_equals(x, y);

                if cpu.v[x] == cpu.v[y] {
                    assert_eq!(cpu.pc, 0x202);
                } else {
                    assert_eq!(cpu.pc, 0x200);
                }
            }
        }
    }

    /// 9xy0: Skip next instruction if X != y
    #[test]
    fn skip_not_equals() {
        for x in 0..=0xf {
            for y in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                let (a, b) = (random::<u8>() & 1, random::<u8>() & 1);
                cpu.v[x] = a;
                cpu.v[y] = b;

                cpu.skip_not_equals(x, y);

                if cpu.v[x] != cpu.v[y] {
                    assert_eq!(cpu.pc, 0x202);
                } else {
                    assert_eq!(cpu.pc, 0x200);
                }
            }
        }
    }

    /// Badr: Jump to &adr + v0
    #[test]
    fn jump_indexed_legacy() {
        let mut cpu = legacy();
        cpu.v[0] = 0x10;
        cpu.v[3] = 0x77;
        cpu.jump_indexed(0x300);
        assert_eq!(0x310, cpu.pc);
    }

    /// Bxnn: Jump to &xnn + vX
    #[test]
    fn jump_indexed_modern() {
        let (mut cpu, _, _) = setup_environment();
        cpu.v[0] = 0x10;
        cpu.v[3] = 0x20;
        cpu.jump_indexed(0x300);
        assert_eq!(0x320, cpu.pc);
    }

    /// The jump target stays in the address space
    #[test]
    fn jump_indexed_wraps() {
        let mut cpu = legacy();
        cpu.v[0] = 0xff;
        cpu.jump_indexed(0xfff);
        assert_eq!(0x0fe, cpu.pc);
    }

    /// pc wraps from the top of memory back to 0
    #[test]
    fn fetch_wraps() {
        let (mut cpu, mem, _) = setup_environment();
        cpu.pc = 0xffe;
        cpu.fetch(&mem);
        assert_eq!(0x000, cpu.pc);
    }
}

/// Stack faults reject the instruction, and stop the CPU
mod faults {
    use super::*;
    /// 17 nested calls: the last one has nowhere to go
    #[test]
    fn stack_overflow() {
        // 2200: call self, forever
        let (mut cpu, mut mem, mut screen) = setup_environment();
        mem.load_program(&[0x22, 0x00]).unwrap();
        for _ in 0..16 {
            cpu.tick(&mut mem, &mut screen).unwrap();
        }
        assert_eq!(16, cpu.stack().len());
        let err = cpu.tick(&mut mem, &mut screen).unwrap_err();
        assert!(matches!(
            err,
            Error::ControlFlow(Fault::StackOverflow { addr: 0x200, target: 0x200 })
        ));
        assert!(err.is_fatal());
        assert!(err.is_control_flow_fault());
        // rejected: nothing moved
        assert_eq!(0x200, cpu.pc);
        assert_eq!(16, cpu.stack().len());
        assert!(cpu.flags.pause);
    }

    /// 00ee with nothing on the stack
    #[test]
    fn stack_underflow() {
        let (mut cpu, mut mem, mut screen) = setup_environment();
        mem.load_program(&[0x00, 0xe0, 0x00, 0xee]).unwrap();
        cpu.tick(&mut mem, &mut screen).unwrap();
        let err = cpu.tick(&mut mem, &mut screen).unwrap_err();
        assert!(matches!(err, Error::ControlFlow(Fault::StackUnderflow { addr: 0x202 })));
        assert_eq!(0x202, cpu.pc);
        assert!(cpu.flags.pause);
        // multistep stops on fatal errors
        cpu.flags.pause = false;
        cpu.multistep(&mut mem, &mut screen, 4).unwrap_err();
    }
}

mod math {
    use super::*;
    /// 6xbb: Loads immediate byte b into register vX
    #[test]
    fn load_immediate() {
        for x in 0..=0xf {
            for b in 0..=0xff {
                let (mut cpu, _, _) = setup_environment();
                cpu.v = random();
                let before = cpu.clone();

                cpu.load_immediate(x, b);

                assert_eq!(cpu.v[x], b);
                // nothing else changed
                for reg in (0..=0xf).filter(|&reg| reg != x) {
                    assert_eq!(before.v[reg], cpu.v[reg]);
                }
                assert_eq!((before.pc, before.i), (cpu.pc, cpu.i));
            }
        }
    }

    /// 7xbb: Adds immediate byte b to register vX
    #[test]
    fn add_immediate() {
        for x in 0..=0xe {
            for byte in 0..=0xff {
                let (mut cpu, _, _) = setup_environment();
                let value: u8 = random();
                cpu.v[x] = value;
                cpu.v[0xf] = 0xa5;

                cpu.add_immediate(x, byte);

                assert_eq!(cpu.v[x], value.wrapping_add(byte));
                // vF is untouched by 7xbb
                assert_eq!(0xa5, cpu.v[0xf]);
            }
        }
    }

    /// 8xy0: Loads the value of y into x
    #[test]
    fn load() {
        for x in 0..=0xf {
            for y in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                let value: u8 = random();
                cpu.v[y] = value;

                cpu.load(x, y);

                assert_eq!(cpu.v[x], value);
            }
        }
    }

    /// 8xy1: Performs bitwise or of vX and vY, and stores the result in vX
    #[test]
    fn or() {
        for (x, y) in (0..=0xe).zip((0..=0xe).rev()) {
            let (mut cpu, _, _) = setup_environment();
            let (a, b): (u8, u8) = (random(), random());
            cpu.v[x] = a;
            cpu.v[y] = b;

            cpu.or(x, y);

            assert_eq!(cpu.v[x], if x == y { b } else { a | b });
        }
    }

    /// 8xy2: Performs bitwise and of vX and vY, and stores the result in vX
    #[test]
    fn and() {
        for (x, y) in (0..=0xe).zip((0..=0xe).rev()) {
            let (mut cpu, _, _) = setup_environment();
            let (a, b): (u8, u8) = (random(), random());
            cpu.v[x] = a;
            cpu.v[y] = b;

            cpu.and(x, y);

            assert_eq!(cpu.v[x], if x == y { b } else { a & b });
        }
    }

    /// 8xy3: Performs bitwise xor of vX and vY, and stores the result in vX
    #[test]
    fn xor() {
        for (x, y) in (0..=0xe).zip((0..=0xe).rev()) {
            let (mut cpu, _, _) = setup_environment();
            let (a, b): (u8, u8) = (random(), random());
            cpu.v[x] = a;
            cpu.v[y] = b;

            cpu.xor(x, y);

            assert_eq!(cpu.v[x], if x == y { 0 } else { a ^ b });
        }
    }

    /// 8xy4: Performs addition of vX and vY, and stores the result in vX, carry in vF
    #[test]
    fn add() {
        for x in 0..=0xe {
            for y in (0..=0xe).filter(|&y| y != x) {
                let (mut cpu, _, _) = setup_environment();
                let (a, b): (u8, u8) = (random(), random());
                cpu.v[x] = a;
                cpu.v[y] = b;

                cpu.add(x, y);

                let (sum, carry) = a.overflowing_add(b);
                assert_eq!(cpu.v[x], sum);
                assert_eq!(cpu.v[0xf], carry as u8);
            }
        }
    }

    /// 8xy4: FF + 01 carries
    #[test]
    fn add_carries() {
        let (mut cpu, _, _) = setup_environment();
        cpu.v[0] = 0xff;
        cpu.v[1] = 0x01;
        cpu.add(0, 1);
        assert_eq!((0x00, 1), (cpu.v[0], cpu.v[0xf]));
    }

    /// 8xy5: Performs subtraction of vX and vY, and stores the result in vX, !borrow in vF
    #[test]
    fn sub() {
        for x in 0..=0xe {
            for y in (0..=0xe).filter(|&y| y != x) {
                let (mut cpu, _, _) = setup_environment();
                let (a, b): (u8, u8) = (random(), random());
                cpu.v[x] = a;
                cpu.v[y] = b;

                cpu.sub(x, y);

                assert_eq!(cpu.v[x], a.wrapping_sub(b));
                assert_eq!(cpu.v[0xf], (a >= b) as u8);
            }
        }
    }

    /// 8xy5: 05 - 0A borrows
    #[test]
    fn sub_borrows() {
        let (mut cpu, _, _) = setup_environment();
        cpu.v[0] = 0x05;
        cpu.v[1] = 0x0a;
        cpu.sub(0, 1);
        assert_eq!((0xfb, 0), (cpu.v[0], cpu.v[0xf]));
    }

    /// 8xy5 with X = F: the flag wins
    #[test]
    fn sub_into_vf() {
        let (mut cpu, _, _) = setup_environment();
        cpu.v[0xf] = 0x10;
        cpu.v[1] = 0x01;
        cpu.sub(0xf, 1);
        assert_eq!(1, cpu.v[0xf]);
    }

    /// 8xy6, 8xy7, 8xyE with X = F: the flag wins
    #[test]
    fn flag_wins_in_vf() {
        let (mut cpu, _, _) = setup_environment();
        // modern shifts read vX
        cpu.v[0xf] = 0x81;
        cpu.shift_right(0xf, 1);
        assert_eq!(1, cpu.v[0xf]);
        cpu.v[0xf] = 0x81;
        cpu.shift_left(0xf, 1);
        assert_eq!(1, cpu.v[0xf]);
        cpu.v[0xf] = 0x02;
        cpu.v[1] = 0x01;
        cpu.backwards_sub(0xf, 1);
        assert_eq!(0, cpu.v[0xf]);
    }

    /// 8xy7: Performs subtraction of vY and vX, and stores the result in vX, !borrow in vF
    #[test]
    fn backwards_sub() {
        for x in 0..=0xe {
            for y in (0..=0xe).filter(|&y| y != x) {
                let (mut cpu, _, _) = setup_environment();
                let (a, b): (u8, u8) = (random(), random());
                cpu.v[x] = a;
                cpu.v[y] = b;

                cpu.backwards_sub(x, y);

                assert_eq!(cpu.v[x], b.wrapping_sub(a));
                assert_eq!(cpu.v[0xf], (b >= a) as u8);
            }
        }
    }

    /// 8xy6: Performs bitwise right shift of vX
    #[test]
    fn shift_right_modern() {
        for word in 0..=0xff {
            let (mut cpu, _, _) = setup_environment();
            cpu.v[0] = word;
            cpu.v[1] = 0x5a;

            cpu.shift_right(0, 1);

            assert_eq!(cpu.v[0], word >> 1);
            assert_eq!(cpu.v[0xf], word & 1);
        }
    }

    /// 8xy6: Copies vY into vX, then shifts
    #[test]
    fn shift_right_legacy() {
        for word in 0..=0xff {
            let mut cpu = legacy();
            cpu.v[0] = 0x5a;
            cpu.v[1] = word;

            cpu.shift_right(0, 1);

            assert_eq!(cpu.v[0], word >> 1);
            assert_eq!(cpu.v[0xf], word & 1);
        }
    }

    /// 8xyE: Performs bitwise left shift of vX
    #[test]
    fn shift_left_modern() {
        for word in 0..=0xff {
            let (mut cpu, _, _) = setup_environment();
            cpu.v[0] = word;
            cpu.v[1] = 0x5a;

            cpu.shift_left(0, 1);

            assert_eq!(cpu.v[0], word << 1);
            assert_eq!(cpu.v[0xf], word >> 7);
        }
    }

    /// 8xyE: Copies vY into vX, then shifts
    #[test]
    fn shift_left_legacy() {
        for word in 0..=0xff {
            let mut cpu = legacy();
            cpu.v[0] = 0x5a;
            cpu.v[1] = word;

            cpu.shift_left(0, 1);

            assert_eq!(cpu.v[0], word << 1);
            assert_eq!(cpu.v[0xf], word >> 7);
        }
    }
}

mod i {
    use super::*;
    /// Aadr: Load address #adr into register I
    #[test]
    fn load_i_immediate() {
        for addr in 0..0x1000 {
            let (mut cpu, _, _) = setup_environment();
            cpu.load_i_immediate(addr);
            assert_eq!(cpu.i, addr);
        }
    }

    /// Fx1e: Add vX to I
    #[test]
    fn add_i() {
        for x in 0..=0xe {
            let (mut cpu, _, _) = setup_environment();
            let (i, v) = (random::<u16>() & 0xeff, random::<u8>());
            cpu.i = i;
            cpu.v[x] = v;

            cpu.add_i(x);

            assert_eq!(cpu.i, i + v as u16);
            assert_eq!(0, cpu.v[0xf]);
        }
    }

    /// Fx1e: leaving the address space sets vF, and I isn't masked
    #[test]
    fn add_i_overflow() {
        let (mut cpu, _, _) = setup_environment();
        cpu.i = 0xfff;
        cpu.v[2] = 0x01;
        cpu.add_i(2);
        assert_eq!(0x1000, cpu.i);
        assert_eq!(1, cpu.v[0xf]);
    }

    /// Fx29: Load sprite for character x into I
    #[test]
    fn load_sprite() {
        for digit in 0..=0xff {
            let (mut cpu, _, _) = setup_environment();
            cpu.v[3] = digit;
            cpu.load_sprite(3);
            assert_eq!(FONT_ADDR + 5 * (digit as u16 % 16), cpu.i);
        }
    }
}

mod io {
    use super::*;

    /// Cxbb: Stores a random number + the provided byte into vX
    #[test]
    fn rand() {
        for x in 0..=0xf {
            for mask in [0x00, 0x0f, 0xf0, 0x81] {
                let (mut cpu, _, _) = setup_environment();
                cpu.rand(x, mask);
                assert_eq!(cpu.v[x] & !mask, 0);
            }
        }
    }

    mod display {
        use super::*;

        /// Loads `digit`'s glyph into memory at 0x300, points I at it, and puts it at (x, y)
        fn setup_glyph(digit: usize, x: u8, y: u8) -> (CPU, Mem, Screen) {
            let (mut cpu, mut mem, screen) = setup_environment();
            for (offset, &byte) in CHARSET[digit * 5..digit * 5 + 5].iter().enumerate() {
                mem.write(0x300 + offset, byte);
            }
            cpu.i = 0x300;
            cpu.v[0] = x;
            cpu.v[1] = y;
            (cpu, mem, screen)
        }

        /// Dxyn: the glyph for 0 at the origin
        #[test]
        fn draw_glyph() {
            let (mut cpu, mem, mut screen) = setup_glyph(0, 0, 0);
            cpu.draw(0, 1, 5, &mem, &mut screen);
            assert_eq!(0, cpu.v[0xf]);
            // F0 90 90 90 F0
            for (y, byte) in [0xf0u64, 0x90, 0x90, 0x90, 0xf0].into_iter().enumerate() {
                assert_eq!(Some(byte << 56), screen.row(y));
            }
            assert_eq!(14, screen.lit());
        }

        /// Dxyn twice: the second draw erases the first, and collides
        #[test]
        fn draw_twice_collides() {
            let (mut cpu, mem, mut screen) = setup_glyph(0, 10, 4);
            cpu.draw(0, 1, 5, &mem, &mut screen);
            assert_eq!(0, cpu.v[0xf]);
            cpu.draw(0, 1, 5, &mem, &mut screen);
            assert_eq!(1, cpu.v[0xf]);
            assert!(screen.is_blank());
        }

        /// Dxyn: the origin wraps, the rest of the sprite is clipped
        #[test]
        fn draw_clips() {
            // 126 wraps to 62 on the x axis, 35 wraps to 3 on the y axis
            let (mut cpu, mem, mut screen) = setup_glyph(8, 126, 35);
            cpu.draw(0, 1, 5, &mem, &mut screen);
            assert!(screen.pixel(62, 3));
            assert!(screen.pixel(63, 3));
            assert_eq!(6, screen.lit());
            // nothing spilled over onto the left edge
            for y in 0..32 {
                assert!(!screen.pixel(0, y));
            }

            // the bottom of the sprite is clipped
            let (mut cpu, mem, mut screen) = setup_glyph(8, 0, 30);
            cpu.draw(0, 1, 5, &mem, &mut screen);
            assert_eq!(Some(0xf0 << 56), screen.row(30));
            assert_eq!(Some(0x90 << 56), screen.row(31));
            assert_eq!(Some(0), screen.row(0));
        }

        /// Dxyn: with the wrap quirk on, the sprite wraps around instead
        #[test]
        fn draw_wraps() {
            let (_, mem, mut screen) = setup_glyph(8, 62, 30);
            let mut cpu = CPU::new(Policy::default().with_screen_wrap(true));
            cpu.i = 0x300;
            cpu.v[0] = 62;
            cpu.v[1] = 30;
            cpu.draw(0, 1, 5, &mem, &mut screen);
            // F0: 62, 63, 0, 1
            assert!(screen.pixel(62, 30) && screen.pixel(63, 30));
            assert!(screen.pixel(0, 30) && screen.pixel(1, 30));
            // third row of 8 (F0) lands on row 0
            assert!(screen.pixel(62, 0) && screen.pixel(1, 0));
        }

        /// Dxy0 draws nothing
        #[test]
        fn draw_nothing() {
            let (mut cpu, mem, mut screen) = setup_glyph(0, 0, 0);
            cpu.v[0xf] = 1;
            cpu.draw(0, 1, 0, &mem, &mut screen);
            assert!(screen.is_blank());
            assert_eq!(0, cpu.v[0xf]);
        }

        /// Fx29 then Dxyn, through the instruction stream
        #[test]
        fn draw_font() {
            let (cpu, _, screen) = run_program(
                CPU::default(),
                &[
                    0x60, 0x07, // mov #07, v0
                    0xf0, 0x29, // font v0, I
                    0xd1, 0x15, // draw #5, v1, v1
                ],
                3,
            );
            assert_eq!(FONT_ADDR + 35, cpu.i);
            // 7 is F0 10 20 40 40
            assert_eq!(Some(0xf0 << 56), screen.row(0));
            assert_eq!(Some(0x10 << 56), screen.row(1));
            assert_eq!(Some(0x40 << 56), screen.row(4));
        }
    }

    mod keys {
        use super::*;
        /// Ex9E: Skip next instruction if key == #X
        #[test]
        fn skip_key_equals() {
            for key in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                cpu.v[0] = key as u8;

                cpu.skip_key_equals(0);
                assert_eq!(0x200, cpu.pc);

                cpu.press(key).unwrap();
                cpu.skip_key_equals(0);
                assert_eq!(0x202, cpu.pc);
            }
        }

        /// ExA1: Skip next instruction if key != #X
        #[test]
        fn skip_key_not_equals() {
            for key in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                cpu.v[0] = key as u8;

                cpu.skip_key_not_equals(0);
                assert_eq!(0x202, cpu.pc);

                cpu.press(key).unwrap();
                cpu.skip_key_not_equals(0);
                assert_eq!(0x202, cpu.pc);
            }
        }

        /// Ex9E/ExA1: vX past the last key is never held
        #[test]
        fn skip_key_out_of_range() {
            let (mut cpu, mut mem, mut screen) = setup_environment();
            mem.load_program(&[
                0x60, 0x13, // mov #13, v0
                0xe0, 0x9e, // sek v0
                0xe0, 0xa1, // snek v0
            ])
            .unwrap();
            cpu.set_keys(1 << 3);
            cpu.tick(&mut mem, &mut screen).unwrap();
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(0x204, cpu.pc);
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(0x208, cpu.pc);
        }

        /// Fx0A: Wait for key, then continue
        #[test]
        fn wait_for_key() {
            let (mut cpu, mut mem, mut screen) = setup_environment();
            mem.load_program(&[0xf5, 0x0a, 0x61, 0x01]).unwrap();
            // no key: parked on the wait
            for _ in 0..10 {
                cpu.tick(&mut mem, &mut screen).unwrap();
                assert_eq!(0x200, cpu.pc);
                assert_eq!(Some(5), cpu.awaiting_key());
            }
            // wrong key: still parked
            cpu.press(4).unwrap();
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(0x200, cpu.pc);
            // the key: moves past the wait
            cpu.press(5).unwrap();
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(0x202, cpu.pc);
            assert_eq!(None, cpu.awaiting_key());
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(1, cpu.v[1]);
        }

        /// Fx0A: a key that's already held doesn't wait
        #[test]
        fn wait_for_held_key() {
            let (mut cpu, mut mem, mut screen) = setup_environment();
            mem.load_program(&[0xf5, 0x0a]).unwrap();
            cpu.press(5).unwrap();
            cpu.tick(&mut mem, &mut screen).unwrap();
            assert_eq!(0x202, cpu.pc);
            assert_eq!(None, cpu.awaiting_key());
        }

        #[test]
        fn press_invalid_key() {
            let (mut cpu, _, _) = setup_environment();
            assert!(matches!(cpu.press(0x10), Err(Error::InvalidKey { key: 0x10 })));
            assert!(cpu.release(0x10).is_err());
            assert_eq!(0, cpu.keys());
        }

        #[test]
        fn release() {
            let (mut cpu, _, _) = setup_environment();
            cpu.press(0xa).unwrap();
            assert!(cpu.is_pressed(0xa));
            assert!(cpu.release(0xa).unwrap());
            assert!(!cpu.release(0xa).unwrap());
            assert!(!cpu.is_pressed(0xa));
        }
    }

    mod timers {
        use super::*;
        /// Fx07: Get the current DT, and put it in vX
        #[test]
        fn load_delay_timer() {
            for x in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                cpu.delay = random();
                cpu.load_delay_timer(x);
                assert_eq!(cpu.v[x], cpu.delay);
            }
        }

        /// Fx15: Load vX into DT
        #[test]
        fn store_delay_timer() {
            for x in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                cpu.v[x] = random();
                cpu.store_delay_timer(x);
                assert_eq!(cpu.v[x], cpu.delay);
            }
        }

        /// Fx18: Load vX into ST
        #[test]
        fn store_sound_timer() {
            for x in 0..=0xf {
                let (mut cpu, _, _) = setup_environment();
                cpu.v[x] = random();
                cpu.store_sound_timer(x);
                assert_eq!(cpu.v[x], cpu.sound);
            }
        }

        /// 60 timer ticks take 60 down to 0, and no further
        #[test]
        fn count_down() {
            let (mut cpu, _, _) = setup_environment();
            cpu.delay = 60;
            cpu.sound = 30;
            assert!(cpu.is_sounding());
            for _ in 0..30 {
                cpu.tick_timers();
            }
            assert_eq!(30, cpu.delay);
            assert!(!cpu.is_sounding());
            for _ in 0..40 {
                cpu.tick_timers();
            }
            assert_eq!((0, 0), (cpu.delay, cpu.sound));
        }
    }

    /// Fx33: BCD convert X into I`[0..3]`
    #[test]
    fn bcd_convert() {
        for x in 0..=0xff {
            let (mut cpu, mut mem, _) = setup_environment();
            cpu.v[5] = x;
            cpu.i = 0x400;
            cpu.bcd_convert(5, &mut mem);
            let bcd: [u8; 3] = [mem.read(0x400u16), mem.read(0x401u16), mem.read(0x402u16)];
            assert_eq!([x / 100, x / 10 % 10, x % 10], bcd);
        }
    }

    /// Fx33 near the top of memory wraps around
    #[test]
    fn bcd_convert_wraps() {
        let (mut cpu, mut mem, _) = setup_environment();
        cpu.v[0] = 123;
        cpu.i = 0xfff;
        cpu.bcd_convert(0, &mut mem);
        let hi: u8 = mem.read(0xfffu16);
        let lo: u8 = mem.read(0x001u16);
        assert_eq!((1, 3), (hi, lo));
        // the font is at 0x050; 0x000..0x002 are free
        assert_eq!(&CHARSET[..], &mem.get_region(Charset)[..]);
    }

    mod dma {
        use super::*;
        /// Fx55: DMA Stor from I to registers 0..=X
        #[test]
        fn store_dma_modern() {
            for x in 0..=0xf {
                let (mut cpu, mut mem, _) = setup_environment();
                cpu.v = random();
                cpu.i = 0x456;
                cpu.store_dma(x, &mut mem);
                for reg in 0..=x {
                    let byte: u8 = mem.read(0x456 + reg);
                    assert_eq!(cpu.v[reg], byte);
                }
                // the register after the last one stays put
                let next: u8 = mem.read(0x456 + x + 1);
                assert_eq!(0, next);
                assert_eq!(0x456, cpu.i);
            }
        }

        /// Fx55: on the COSMAC VIP, I ends up just past the last byte
        #[test]
        fn store_dma_legacy() {
            for x in 0..=0xf {
                let (_, mut mem, _) = setup_environment();
                let mut cpu = legacy();
                cpu.i = 0x456;
                cpu.store_dma(x, &mut mem);
                assert_eq!(0x456 + x as u16 + 1, cpu.i);
            }
        }

        /// Fx65: DMA Load from I to registers 0..=X
        #[test]
        fn load_dma_modern() {
            for x in 0..=0xf {
                let (mut cpu, mut mem, _) = setup_environment();
                for addr in 0x456..0x466usize {
                    mem.write(addr, random::<u8>());
                }
                cpu.i = 0x456;
                cpu.load_dma(x, &mem);
                for reg in 0..=0xf {
                    let byte: u8 = mem.read(0x456 + reg);
                    if reg <= x {
                        assert_eq!(byte, cpu.v[reg]);
                    } else {
                        assert_eq!(0, cpu.v[reg]);
                    }
                }
                assert_eq!(0x456, cpu.i);
            }
        }

        /// Fx65: on the COSMAC VIP, I ends up just past the last byte
        #[test]
        fn load_dma_legacy() {
            for x in 0..=0xf {
                let (_, mem, _) = setup_environment();
                let mut cpu = legacy();
                cpu.i = 0x456;
                cpu.load_dma(x, &mem);
                assert_eq!(0x456 + x as u16 + 1, cpu.i);
            }
        }

        /// Fx55 across the top of memory wraps around
        #[test]
        fn store_dma_wraps() {
            let (mut cpu, mut mem, _) = setup_environment();
            cpu.v[0] = 0xaa;
            cpu.v[1] = 0xbb;
            cpu.i = 0xfff;
            cpu.store_dma(1, &mut mem);
            let (top, bottom): (u8, u8) = (mem.read(0xfffu16), mem.read(0x000u16));
            assert_eq!((0xaa, 0xbb), (top, bottom));
        }
    }
}

mod misc {
    use super::*;
    #[test]
    fn set_v() {
        let (mut cpu, _, _) = setup_environment();
        for reg in 0..=0xf {
            cpu.set_v(reg, reg as u8 ^ 0x5a).unwrap();
            assert_eq!(reg as u8 ^ 0x5a, cpu.v()[reg]);
        }
        assert!(matches!(cpu.set_v(0x10, 0), Err(Error::InvalidRegister { reg: 0x10 })));
    }

    #[test]
    fn reset() {
        let (mut cpu, _, _) = run_program(
            CPU::default(),
            &[
                0x60, 0x3c, // mov #3c, v0
                0xf0, 0x15, // mov v0, DT
                0x22, 0x00, // call 200
            ],
            3,
        );
        cpu.flags.debug = true;
        cpu.press(3).unwrap();
        cpu.reset();
        assert_eq!(
            CPU {
                flags: Flags {
                    debug: true,
                    pause: false
                },
                ..CPU::default()
            },
            cpu
        );
    }

    #[test]
    fn peek_doesnt_move() {
        let (cpu, mut mem, _) = setup_environment();
        mem.write(0x200u16, 0x1234u16);
        assert_eq!(0x1234, cpu.peek(&mem).word);
        assert_eq!(0x200, cpu.pc);
    }

    #[test]
    fn dump() {
        let (cpu, _, _) = setup_environment();
        cpu.dump();
    }

    #[test]
    fn policy() {
        let cpu = legacy();
        assert_eq!(Mode::Legacy, cpu.policy().mode());
        assert_eq!(Quirks::from(Mode::Legacy), cpu.quirks());
    }
}
