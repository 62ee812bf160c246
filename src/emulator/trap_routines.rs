//! Trap routines for the six LC-3 system calls.
//!
//! Each routine is synchronous. GETC and IN block the whole loop on the
//! keyboard provider, all other routines only touch memory and the output
//! sink. `ControlFlow::Break(Ok(()))` signals HALT, `Break(Err(..))` a
//! loop-terminating failure.
use crate::emulator::instruction::Instruction;
use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::io;
use std::io::Write;
use std::ops::ControlFlow;
use std::rc::Rc;

/// Trap vectors of the six implemented system calls.
#[repr(u8)]
#[derive(enumn::N)]
pub enum TrapVector {
    Getc = 0x20,
    Out = 0x21,
    Puts = 0x22,
    In = 0x23,
    Putsp = 0x24,
    Halt = 0x25,
}

/// Saves the return address in R7 and dispatches on the trap vector.
///
/// An unknown vector is a fault, the simulated firmware has no handler
/// for it.
pub fn execute(
    i: Instruction,
    regs: &mut Registers,
    memory: &mut Memory,
    keyboard: &Rc<RefCell<dyn KeyboardInputProvider>>,
    output: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    regs.set(7, regs.pc());
    match TrapVector::n(i.trap_vector()) {
        Some(TrapVector::Getc) => get_c(regs, keyboard),
        Some(TrapVector::Out) => out(regs, output),
        Some(TrapVector::Puts) => put_s(regs, memory, output),
        Some(TrapVector::In) => in_trap(regs, keyboard, output),
        Some(TrapVector::Putsp) => put_sp(regs, memory, output),
        Some(TrapVector::Halt) => halt(output),
        None => ControlFlow::Break(Err(ExecutionError::UnknownTrapVector {
            vector: i.trap_vector(),
            address: regs.pc().wrapping_sub(1),
        })),
    }
}

fn read_character_from_keyboard(
    regs: &mut Registers,
    keyboard: &Rc<RefCell<dyn KeyboardInputProvider>>,
) -> ControlFlow<Result<(), ExecutionError>> {
    match keyboard.borrow_mut().read_input() {
        Ok(byte) => {
            regs.set(0, u16::from(byte));
            regs.update_condition(0);
            ControlFlow::Continue(())
        }
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(
    regs: &mut Registers,
    keyboard: &Rc<RefCell<dyn KeyboardInputProvider>>,
) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_keyboard(regs, keyboard)
}

/// IN: Print a prompt on the screen, read a single character and echo it back.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(
    regs: &mut Registers,
    keyboard: &Rc<RefCell<dyn KeyboardInputProvider>>,
    output: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("Input: ", output)?;
    read_character_from_keyboard(regs, keyboard)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "R0 holds one freshly read byte here"
    )]
    let echo = regs.get(0) as u8 as char;
    write_str_out(&String::from(echo), output)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, output: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    let c = (regs.get(0) & 0xFF) as u8 as char;
    write_str_out(&String::from(c), output)
}

fn put_one_char_per_u16(input: u16, append_to: &mut String) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Truncation is what is expected here"
    )]
    let c = (input as u8) as char;
    append_to.push(c);
}

fn put_two_chars_per_u16(input: u16, append_to: &mut String) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Truncation is what is expected here"
    )]
    let c = (input as u8) as char;
    append_to.push(c);
    let c = ((input >> 8) as u8) as char;
    if c != '\0' {
        append_to.push(c);
    }
}

fn put(
    regs: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
    handle_char: fn(u16, &mut String),
) -> ControlFlow<Result<(), ExecutionError>> {
    let mut address = regs.get(0);
    let mut s = String::with_capacity(120);
    loop {
        let word = memory.read(address);
        if word == 0 {
            break;
        }
        handle_char(word, &mut s);
        address = address.wrapping_add(1);
    }
    write_str_out(s.as_str(), output)
}

/// PUTS: print the zero-terminated string of one character per word starting
/// at the address in R0, the zero word is not printed.
pub fn put_s(
    regs: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, memory, output, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a zero word.
pub fn put_sp(
    regs: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, memory, output, put_two_chars_per_u16)
}

/// HALT: End program and print a notice.
pub fn halt(output: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("\nProgram halted\n", output)?;
    ControlFlow::Break(Ok(()))
}

fn write_str_out(
    message: &str,
    output: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    match write!(output, "{message}").and_then(|()| output.flush()) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

fn wrap_io_error_in_cf(error: &io::Error) -> ControlFlow<Result<(), ExecutionError>, ()> {
    ControlFlow::Break(Err(ExecutionError::from_io_error(error)))
}
