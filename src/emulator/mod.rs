//! The instruction execution engine.
//!
//! [`Emulator::execute`] repeatedly fetches the word at PC, advances PC,
//! decodes the opcode and runs the matching handler until the program halts,
//! faults or the user aborts the run.
pub(crate) mod instruction;
pub(crate) mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub(crate) mod trap_routines;

use crate::emulator::instruction::Instruction;
use crate::emulator::opcodes::Opcode;
use crate::errors::{ExecutionError, ImageLoadError};
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;

/// State of the execution loop.
///
/// `Halted` is reached only through the HALT trap, `Faulted` only through a
/// reserved opcode or an unknown trap vector. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
    Faulted,
}

/// The public facing virtual machine used to run LC-3 images.
///
/// Owns the register file and the memory, both live for exactly one run.
/// Keyboard input comes from the injected [`KeyboardInputProvider`], program
/// output goes to the `Write` sink passed to [`Emulator::execute`].
pub struct Emulator {
    registers: Registers,
    memory: Memory,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
    state: RunState,
}

impl Emulator {
    #[must_use]
    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            registers: Registers::new(),
            memory: Memory::new(Rc::clone(&keyboard)),
            keyboard,
            state: RunState::Running,
        }
    }

    /// Loads one image byte stream into memory and returns its origin.
    ///
    /// May be called multiple times, later images overwrite earlier ones at
    /// overlapping addresses.
    ///
    /// # Errors
    /// - Image is shorter than its one-word origin header
    pub fn load_image_bytes(&mut self, image: &[u8]) -> Result<u16, ImageLoadError> {
        self.memory.load_image(image)
    }

    /// Reads an image file from disk and loads it into memory.
    ///
    /// # Errors
    /// - Image file cannot be read
    /// - Image is shorter than its one-word origin header
    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<u16, ImageLoadError> {
        let path = path.as_ref();
        let image = fs::read(path).map_err(|source| ImageLoadError::ImageFileUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        self.memory.load_image(&image)
    }

    /// Runs the fetch-decode-dispatch loop until a terminal state.
    ///
    /// Returns the reached [`RunState`] on a regular end of the run. A
    /// reserved opcode or an unknown trap vector faults the machine and is
    /// returned as the error it raised, a user abort surfaces as
    /// [`ExecutionError::Interrupted`].
    ///
    /// # Errors
    /// - [`ExecutionError::IllegalInstruction`], [`ExecutionError::UnknownTrapVector`]
    /// - [`ExecutionError::InputOutput`] on a failing host read or write
    /// - [`ExecutionError::Interrupted`] on a user abort
    pub fn execute(&mut self, output: &mut impl Write) -> Result<RunState, ExecutionError> {
        while self.state == RunState::Running {
            if self.keyboard.borrow().is_interrupted() {
                return Err(ExecutionError::Interrupted);
            }
            self.step(output)?;
        }
        Ok(self.state)
    }

    /// Executes exactly one instruction.
    fn step(&mut self, output: &mut impl Write) -> Result<(), ExecutionError> {
        let instruction_address = self.registers.pc();
        let instruction = Instruction::from(self.memory.read(instruction_address));
        self.registers.set_pc(instruction_address.wrapping_add(1));
        let opcode =
            Opcode::n(instruction.op_code()).expect("a 4 bit field always maps to an Opcode");
        match opcode {
            Opcode::Add => opcodes::add(instruction, &mut self.registers),
            Opcode::And => opcodes::and(instruction, &mut self.registers),
            Opcode::Not => opcodes::not(instruction, &mut self.registers),
            Opcode::Br => opcodes::br(instruction, &mut self.registers),
            Opcode::Jmp => opcodes::jmp_or_ret(instruction, &mut self.registers),
            Opcode::Jsr => opcodes::jsr(instruction, &mut self.registers),
            Opcode::Ld => opcodes::ld(instruction, &mut self.registers, &mut self.memory),
            Opcode::Ldi => opcodes::ldi(instruction, &mut self.registers, &mut self.memory),
            Opcode::Ldr => opcodes::ldr(instruction, &mut self.registers, &mut self.memory),
            Opcode::Lea => opcodes::lea(instruction, &mut self.registers),
            Opcode::St => opcodes::st(instruction, &self.registers, &mut self.memory),
            Opcode::Sti => opcodes::sti(instruction, &self.registers, &mut self.memory),
            Opcode::Str => opcodes::str(instruction, &self.registers, &mut self.memory),
            Opcode::Rti | Opcode::Reserved => {
                self.state = RunState::Faulted;
                return Err(ExecutionError::IllegalInstruction {
                    opcode: instruction.op_code(),
                    address: instruction_address,
                });
            }
            Opcode::Trap => match trap_routines::execute(
                instruction,
                &mut self.registers,
                &mut self.memory,
                &self.keyboard,
                output,
            ) {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(Ok(())) => self.state = RunState::Halted,
                ControlFlow::Break(Err(e)) => {
                    if matches!(e, ExecutionError::UnknownTrapVector { .. }) {
                        self.state = RunState::Faulted;
                    }
                    return Err(e);
                }
            },
        }
        Ok(())
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    #[must_use]
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }
}
