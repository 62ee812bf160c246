//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` executes LC-3 binary images: a flat 64K-word memory, eight
//! general purpose registers, a program counter and condition flags.
//! Usage starts with loading one or more images via
//! [`emulator::Emulator::load_image_bytes`] or
//! [`emulator::Emulator::load_image_file`], then running
//! [`emulator::Emulator::execute`].
//!
//! # Example
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use lc3_vm::emulator::{Emulator, RunState};
//! use lc3_vm::hardware::keyboard::TerminalInputProvider;
//!
//! let keyboard = Rc::new(RefCell::new(TerminalInputProvider::new()));
//! let mut emulator = Emulator::new(keyboard);
//! // .ORIG x3000; AND R0, R0, #0; ADD R0, R0, #5; TRAP HALT
//! emulator
//!     .load_image_bytes(&[0x30, 0x00, 0x50, 0x20, 0x10, 0x25, 0xF0, 0x25])
//!     .unwrap();
//! let mut output = Vec::new();
//! assert_eq!(emulator.execute(&mut output).unwrap(), RunState::Halted);
//! assert_eq!(emulator.registers().get(0), 5);
//! ```
//! # Errors
//! - Image is shorter than its one-word origin header
//! - Image file cannot be read
//! - Program executes a reserved opcode or an unknown trap vector

pub mod emulator;
pub mod errors;
pub mod hardware;
pub(crate) mod numbers;
pub mod terminal;
