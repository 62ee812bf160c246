use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::io::Write;
use std::rc::Rc;

pub struct StringWriter {
    vec: Vec<u8>,
}
impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.vec.write(data)
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
impl StringWriter {
    pub fn new() -> Self {
        let vec = Vec::<u8>::with_capacity(120);
        Self { vec }
    }
    pub fn get_string(&self) -> String {
        String::from_utf8(self.vec.clone()).unwrap()
    }
}

/// Keyboard provider fed from a fixed script instead of a terminal.
///
/// An exhausted script behaves like a user abort, so a test with a program
/// that reads more input than scripted terminates instead of blocking.
pub struct FakeKeyboardInputProvider {
    input: VecDeque<u8>,
    is_interrupted: bool,
}
impl FakeKeyboardInputProvider {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            is_interrupted: false,
        }
    }
    pub fn interrupt(&mut self) {
        self.is_interrupted = true;
    }
}
impl KeyboardInputProvider for FakeKeyboardInputProvider {
    fn poll_input(&mut self) -> io::Result<bool> {
        Ok(!self.is_interrupted && !self.input.is_empty())
    }
    fn read_input(&mut self) -> io::Result<u8> {
        if self.is_interrupted {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::Interrupted))
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}

pub fn create_memory(input: &str) -> Memory {
    Memory::new(Rc::new(RefCell::new(FakeKeyboardInputProvider::new(input))))
}
