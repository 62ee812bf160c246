use crate::errors::ImageLoadError;
use crate::hardware::keyboard::KeyboardInputProvider;
use std::cell::RefCell;
use std::rc::Rc;

/// Number of addressable 16-bit words.
pub const MEMORY_SIZE: usize = 1 << 16;

/// Memory addresses mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N)]
pub enum MemoryMappedIOLocation {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
}

/// The flat LC-3 address space with the keyboard device mapped into it.
///
/// Reads of the keyboard status register poll the input provider first,
/// every other address is ordinary storage. Addresses are 16 bit, so no
/// access can be out of range.
pub struct Memory {
    /// Index equals memory address
    data: Vec<u16>,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
}

impl Memory {
    const KEYBOARD_STATUS_READY: u16 = 1 << 15;

    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE],
            keyboard,
        }
    }

    /// Reads the word at `address`.
    ///
    /// Reading the keyboard status register polls the keyboard: a pending
    /// character sets the status word's top bit and lands in the keyboard
    /// data register, otherwise the status word is cleared.
    pub fn read(&mut self, address: u16) -> u16 {
        if let Some(MemoryMappedIOLocation::Kbsr) = MemoryMappedIOLocation::n(address) {
            self.poll_keyboard();
        }
        self.data[usize::from(address)]
    }

    /// Unconditional store, no interception.
    pub fn write(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    fn poll_keyboard(&mut self) {
        let mut keyboard = self.keyboard.borrow_mut();
        // A failing poll counts as "no key pending". An abort request is
        // latched inside the provider and observed by the execution loop.
        if keyboard.poll_input().unwrap_or(false)
            && let Ok(byte) = keyboard.read_input()
        {
            self.data[usize::from(MemoryMappedIOLocation::Kbsr as u16)] =
                Self::KEYBOARD_STATUS_READY;
            self.data[usize::from(MemoryMappedIOLocation::Kbdr as u16)] = u16::from(byte);
        } else {
            self.data[usize::from(MemoryMappedIOLocation::Kbsr as u16)] = 0;
        }
    }

    /// Loads an image byte stream into memory and returns its origin.
    ///
    /// The first big-endian word is the load origin, the remaining words are
    /// stored sequentially from there. Words that would land above the top
    /// of the address space are dropped, as is a trailing odd byte. Later
    /// images overwrite earlier ones at overlapping addresses.
    ///
    /// # Errors
    /// - Image is shorter than its one-word origin header
    pub fn load_image(&mut self, image: &[u8]) -> Result<u16, ImageLoadError> {
        if image.len() < 2 {
            return Err(ImageLoadError::MissingOrigin);
        }
        let origin = u16::from_be_bytes([image[0], image[1]]);
        let mut address = usize::from(origin);
        for word in image[2..].chunks_exact(2) {
            if address >= MEMORY_SIZE {
                break;
            }
            self.data[address] = u16::from_be_bytes([word[0], word[1]]);
            address += 1;
        }
        Ok(origin)
    }
}
