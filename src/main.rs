use lc3_vm::emulator::Emulator;
use lc3_vm::errors::ExecutionError;
use lc3_vm::hardware::keyboard::TerminalInputProvider;
use lc3_vm::terminal;
use std::cell::RefCell;
use std::env;
use std::io;
use std::process::ExitCode;
use std::rc::Rc;

const EXIT_CODE_FAILED_RUN: u8 = 1;
const EXIT_CODE_USAGE: u8 = 2;
// raw mode swallows SIGINT, so the shell convention of 128 + SIGINT is
// reproduced by hand
const EXIT_CODE_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let image_paths: Vec<String> = env::args().skip(1).collect();
    if image_paths.is_empty() {
        eprintln!("Usage: lc3-vm [image-file] ...");
        return ExitCode::from(EXIT_CODE_USAGE);
    }

    let keyboard = Rc::new(RefCell::new(TerminalInputProvider::new()));
    let mut emulator = Emulator::new(keyboard);
    for path in &image_paths {
        if let Err(e) = emulator.load_image_file(path) {
            eprintln!("failed to load the image: {e}");
            return ExitCode::from(EXIT_CODE_FAILED_RUN);
        }
    }

    let mut stdout = io::stdout();
    let raw_lock = terminal::set_terminal_raw(&stdout);
    let result = emulator.execute(&mut stdout);
    drop(raw_lock);

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(ExecutionError::Interrupted) => {
            eprintln!();
            ExitCode::from(EXIT_CODE_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_CODE_FAILED_RUN)
        }
    }
}
