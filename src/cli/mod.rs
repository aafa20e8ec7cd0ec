//! Terminal I/O for console hosts

mod console;

pub use console::Console;
