//! Handlers for the commands users type, e.g. `got puts`.
pub mod elf;
pub mod session;
pub mod tables;

pub use elf::*;
pub use session::*;
