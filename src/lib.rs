//! Small toolkit for writing exploits: resolve where things live in an ELF image,
//! build payloads, and talk to the target over a local process or a TCP socket
//! through the same [`Tube`] interface.
//!
//! ```no_run
//! use pwner::{ElfImage, Options, Process, Tube, pay};
//!
//! # fn main() -> pwner::Result<()> {
//! let mut elf = ElfImage::new("./vuln")?;
//! elf.rebase(0x555555554000);
//! let mut target = Process::new(&["./vuln"], Options::default())?;
//! target.recv_until(b"> ")?;
//! target.send_line(&pay![b"A".repeat(40), elf.plt("puts")?, elf.got("puts")?])?;
//! target.close()?;
//! # Ok(())
//! # }
//! ```
pub mod elf;
pub mod error;
pub mod payload;
pub mod tube;
pub mod utils;

pub use elf::ElfImage;
pub use error::{Error, Lookup, Result};
pub use payload::{Item, pay};
pub use tube::{LogLevel, Options, Process, Remote, Tube};
