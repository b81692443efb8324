//! ELF support for finding addresses. This reads just enough of the format to answer
//! "where is X": symbol tables, PLT stubs, and GOT slots.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The class (32 or 64-bit) and byte order.
//! * The offset to and number of section headers.
//!
//! Section headers identify sections. Sections used here:
//! * .symtab/.strtab - static symbols, usually missing from stripped binaries.
//! * .dynsym/.dynstr - symbols used by the dynamic linker, always present for dynamic exes.
//! * .rela.plt/.rel.plt - one JUMP_SLOT relocation per imported function. The relocation
//!   offset is the GOT slot and the relocation index into .dynsym names the function.
//! * .got.plt/.got - the slots themselves.
//! * .plt/.plt.sec - the stubs calls go through.
pub mod elf_file;
pub mod header;
pub mod image;
pub mod io;
pub mod primitives;
pub mod sections;
pub mod symbols;
#[cfg(test)]
pub mod testing;

pub use elf_file::*;
pub use header::*;
pub use image::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
pub use symbols::*;
