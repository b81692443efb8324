use super::{Reader, Stream};
use crate::error::Result;
use crate::utils;

pub const MACHINE_X86: u16 = 0x03;
pub const MACHINE_X86_64: u16 = 0x3e;

/// The fields of Elf32_Ehdr/Elf64_Ehdr after e_ident that we care about.
pub struct ElfHeader {
    /// 1 = relocatable, 2 = exe, 3 = shared object, 4 = core
    pub etype: u16,

    pub machine: u16,

    pub entry: u64,

    pub ph_offset: u64,

    pub section_offset: u64,

    pub flags: u32,

    pub num_ph_entries: u16,

    pub section_entry_size: u16,

    pub num_section_entries: u16,

    /// Section index of the section name string table.
    pub string_table_index: u16,
}

impl ElfHeader {
    pub fn new(reader: &Reader) -> Result<Self> {
        let mut s = Stream::new(reader, 0x10);
        let etype = s.read_half()?;
        let machine = s.read_half()?;
        let _version = s.read_word()?;
        let entry = s.read_addr()?;
        let ph_offset = s.read_offset()?;
        let section_offset = s.read_offset()?;
        let flags = s.read_word()?;
        let _header_size = s.read_half()?;
        let _ph_entry_size = s.read_half()?;
        let num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;

        if num_section_entries > 0 {
            let min_size = if reader.sixty_four_bit { 64 } else { 40 };
            utils::require(
                section_entry_size >= min_size,
                &format!("section header entries are too small: {section_entry_size}"),
            )?;
        }

        Ok(ElfHeader {
            etype,
            machine,
            entry,
            ph_offset,
            section_offset,
            flags,
            num_ph_entries,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    pub fn stype(&self) -> &'static str {
        match self.etype {
            1 => "relocatable",
            2 => "executable",
            3 => "shared object",
            4 => "core",
            _ => "unknown",
        }
    }

    pub fn machine(&self) -> String {
        match self.machine {
            MACHINE_X86 => "x86".to_string(),
            MACHINE_X86_64 => "x86-64".to_string(),
            0x28 => "ARM".to_string(),
            0xb7 => "AArch64".to_string(),
            0xf3 => "RISC-V".to_string(),
            0x08 => "MIPS".to_string(),
            _ => format!("machine {:#x}", self.machine),
        }
    }

    pub fn is_x86(&self) -> bool {
        self.machine == MACHINE_X86 || self.machine == MACHINE_X86_64
    }
}
