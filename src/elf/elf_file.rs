//! A parsed ELF container: the header, the section table, and lookups over them.
use super::{ElfHeader, Reader, Stream};
use crate::elf::{
    Relocation, RelocationForm, SectionHeader, SectionType, StringIndex, SymbolTable,
    SymbolTableEntry, VirtualAddr,
};
use crate::error::{Error, Lookup, Result};
use crate::utils;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

const PLT_ENTRY_SIZE: u64 = 16; // x86 and x86-64 lazy binding stubs

pub struct ElfFile {
    pub header: ElfHeader,
    pub path: PathBuf,
    pub reader: Reader,
    pub sections: Vec<SectionHeader>,
}

impl ElfFile {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }?;
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        let sections = ElfFile::load_sections(&reader, &header)?;
        Ok(ElfFile {
            path: path.to_path_buf(),
            reader,
            header,
            sections,
        })
    }

    pub fn is_64(&self) -> bool {
        self.reader.sixty_four_bit
    }

    /// Returns a string from the section name string table.
    pub fn find_default_string(&self, str_index: StringIndex) -> Option<String> {
        self.find_string(self.header.string_table_index as u32, str_index)
    }

    /// Returns a string from an arbitrary string table. Note that index can point into
    /// the middle of a string.
    pub fn find_string(&self, section_index: u32, str_index: StringIndex) -> Option<String> {
        let h = self.find_section(section_index)?;
        if str_index.0 as u64 >= h.obytes.size {
            utils::warn(&format!(
                "string index {} is past the end of section {section_index}",
                str_index.0
            ));
            return None;
        }
        match Stream::new(&self.reader, (h.obytes.start.0 + str_index.0 as u64) as usize)
            .read_string()
        {
            Ok(s) => Some(s),
            Err(err) => {
                utils::warn(&format!("failed to read string {}: {err}", str_index.0));
                None
            }
        }
    }

    pub fn find_section_name(&self, section: &SectionHeader) -> Option<String> {
        self.find_default_string(section.name)
    }

    pub fn find_section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections
            .iter()
            .find(|s| s.name.0 != 0 && self.find_section_name(s).as_deref() == Some(name))
    }

    pub fn find_symbols(&self) -> Option<SymbolTable> {
        self.do_find_symbols(SectionType::SymbolTable)
    }

    pub fn find_dynamic_symbols(&self) -> Option<SymbolTable> {
        self.do_find_symbols(SectionType::DynamicSymbolTable)
    }

    pub fn symbol_name(&self, table: &SymbolTable, entry: &SymbolTableEntry) -> Option<String> {
        if entry.name.0 == 0 {
            return Some(String::new());
        }
        self.find_string(table.section.link, entry.name)
    }

    /// (name, value) for every entry in a symbol table, in table order. Unnamed and
    /// zero valued entries are included: it's up to callers to decide what matters.
    pub fn named_symbols(&self, table: Option<&SymbolTable>) -> Vec<(String, u64)> {
        match table {
            Some(table) => table
                .entries
                .iter()
                .map(|e| (self.symbol_name(table, e).unwrap_or_default(), e.value))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The GOT data section: .got.plt if present, otherwise .got.
    pub fn find_got(&self) -> Result<&SectionHeader> {
        self.find_section_by_name(".got.plt")
            .or_else(|| self.find_section_by_name(".got"))
            .ok_or_else(|| Error::not_found(Lookup::Section, ".got.plt/.got"))
    }

    /// The PLT relocation section, .rela.plt if present, otherwise .rel.plt, along with
    /// the record layout it uses.
    pub fn find_plt_relocations(&self) -> Result<(&SectionHeader, RelocationForm)> {
        let section = self
            .find_section_by_name(".rela.plt")
            .or_else(|| self.find_section_by_name(".rel.plt"))
            .ok_or_else(|| Error::not_found(Lookup::Section, ".rela.plt/.rel.plt"))?;
        let form =
            RelocationForm::from_section(section.stype).unwrap_or(RelocationForm::WithoutAddend);
        Ok((section, form))
    }

    pub fn plt_relocations(&self) -> Result<Vec<Relocation>> {
        let (section, form) = self.find_plt_relocations()?;
        let data = section.data(&self.reader)?;
        Ok(Relocation::decode_all(data, self.is_64(), form))
    }

    /// Names the x86 lazy binding stubs, e.g. ("puts@plt", 0x401030). These aren't in
    /// any symbol table but objdump and friends synthesize them the same way.
    pub fn find_plt_stubs(&self) -> Vec<(String, u64)> {
        if !self.header.is_x86() {
            return Vec::new();
        }

        // With IBT (-fcf-protection) the stubs that are actually called move to
        // .plt.sec and .plt keeps only the lazy binding trampolines.
        let (first, plt) = match self.find_section_by_name(".plt.sec") {
            Some(section) => (0, section),
            None => match self.find_section_by_name(".plt") {
                Some(section) => (PLT_ENTRY_SIZE, section),
                None => return Vec::new(),
            },
        };
        let Ok(relocations) = self.plt_relocations() else {
            return Vec::new();
        };
        let dynamic = self.find_dynamic_symbols();
        let names = self.named_symbols(dynamic.as_ref());

        let mut stubs = Vec::new();
        for (i, r) in relocations.iter().enumerate() {
            let addr = plt.vbytes.start.0 + first + PLT_ENTRY_SIZE * i as u64;
            if !plt.vbytes.contains(VirtualAddr(addr)) {
                utils::warn(&format!("PLT stub {i} is outside of the PLT section"));
                break;
            }
            if let Some((name, _)) = names.get(r.symbol_index as usize)
                && !name.is_empty()
            {
                stubs.push((format!("{name}@plt"), addr));
            }
        }
        stubs
    }

    /// Bytes within the file for a link-time virtual address.
    pub fn read_vaddr(&self, vaddr: VirtualAddr, size: usize) -> Result<&[u8]> {
        let section = self
            .sections
            .iter()
            .find(|s| s.vbytes.start.0 != 0 && s.obytes.size > 0 && s.vbytes.contains(vaddr))
            .ok_or_else(|| {
                Error::Malformed(format!("{:#x} isn't within a section", vaddr.0))
            })?;
        let delta = vaddr - section.vbytes.start;
        let size = size.min((section.obytes.size - delta) as usize);
        self.reader
            .slice((section.obytes.start.0 + delta) as usize, size)
    }
}

impl ElfFile {
    fn find_section(&self, section_index: u32) -> Option<&SectionHeader> {
        let section_index = section_index as usize;
        let section = self.sections.get(section_index);
        if section.is_none() {
            utils::warn(&format!("bad section index: {section_index}"));
        }
        section
    }

    fn do_find_symbols(&self, stype: SectionType) -> Option<SymbolTable> {
        let section = self.sections.iter().find(|s| s.stype == stype)?;
        let entry_size = match section.entry_size {
            0 if self.is_64() => 24,
            0 => 16,
            n => n,
        };

        let mut offset = section.obytes.start.0;
        let mut entries = Vec::new();
        while offset + entry_size <= section.obytes.end().0 {
            match SymbolTableEntry::new(&self.reader, offset as usize) {
                Ok(s) => entries.push(s),
                Err(err) => {
                    // Reads only fail past the end of the file so the rest would fail too.
                    utils::warn(&format!("failed to read symbol at offset {offset}: {err}"));
                    break;
                }
            }
            offset += entry_size;
        }
        Some(SymbolTable {
            section: section.clone(),
            dynamic: stype == SectionType::DynamicSymbolTable,
            entries,
        })
    }

    /// Unlike symbols a bad section header is fatal: every other lookup goes through
    /// section indexes.
    fn load_sections(reader: &Reader, header: &ElfHeader) -> Result<Vec<SectionHeader>> {
        let mut sections = Vec::new();
        let mut offset = header.section_offset as usize;

        for _ in 0..header.num_section_entries {
            let h = SectionHeader::new(reader, offset).map_err(|err| {
                Error::Malformed(format!("failed to read section header at {offset}: {err}"))
            })?;
            sections.push(h);
            offset += header.section_entry_size as usize;
        }
        Ok(sections)
    }
}
