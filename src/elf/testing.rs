//! Builds small ELF files for tests. Only the parts the resolver reads are filled in:
//! the ELF header, section contents, and the section header table.
use std::io::Write;
use tempfile::NamedTempFile;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_RELA: u32 = 4;
const SHT_REL: u32 = 9;
const SHT_DYNSYM: u32 = 11;
const R_JUMP_SLOT: u64 = 7;

struct TestSection {
    name: String,
    stype: u32,
    addr: u64,
    data: Vec<u8>,
    link: u32,
    entry_size: u64,
}

pub struct ElfBuilder {
    sixty_four_bit: bool,
    machine: u16,
    sections: Vec<TestSection>,
}

impl ElfBuilder {
    /// An x86-64 or i386 shared object with no sections.
    pub fn new(sixty_four_bit: bool) -> Self {
        ElfBuilder {
            sixty_four_bit,
            machine: if sixty_four_bit { 0x3e } else { 0x03 },
            sections: Vec::new(),
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    /// Section header index the next section will get.
    fn next_index(&self) -> u32 {
        self.sections.len() as u32 + 1
    }

    pub fn section(mut self, name: &str, addr: u64, data: &[u8]) -> Self {
        self.sections.push(TestSection {
            name: name.to_string(),
            stype: SHT_PROGBITS,
            addr,
            data: data.to_vec(),
            link: 0,
            entry_size: 0,
        });
        self
    }

    /// Adds .symtab/.strtab or .dynsym/.dynstr. The null symbol is added first so
    /// symbols[i] ends up at index i + 1.
    pub fn symbols(mut self, dynamic: bool, symbols: &[(&str, u64)]) -> Self {
        let mut strings = vec![0u8];
        let mut table = self.symbol(0, 0, 0);
        for (name, value) in symbols {
            let name_index = strings.len() as u32;
            strings.extend_from_slice(name.as_bytes());
            strings.push(0);
            table.extend(self.symbol(name_index, *value, 0x12)); // global function
        }

        let (name, strings_name, stype) = if dynamic {
            (".dynsym", ".dynstr", SHT_DYNSYM)
        } else {
            (".symtab", ".strtab", SHT_SYMTAB)
        };
        let link = self.next_index() + 1;
        self.sections.push(TestSection {
            name: name.to_string(),
            stype,
            addr: 0,
            data: table,
            link,
            entry_size: if self.sixty_four_bit { 24 } else { 16 },
        });
        self.sections.push(TestSection {
            name: strings_name.to_string(),
            stype: SHT_STRTAB,
            addr: 0,
            data: strings,
            link: 0,
            entry_size: 0,
        });
        self
    }

    /// Adds a JUMP_SLOT relocation section. Entries are (GOT offset, dynsym index).
    pub fn relocations(mut self, name: &str, with_addend: bool, entries: &[(u64, u32)]) -> Self {
        let mut data = Vec::new();
        for &(offset, index) in entries {
            if self.sixty_four_bit {
                data.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(&(((index as u64) << 32) | R_JUMP_SLOT).to_le_bytes());
                if with_addend {
                    data.extend_from_slice(&0i64.to_le_bytes());
                }
            } else {
                data.extend_from_slice(&(offset as u32).to_le_bytes());
                data.extend_from_slice(&((index << 8) | R_JUMP_SLOT as u32).to_le_bytes());
                if with_addend {
                    data.extend_from_slice(&0i32.to_le_bytes());
                }
            }
        }
        let entry_size = match (self.sixty_four_bit, with_addend) {
            (true, true) => 24,
            (true, false) => 16,
            (false, true) => 12,
            (false, false) => 8,
        };
        self.sections.push(TestSection {
            name: name.to_string(),
            stype: if with_addend { SHT_RELA } else { SHT_REL },
            addr: 0,
            data,
            link: 0,
            entry_size,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_size = if self.sixty_four_bit { 64 } else { 52 };
        let section_header_size = if self.sixty_four_bit { 64 } else { 40 };

        let mut names = vec![0u8];
        let mut name_indexes = Vec::new();
        for section in self.sections.iter() {
            name_indexes.push(names.len() as u32);
            names.extend_from_slice(section.name.as_bytes());
            names.push(0);
        }
        let shstrtab_name = names.len() as u32;
        names.extend_from_slice(b".shstrtab\0");

        // Contents go right after the ELF header, each 8-byte aligned.
        let mut bytes = vec![0u8; header_size];
        let mut offsets = Vec::new();
        for data in self.sections.iter().map(|s| &s.data).chain([&names]) {
            align(&mut bytes);
            offsets.push(bytes.len() as u64);
            bytes.extend_from_slice(data);
        }
        align(&mut bytes);
        let section_offset = bytes.len() as u64;
        let num_sections = self.sections.len() as u16 + 2;
        let shstrtab_index = num_sections - 1;

        bytes.extend(vec![0u8; section_header_size]); // null section
        for (i, section) in self.sections.iter().enumerate() {
            let header = self.section_header(
                name_indexes[i],
                section.stype,
                section.addr,
                offsets[i],
                section.data.len() as u64,
                section.link,
                section.entry_size,
            );
            bytes.extend(header);
        }
        let header = self.section_header(
            shstrtab_name,
            SHT_STRTAB,
            0,
            offsets[self.sections.len()],
            names.len() as u64,
            0,
            0,
        );
        bytes.extend(header);

        let elf_header = self.elf_header(section_offset, num_sections, shstrtab_index);
        bytes[..header_size].copy_from_slice(&elf_header);
        bytes
    }

    pub fn write(&self) -> NamedTempFile {
        temp_file(&self.build())
    }

    fn elf_header(&self, section_offset: u64, num_sections: u16, shstrtab: u16) -> Vec<u8> {
        let mut h = vec![0x7f, b'E', b'L', b'F'];
        h.push(if self.sixty_four_bit { 2 } else { 1 });
        h.push(1); // little endian
        h.push(1); // version
        h.resize(16, 0);
        h.extend_from_slice(&3u16.to_le_bytes()); // shared object
        h.extend_from_slice(&self.machine.to_le_bytes());
        h.extend_from_slice(&1u32.to_le_bytes());
        if self.sixty_four_bit {
            h.extend_from_slice(&0u64.to_le_bytes()); // entry
            h.extend_from_slice(&0u64.to_le_bytes()); // program headers
            h.extend_from_slice(&section_offset.to_le_bytes());
            h.extend_from_slice(&0u32.to_le_bytes()); // flags
            h.extend_from_slice(&64u16.to_le_bytes());
            h.extend_from_slice(&56u16.to_le_bytes());
            h.extend_from_slice(&0u16.to_le_bytes());
            h.extend_from_slice(&64u16.to_le_bytes());
        } else {
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&(section_offset as u32).to_le_bytes());
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&52u16.to_le_bytes());
            h.extend_from_slice(&32u16.to_le_bytes());
            h.extend_from_slice(&0u16.to_le_bytes());
            h.extend_from_slice(&40u16.to_le_bytes());
        }
        h.extend_from_slice(&num_sections.to_le_bytes());
        h.extend_from_slice(&shstrtab.to_le_bytes());
        h
    }

    fn symbol(&self, name: u32, value: u64, info: u8) -> Vec<u8> {
        let mut s = Vec::new();
        let section_index: u16 = if value == 0 { 0 } else { 1 };
        s.extend_from_slice(&name.to_le_bytes());
        if self.sixty_four_bit {
            s.push(info);
            s.push(0);
            s.extend_from_slice(&section_index.to_le_bytes());
            s.extend_from_slice(&value.to_le_bytes());
            s.extend_from_slice(&0u64.to_le_bytes());
        } else {
            s.extend_from_slice(&(value as u32).to_le_bytes());
            s.extend_from_slice(&0u32.to_le_bytes());
            s.push(info);
            s.push(0);
            s.extend_from_slice(&section_index.to_le_bytes());
        }
        s
    }

    #[allow(clippy::too_many_arguments)]
    fn section_header(
        &self,
        name: u32,
        stype: u32,
        addr: u64,
        offset: u64,
        size: u64,
        link: u32,
        entry_size: u64,
    ) -> Vec<u8> {
        let mut h = Vec::new();
        h.extend_from_slice(&name.to_le_bytes());
        h.extend_from_slice(&stype.to_le_bytes());
        if self.sixty_four_bit {
            h.extend_from_slice(&0u64.to_le_bytes()); // flags
            h.extend_from_slice(&addr.to_le_bytes());
            h.extend_from_slice(&offset.to_le_bytes());
            h.extend_from_slice(&size.to_le_bytes());
            h.extend_from_slice(&link.to_le_bytes());
            h.extend_from_slice(&0u32.to_le_bytes()); // info
            h.extend_from_slice(&8u64.to_le_bytes()); // align
            h.extend_from_slice(&entry_size.to_le_bytes());
        } else {
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&(addr as u32).to_le_bytes());
            h.extend_from_slice(&(offset as u32).to_le_bytes());
            h.extend_from_slice(&(size as u32).to_le_bytes());
            h.extend_from_slice(&link.to_le_bytes());
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&4u32.to_le_bytes());
            h.extend_from_slice(&(entry_size as u32).to_le_bytes());
        }
        h
    }
}

fn align(bytes: &mut Vec<u8>) {
    while bytes.len() % 8 != 0 {
        bytes.push(0);
    }
}

/// Writes contents to a temporary file that is removed when dropped.
pub fn temp_file(contents: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("pwner-")
        .suffix(".elf")
        .tempfile()
        .unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}
