//! Section headers plus the relocation records found in relocation sections.
use super::{Reader, Stream};
use crate::{
    elf::{Bytes, ElfOffset, StringIndex, VirtualAddr},
    utils,
};
use crate::error::Result;

/// Describes a section.
#[derive(Clone, Debug)]
pub struct SectionHeader {
    // Elf32_Shdr or Elf64_Shdr, see https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
    /// Index into the section name string table. Zero means no name.
    pub name: StringIndex,

    /// Type of the section.
    pub stype: SectionType,

    /// Write, alloc, and/or exec.
    pub flags: u64,

    /// Addressing for the bytes in the section using offsets from the start of the ELF file.
    pub obytes: Bytes<ElfOffset>,

    /// Addressing for the bytes in the section using link-time virtual addresses.
    pub vbytes: Bytes<VirtualAddr>,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    /// Section alignment.
    pub align: u64,

    /// Set if the section holds a table of entries.
    pub entry_size: u64,
}

/// The section types lookups care about. Everything else is kept as the raw value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    Null,

    /// Code or initialized data, e.g. .plt and .got.
    ProgBits,

    /// Static symbols, typically stripped from release builds.
    SymbolTable,

    StringTable,

    /// Relocation entries with addends (Elf*_Rela).
    RelocationsWith,

    /// Uninitialized data, takes no space in the file.
    NoBits,

    /// Relocation entries without addends (Elf*_Rel).
    RelocationsWithout,

    /// Symbols needed by the dynamic linker.
    DynamicSymbolTable,

    Other(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SectionType::Null,
            1 => SectionType::ProgBits,
            2 => SectionType::SymbolTable,
            3 => SectionType::StringTable,
            4 => SectionType::RelocationsWith,
            8 => SectionType::NoBits,
            9 => SectionType::RelocationsWithout,
            11 => SectionType::DynamicSymbolTable,
            _ => SectionType::Other(value),
        }
    }
}

impl SectionHeader {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self> {
        let mut s = Stream::new(reader, offset);
        if reader.sixty_four_bit {
            let name = s.read_word()?;
            let stype = SectionType::from_u32(s.read_word()?);
            let flags = s.read_xword()?;
            let vaddr = s.read_addr()?;
            let offset = s.read_offset()?;
            let size = s.read_xword()?;
            let link = s.read_word()?;
            let info = s.read_word()?;
            let align = s.read_xword()?;
            let entry_size = s.read_xword()?;
            Ok(SectionHeader::build(
                name, stype, flags, vaddr, offset, size, link, info, align, entry_size,
            ))
        } else {
            let name = s.read_word()?;
            let stype = SectionType::from_u32(s.read_word()?);
            let flags = s.read_word()? as u64;
            let vaddr = s.read_addr()?;
            let offset = s.read_offset()?;
            let size = s.read_word()? as u64;
            let link = s.read_word()?;
            let info = s.read_word()?;
            let align = s.read_word()? as u64;
            let entry_size = s.read_word()? as u64;
            Ok(SectionHeader::build(
                name, stype, flags, vaddr, offset, size, link, info, align, entry_size,
            ))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        name: u32,
        stype: SectionType,
        flags: u64,
        vaddr: u64,
        offset: u64,
        size: u64,
        link: u32,
        info: u32,
        align: u64,
        entry_size: u64,
    ) -> Self {
        // NoBits sections (e.g. .bss) occupy memory but no bytes in the file.
        let file_size = if stype == SectionType::NoBits { 0 } else { size };
        SectionHeader {
            name: StringIndex(name),
            stype,
            flags,
            obytes: Bytes::<ElfOffset>::from_raw(offset, file_size),
            vbytes: Bytes::<VirtualAddr>::from_raw(vaddr, size),
            link,
            info,
            align,
            entry_size,
        }
    }

    /// The raw bytes of the section.
    pub fn data<'a>(&self, reader: &'a Reader) -> Result<&'a [u8]> {
        reader.slice(self.obytes.start.0 as usize, self.obytes.size as usize)
    }
}

/// Relocation sections come in two layouts: Elf*_Rela has an explicit addend and
/// Elf*_Rel doesn't.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelocationForm {
    WithAddend,
    WithoutAddend,
}

impl RelocationForm {
    pub fn from_section(stype: SectionType) -> Option<Self> {
        match stype {
            SectionType::RelocationsWith => Some(RelocationForm::WithAddend),
            SectionType::RelocationsWithout => Some(RelocationForm::WithoutAddend),
            _ => None,
        }
    }

    /// Size of one entry. The section's own entry_size is ignored, it's occasionally
    /// zero in hand-built binaries.
    pub fn entry_size(self, sixty_four_bit: bool) -> usize {
        match (sixty_four_bit, self) {
            (true, RelocationForm::WithAddend) => 24,
            (true, RelocationForm::WithoutAddend) => 16,
            (false, RelocationForm::WithAddend) => 12,
            (false, RelocationForm::WithoutAddend) => 8,
        }
    }
}

// see https://intezer.com/blog/executable-and-linkable-format-101-part-3-relocations/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Relocation {
    /// Where the patch is applied. For .rela.plt/.rel.plt this is the GOT slot.
    pub offset: u64,

    /// Index into the symbol table named by the relocation section's link, normally
    /// .dynsym.
    pub symbol_index: u32,

    /// Architecture specific relocation type, e.g. 7 is R_X86_64_JUMP_SLOT.
    pub rtype: u32,
}

impl Relocation {
    /// Decodes the offset and info fields of one entry. These are always read as
    /// little endian.
    pub fn decode(entry: &[u8], sixty_four_bit: bool) -> Result<Self> {
        if sixty_four_bit {
            utils::require(entry.len() >= 16, "truncated 64-bit relocation")?;
            let offset = u64::from_le_bytes(fixed(&entry[0..8]));
            let info = u64::from_le_bytes(fixed(&entry[8..16]));
            Ok(Relocation {
                offset,
                symbol_index: (info >> 32) as u32,
                rtype: (info & 0xffffffff) as u32,
            })
        } else {
            utils::require(entry.len() >= 8, "truncated 32-bit relocation")?;
            let offset = u32::from_le_bytes(fixed(&entry[0..4])) as u64;
            let info = u32::from_le_bytes(fixed(&entry[4..8]));
            Ok(Relocation {
                offset,
                symbol_index: info >> 8,
                rtype: info & 0xff,
            })
        }
    }

    /// Splits a relocation section's bytes into entries. A trailing partial entry is
    /// ignored.
    pub fn decode_all(data: &[u8], sixty_four_bit: bool, form: RelocationForm) -> Vec<Self> {
        data.chunks_exact(form.entry_size(sixty_four_bit))
            .filter_map(|entry| match Relocation::decode(entry, sixty_four_bit) {
                Ok(r) => Some(r),
                Err(err) => {
                    utils::warn(&format!("couldn't read relocation: {err}"));
                    None
                }
            })
            .collect()
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut result = [0; N];
    result.copy_from_slice(bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_sizes() {
        assert_eq!(RelocationForm::WithAddend.entry_size(true), 24);
        assert_eq!(RelocationForm::WithoutAddend.entry_size(true), 16);
        assert_eq!(RelocationForm::WithAddend.entry_size(false), 12);
        assert_eq!(RelocationForm::WithoutAddend.entry_size(false), 8);
    }

    #[test]
    fn decode_64() {
        let mut entry = Vec::new();
        entry.extend_from_slice(&0x404018u64.to_le_bytes());
        entry.extend_from_slice(&((5u64 << 32) | 7).to_le_bytes());
        entry.extend_from_slice(&0i64.to_le_bytes());
        let r = Relocation::decode(&entry, true).unwrap();
        assert_eq!(
            r,
            Relocation {
                offset: 0x404018,
                symbol_index: 5,
                rtype: 7
            }
        );
    }

    #[test]
    fn decode_32() {
        let mut entry = Vec::new();
        entry.extend_from_slice(&0x804a00cu32.to_le_bytes());
        entry.extend_from_slice(&((3u32 << 8) | 7).to_le_bytes());
        let r = Relocation::decode(&entry, false).unwrap();
        assert_eq!(r.offset, 0x804a00c);
        assert_eq!(r.symbol_index, 3);
        assert_eq!(r.rtype, 7);
    }

    #[test]
    fn decode_all_drops_trailing_bytes() {
        let mut data = Vec::new();
        for i in 0..3u32 {
            data.extend_from_slice(&(0x1000 + 4 * i).to_le_bytes());
            data.extend_from_slice(&((i + 1) << 8 | 7).to_le_bytes());
        }
        data.extend_from_slice(&[0xaa, 0xbb]);
        let rels = Relocation::decode_all(&data, false, RelocationForm::WithoutAddend);
        let indexes: Vec<u32> = rels.iter().map(|r| r.symbol_index).collect();
        assert_eq!(indexes, [1, 2, 3]);
        assert_eq!(rels[2].offset, 0x1008);
    }

    #[test]
    fn truncated() {
        assert!(Relocation::decode(&[0; 12], true).is_err());
    }
}
