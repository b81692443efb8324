use crate::error::Result;
use crate::utils;
use memmap2::Mmap;

const MIN_HEADER_SIZE: usize = 52; // Elf32_Ehdr, Elf64_Ehdr is 64

pub struct Reader {
    pub little_endian: bool,
    pub sixty_four_bit: bool,
    bytes: Mmap,
}

impl Reader {
    /// Checks the ident bytes. Everything past that is validated lazily: all the read
    /// functions return a Result because offsets within the file come from the file
    /// itself and can't be trusted.
    pub fn new(bytes: Mmap) -> Result<Self> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        utils::require(bytes.len() >= MIN_HEADER_SIZE, "file is much too small")?;
        utils::require(bytes[0..4] == [0x7f, b'E', b'L', b'F'], "not an ELF file (bad magic)")?;

        let ei_class = bytes[0x04];
        let ei_data = bytes[0x05];
        let ei_version = bytes[0x06];
        utils::require(
            ei_class == 1 || ei_class == 2,
            &format!("bad elf class: {ei_class}"),
        )?;
        utils::require(
            ei_data == 1 || ei_data == 2,
            &format!("bad elf data encoding: {ei_data}"),
        )?;
        utils::require(ei_version == 1, &format!("bad elf version: {ei_version}"))?;

        let reader = Reader {
            bytes,
            sixty_four_bit: ei_class == 2,
            little_endian: ei_data == 1,
        };
        let e_type = reader.read_half(0x10)?;
        utils::require(
            (1..=4).contains(&e_type),
            &format!("bad elf type {e_type}: not an object, exe, shared lib, or core"),
        )?;
        Ok(reader)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8]> {
        let end = offset.checked_add(size);
        let slice = end.and_then(|end| self.bytes.get(offset..end));
        match slice {
            Some(s) => Ok(s),
            None => Err(crate::error::Error::Malformed(format!(
                "{size} bytes at offset {offset:#x} run past the end of the file"
            ))),
        }
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_half(&self, offset: usize) -> Result<u16> {
        let bytes = self.array::<2>(offset)?;
        if self.little_endian {
            Ok(u16::from_le_bytes(bytes))
        } else {
            Ok(u16::from_be_bytes(bytes))
        }
    }

    pub fn read_word(&self, offset: usize) -> Result<u32> {
        let bytes = self.array::<4>(offset)?;
        if self.little_endian {
            Ok(u32::from_le_bytes(bytes))
        } else {
            Ok(u32::from_be_bytes(bytes))
        }
    }

    pub fn read_xword(&self, offset: usize) -> Result<u64> {
        let bytes = self.array::<8>(offset)?;
        if self.little_endian {
            Ok(u64::from_le_bytes(bytes))
        } else {
            Ok(u64::from_be_bytes(bytes))
        }
    }

    /// Read either a u32 or u64 word depending on whether the file is 64-bit.
    /// But, for sanity, always return the result as 64 bits.
    pub fn read_addr(&self, offset: usize) -> Result<u64> {
        if self.sixty_four_bit {
            self.read_xword(offset)
        } else {
            Ok(self.read_word(offset)? as u64)
        }
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut result = [0; N];
        result.copy_from_slice(self.slice(offset, N)?);
        Ok(result)
    }
}

pub struct Stream<'a> {
    pub reader: &'a Reader,
    pub offset: usize,
}

impl<'a> Stream<'a> {
    pub fn new(reader: &'a Reader, offset: usize) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }

    pub fn read_addr(&mut self) -> Result<u64> {
        if self.reader.sixty_four_bit {
            self.read_xword()
        } else {
            Ok(self.read_word()? as u64)
        }
    }

    pub fn read_offset(&mut self) -> Result<u64> {
        self.read_addr()
    }

    /// Read a null-terminated string. Symbol names are nominally ASCII but C++ and
    /// Rust mangling can produce anything so invalid UTF-8 is replaced.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.offset;
        loop {
            let byte = self.read_byte()?;
            if byte == 0 {
                break;
            }
        }
        let bytes = self.reader.slice(start, self.offset - start - 1)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
