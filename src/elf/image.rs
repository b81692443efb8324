//! Symbol, PLT, and GOT address resolution for one ELF image.
use super::{ElfFile, Relocation, VirtualAddr};
use crate::error::{Error, Lookup, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::thread;

/// Addresses of the named things in an executable or shared library. Addresses start
/// out as link-time values and follow the load base set with [`ElfImage::rebase`].
pub struct ElfImage {
    path: PathBuf,
    base: u64,
    sixty_four_bit: bool,
    raw: HashMap<String, u64>,
    resolved: HashMap<String, u64>,
}

impl ElfImage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let what = || format!("ELF image from {}", path.display());
        let file = ElfFile::new(path).map_err(|err| Error::construction(what(), err))?;

        // The two tables live in different sections so they can be scanned at the same
        // time. Nothing is merged until both are done.
        let (symbols, dynamic) = thread::scope(|scope| {
            let symbols = scope.spawn(|| file.named_symbols(file.find_symbols().as_ref()));
            let dynamic =
                scope.spawn(|| file.named_symbols(file.find_dynamic_symbols().as_ref()));
            (symbols.join(), dynamic.join())
        });
        let scan_failed = |_| Error::construction(what(), "symbol table scan panicked");
        let symbols = symbols.map_err(scan_failed)?;
        let dynamic = dynamic.map_err(scan_failed)?;

        let mut image = ElfImage {
            path: path.to_path_buf(),
            base: 0,
            sixty_four_bit: file.is_64(),
            raw: HashMap::new(),
            resolved: HashMap::new(),
        };
        for (name, value) in symbols {
            if is_addressable(&name, value) {
                image.raw.insert(name.clone(), value);
                image.resolved.insert(name, value);
            }
        }
        for (name, value) in dynamic.into_iter().chain(file.find_plt_stubs()) {
            image.insert_missing(name, value);
        }
        Ok(image)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn is_64(&self) -> bool {
        self.sixty_four_bit
    }

    /// Sets the address the image was loaded at, e.g. a PIE base or a leaked libc base.
    /// This replaces any earlier base.
    pub fn rebase(&mut self, base: u64) {
        self.base = base;
        self.resolved = self
            .raw
            .iter()
            .map(|(name, raw)| (name.clone(), base.wrapping_add(*raw)))
            .collect();
    }

    pub fn sym(&self, name: &str) -> Result<u64> {
        self.resolved
            .get(name)
            .copied()
            .ok_or_else(|| Error::not_found(Lookup::Symbol, name))
    }

    /// Address of the PLT stub for a function, e.g. to call puts without knowing where
    /// libc is.
    pub fn plt(&self, name: &str) -> Result<u64> {
        self.resolved
            .get(&format!("{name}@plt"))
            .copied()
            .ok_or_else(|| Error::not_found(Lookup::Plt, name))
    }

    /// Address of the GOT slot the dynamic linker patches for a function. This is read
    /// straight from the PLT relocations rather than the symbol tables because those
    /// are the only thing that names the slots.
    pub fn got(&self, name: &str) -> Result<u64> {
        let file = ElfFile::new(&self.path)
            .map_err(|err| Error::construction(format!("ELF image from {}", self.path.display()), err))?;
        file.find_got()?;
        let (section, form) = file.find_plt_relocations()?;
        let dynamic = file
            .find_dynamic_symbols()
            .ok_or_else(|| Error::not_found(Lookup::Section, ".dynsym"))?;
        let names = file.named_symbols(Some(&dynamic));

        let data = section.data(&file.reader)?;
        Relocation::decode_all(data, file.is_64(), form)
            .iter()
            .find(|r| {
                names
                    .get(r.symbol_index as usize)
                    .is_some_and(|(n, _)| n == name)
            })
            .map(|r| self.base.wrapping_add(r.offset))
            .ok_or_else(|| Error::not_found(Lookup::Got, name))
    }

    /// All resolved symbols sorted by address, then name.
    pub fn symbols(&self) -> Vec<(&str, u64)> {
        let mut result: Vec<(&str, u64)> = self
            .resolved
            .iter()
            .map(|(name, addr)| (name.as_str(), *addr))
            .collect();
        result.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        result
    }

    /// Reads file bytes backing a (rebased) address, e.g. to look at a string.
    /// Returns fewer than size bytes if the section ends first.
    pub fn read_at(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        let file = ElfFile::new(&self.path)?;
        let vaddr = VirtualAddr(addr.wrapping_sub(self.base));
        Ok(file.read_vaddr(vaddr, size)?.to_vec())
    }

    fn insert_missing(&mut self, name: String, value: u64) {
        if !is_addressable(&name, value) {
            return;
        }
        if let Entry::Vacant(entry) = self.raw.entry(name) {
            self.resolved
                .insert(entry.key().clone(), self.base.wrapping_add(value));
            entry.insert(value);
        }
    }
}

/// Unnamed and zero valued symbols (undefined imports, section and file symbols)
/// aren't useful as addresses.
fn is_addressable(name: &str, value: u64) -> bool {
    !name.is_empty() && value != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::testing::{ElfBuilder, temp_file};
    use tempfile::NamedTempFile;

    const PIE_BASE: u64 = 0x555555554000;

    fn exe64() -> NamedTempFile {
        ElfBuilder::new(true)
            .symbols(false, &[("main", 0x1189), ("puts", 0x1030), ("helper", 0x11a0)])
            .symbols(
                true,
                &[
                    ("__libc_start_main", 0),
                    ("printf", 0),
                    ("setvbuf", 0),
                    ("read", 0),
                    ("puts", 0x2000),
                    ("stdout", 0x4040),
                ],
            )
            .section(".plt", 0x1020, &[0xcc; 0x70])
            .section(".got.plt", 0x404000, &[0; 0x40])
            .relocations(
                ".rela.plt",
                true,
                &[
                    (0x404000, 1),
                    (0x404008, 2),
                    (0x404010, 3),
                    (0x404028, 4),
                    (0x404030, 6),
                    (0x404018, 5),
                ],
            )
            .section(".rodata", 0x2000, b"hello\0world\0")
            .write()
    }

    fn exe32() -> NamedTempFile {
        ElfBuilder::new(false)
            .symbols(true, &[("puts", 0), ("gets", 0), ("system", 0)])
            .section(".plt", 0x8049030, &[0xcc; 0x40])
            .section(".got", 0x804c000, &[0; 0x20])
            .relocations(".rel.plt", false, &[(0x804c00c, 1), (0x804c010, 2), (0x804c014, 3)])
            .write()
    }

    #[test]
    fn rebased_main() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.sym("main").unwrap(), 0x1189);
        image.rebase(PIE_BASE);
        assert_eq!(image.sym("main").unwrap(), 0x555555555189);
        assert_eq!(image.base(), PIE_BASE);
    }

    #[test]
    fn rebase_applies_to_every_symbol() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        let raw: Vec<(String, u64)> = image
            .symbols()
            .iter()
            .map(|(n, a)| (n.to_string(), *a))
            .collect();
        assert!(!raw.is_empty());

        image.rebase(0x7f0000000000);
        for (name, offset) in raw.iter() {
            assert_eq!(image.sym(name).unwrap(), 0x7f0000000000 + offset, "{name}");
        }
    }

    #[test]
    fn rebase_replaces() {
        let file = exe64();
        let mut once = ElfImage::new(file.path()).unwrap();
        once.rebase(PIE_BASE);

        let mut twice = ElfImage::new(file.path()).unwrap();
        twice.rebase(0x1000);
        twice.rebase(PIE_BASE);
        twice.rebase(PIE_BASE);

        assert_eq!(once.symbols(), twice.symbols());
        twice.rebase(0);
        assert_eq!(twice.sym("main").unwrap(), 0x1189);
    }

    #[test]
    fn static_table_wins() {
        let file = exe64();
        let image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.sym("puts").unwrap(), 0x1030);
        assert_eq!(image.sym("stdout").unwrap(), 0x4040); // only in .dynsym
    }

    #[test]
    fn zero_values_are_dropped() {
        let file = exe64();
        let image = ElfImage::new(file.path()).unwrap();
        let err = image.sym("printf").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: Lookup::Symbol, .. }));
        assert!(image.symbols().iter().all(|(n, a)| !n.is_empty() && *a != 0));
    }

    #[test]
    fn unknown_names() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        image.rebase(PIE_BASE);
        let before: Vec<(String, u64)> = image
            .symbols()
            .iter()
            .map(|(n, a)| (n.to_string(), *a))
            .collect();

        assert!(image.sym("nope").unwrap_err().is_not_found());
        assert!(matches!(
            image.plt("nope").unwrap_err(),
            Error::NotFound { kind: Lookup::Plt, .. }
        ));
        assert!(matches!(
            image.got("nope").unwrap_err(),
            Error::NotFound { kind: Lookup::Got, .. }
        ));

        let after: Vec<(String, u64)> = image
            .symbols()
            .iter()
            .map(|(n, a)| (n.to_string(), *a))
            .collect();
        assert_eq!(before, after);
        assert_eq!(image.base(), PIE_BASE);
    }

    #[test]
    fn got_from_rela() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.got("puts").unwrap(), 0x404018);
        assert_eq!(image.got("printf").unwrap(), 0x404008);
        image.rebase(0x1000);
        assert_eq!(image.got("puts").unwrap(), 0x405018);
    }

    #[test]
    fn got_first_match_wins() {
        let file = ElfBuilder::new(true)
            .symbols(true, &[("puts", 0)])
            .section(".got.plt", 0x404000, &[0; 0x20])
            .relocations(".rela.plt", true, &[(0x404018, 1), (0x404020, 1)])
            .write();
        let image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.got("puts").unwrap(), 0x404018);
    }

    #[test]
    fn got_from_rel_32() {
        let file = exe32();
        let mut image = ElfImage::new(file.path()).unwrap();
        assert!(!image.is_64());
        assert_eq!(image.got("gets").unwrap(), 0x804c010);
        image.rebase(0xf7f00000);
        assert_eq!(image.got("system").unwrap(), 0xf7f00000 + 0x804c014);
    }

    #[test]
    fn got_64_without_addends() {
        let file = ElfBuilder::new(true)
            .symbols(true, &[("read", 0), ("write", 0)])
            .section(".got", 0x3fe0, &[0; 0x20])
            .relocations(".rel.plt", false, &[(0x3fe8, 2), (0x3ff0, 1)])
            .write();
        let image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.got("read").unwrap(), 0x3ff0);
        assert_eq!(image.got("write").unwrap(), 0x3fe8);
    }

    #[test]
    fn got_needs_sections() {
        let no_got = ElfBuilder::new(true)
            .symbols(true, &[("puts", 0)])
            .relocations(".rela.plt", true, &[(0x404018, 1)])
            .write();
        let image = ElfImage::new(no_got.path()).unwrap();
        let err = image.got("puts").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: Lookup::Section, .. }));

        let no_relocations = ElfBuilder::new(true)
            .symbols(true, &[("puts", 0)])
            .section(".got.plt", 0x404000, &[0; 0x20])
            .write();
        let image = ElfImage::new(no_relocations.path()).unwrap();
        let err = image.got("puts").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: Lookup::Section, .. }));
    }

    #[test]
    fn plt_stubs() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        // .plt starts with the 16 byte resolver stub
        assert_eq!(image.plt("__libc_start_main").unwrap(), 0x1030);
        assert_eq!(image.plt("puts").unwrap(), 0x1020 + 16 * 6);
        image.rebase(PIE_BASE);
        assert_eq!(image.plt("printf").unwrap(), PIE_BASE + 0x1040);
    }

    #[test]
    fn plt_sec_stubs() {
        let file = ElfBuilder::new(true)
            .symbols(true, &[("puts", 0), ("exit", 0)])
            .section(".plt", 0x1020, &[0xcc; 0x30])
            .section(".plt.sec", 0x1050, &[0xcc; 0x20])
            .section(".got.plt", 0x4000, &[0; 0x28])
            .relocations(".rela.plt", true, &[(0x4018, 1), (0x4020, 2)])
            .write();
        let image = ElfImage::new(file.path()).unwrap();
        assert_eq!(image.plt("puts").unwrap(), 0x1050);
        assert_eq!(image.plt("exit").unwrap(), 0x1060);
    }

    #[test]
    fn no_plt_stubs_for_other_machines() {
        let file = ElfBuilder::new(true)
            .machine(0xb7) // AArch64 stubs have a different layout
            .symbols(true, &[("puts", 0)])
            .section(".plt", 0x1020, &[0; 0x40])
            .relocations(".rela.plt", true, &[(0x4018, 1)])
            .write();
        let image = ElfImage::new(file.path()).unwrap();
        assert!(image.plt("puts").unwrap_err().is_not_found());
    }

    #[test]
    fn read_at() {
        let file = exe64();
        let mut image = ElfImage::new(file.path()).unwrap();
        image.rebase(PIE_BASE);
        assert_eq!(image.read_at(PIE_BASE + 0x2006, 5).unwrap(), b"world");
        assert_eq!(image.read_at(PIE_BASE + 0x200a, 100).unwrap(), b"d\0");
        assert!(image.read_at(0x10, 4).is_err());
    }

    #[test]
    fn construction_errors() {
        let err = ElfImage::new("/definitely/not/here").err().unwrap();
        assert!(matches!(err, Error::Construction { .. }));

        let garbage = temp_file(b"#!/bin/sh\necho this is not an ELF file at all, really\n");
        let err = ElfImage::new(garbage.path()).err().unwrap();
        assert!(matches!(err, Error::Construction { .. }));

        let mut truncated = ElfBuilder::new(true).symbols(false, &[("main", 0x1189)]).build();
        truncated.truncate(64);
        let truncated = temp_file(&truncated);
        let err = ElfImage::new(truncated.path()).err().unwrap();
        assert!(matches!(err, Error::Construction { .. }));
    }
}
