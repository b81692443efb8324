use std::ops::{Add, Sub};

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ElfOffset(pub u64);

/// A link-time virtual address, i.e. before any rebasing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualAddr(pub u64);

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses.
#[derive(Copy, Clone, Debug)]
pub struct Bytes<A>
where
    A: Add<u64, Output = A> + Copy + Ord,
{
    pub start: A,
    pub size: u64,
}

impl Bytes<ElfOffset> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: ElfOffset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Add<u64, Output = A> + Copy + Ord> Bytes<A> {
    pub fn contains(&self, addr: A) -> bool {
        addr >= self.start && addr < self.end()
    }

    pub fn end(&self) -> A {
        self.start + self.size
    }
}

impl Sub<VirtualAddr> for VirtualAddr {
    type Output = u64;

    fn sub(self, rhs: VirtualAddr) -> Self::Output {
        self.0.wrapping_sub(rhs.0)
    }
}

impl Add<u64> for VirtualAddr {
    type Output = VirtualAddr;

    fn add(self, rhs: u64) -> Self::Output {
        VirtualAddr(self.0.wrapping_add(rhs))
    }
}

impl Add<u64> for ElfOffset {
    type Output = ElfOffset;

    fn add(self, rhs: u64) -> Self::Output {
        ElfOffset(self.0.wrapping_add(rhs))
    }
}
