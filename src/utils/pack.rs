//! Fixed width integer codecs used to turn addresses into payload bytes and back.
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }
}

/// Encodes the low `width` bytes of value.
pub fn pack(width: Width, value: u64, endian: Endian) -> Vec<u8> {
    let n = width.bytes();
    match endian {
        Endian::Little => value.to_le_bytes()[..n].to_vec(),
        Endian::Big => value.to_be_bytes()[8 - n..].to_vec(),
    }
}

/// Decodes the first `width` bytes of data. Extra bytes are ignored.
pub fn unpack(width: Width, data: &[u8], endian: Endian) -> Result<u64> {
    let n = width.bytes();
    let Some(bytes) = data.get(..n) else {
        return Err(Error::Malformed(format!(
            "need {n} bytes to unpack, got {}",
            data.len()
        )));
    };

    let mut buf = [0u8; 8];
    match endian {
        Endian::Little => {
            buf[..n].copy_from_slice(bytes);
            Ok(u64::from_le_bytes(buf))
        }
        Endian::Big => {
            buf[8 - n..].copy_from_slice(bytes);
            Ok(u64::from_be_bytes(buf))
        }
    }
}

pub fn p8(value: u8) -> Vec<u8> {
    vec![value]
}

pub fn p16(value: u16) -> Vec<u8> {
    pack(Width::W16, value as u64, Endian::Little)
}

pub fn p32(value: u32) -> Vec<u8> {
    pack(Width::W32, value as u64, Endian::Little)
}

pub fn p64(value: u64) -> Vec<u8> {
    pack(Width::W64, value, Endian::Little)
}

pub fn u8(data: &[u8]) -> Result<u8> {
    Ok(unpack(Width::W8, data, Endian::Little)? as u8)
}

pub fn u16(data: &[u8]) -> Result<u16> {
    Ok(unpack(Width::W16, data, Endian::Little)? as u16)
}

pub fn u32(data: &[u8]) -> Result<u32> {
    Ok(unpack(Width::W32, data, Endian::Little)? as u32)
}

pub fn u64(data: &[u8]) -> Result<u64> {
    unpack(Width::W64, data, Endian::Little)
}
