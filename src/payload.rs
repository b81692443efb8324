//! Building exploit payloads out of mixed pieces, e.g.
//! `pay![b"A".repeat(40), elf.plt("puts")?, elf.got("puts")?, "\n"]`.
use crate::utils::{Endian, Width, pack};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Item {
    Bytes(Vec<u8>),
    Text(String),
    Int {
        width: Width,
        value: u64,
        endian: Endian,
    },
}

impl Item {
    pub fn int(width: Width, value: u64, endian: Endian) -> Item {
        Item::Int {
            width,
            value,
            endian,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Item::Bytes(bytes) => bytes.clone(),
            Item::Text(text) => text.as_bytes().to_vec(),
            Item::Int {
                width,
                value,
                endian,
            } => pack(*width, *value, *endian),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Item::Bytes(bytes) => bytes.len(),
            Item::Text(text) => text.len(),
            Item::Int { width, .. } => width.bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&[u8]> for Item {
    fn from(bytes: &[u8]) -> Self {
        Item::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Item {
    fn from(bytes: &[u8; N]) -> Self {
        Item::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Item {
    fn from(bytes: Vec<u8>) -> Self {
        Item::Bytes(bytes)
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::Text(text.to_string())
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Item::Text(text)
    }
}

// Integers pack little-endian at their own width.
macro_rules! int_item {
    ($($t:ty => $width:expr),*) => {
        $(
            impl From<$t> for Item {
                fn from(value: $t) -> Self {
                    Item::int($width, value as u64, Endian::Little)
                }
            }
        )*
    };
}
int_item!(u8 => Width::W8, u16 => Width::W16, u32 => Width::W32, u64 => Width::W64);

/// Concatenates the encoded items.
pub fn pay<I>(items: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: Into<Item>,
{
    let mut payload = Vec::new();
    for item in items {
        payload.extend(item.into().encode());
    }
    payload
}

#[macro_export]
macro_rules! pay {
    ($($item:expr),* $(,)?) => {{
        let items: Vec<$crate::payload::Item> = vec![$($crate::payload::Item::from($item)),*];
        $crate::payload::pay(items)
    }};
}
