//! `dump!` prints values along with the expressions that produced them, which is
//! handy while poking at leaks, e.g. `dump!(libc_base, leak)` prints
//! `[libc_base]: 0x7f0000000000 (139637976727552), [leak]: [0x10, 0x32]`.
use super::Styling;

pub trait Dump {
    fn dump(&self) -> String;
}

macro_rules! dump_int {
    ($($t:ty),*) => {
        $(
            impl Dump for $t {
                fn dump(&self) -> String {
                    format!("0x{:x} ({})", self, self).dump_int()
                }
            }
        )*
    };
}
dump_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Dump for [u8] {
    fn dump(&self) -> String {
        let bytes: Vec<String> = self.iter().map(|b| format!("0x{b:02x}")).collect();
        format!("[{}]", bytes.join(", ")).dump_bytes()
    }
}

impl<const N: usize> Dump for [u8; N] {
    fn dump(&self) -> String {
        self.as_slice().dump()
    }
}

impl Dump for Vec<u8> {
    fn dump(&self) -> String {
        self.as_slice().dump()
    }
}

impl Dump for str {
    fn dump(&self) -> String {
        format!("{self:?}").dump_other()
    }
}

impl Dump for String {
    fn dump(&self) -> String {
        self.as_str().dump()
    }
}

impl Dump for bool {
    fn dump(&self) -> String {
        format!("{self}").dump_other()
    }
}

impl<T: Dump + ?Sized> Dump for &T {
    fn dump(&self) -> String {
        (**self).dump()
    }
}

pub fn format_entry<T: Dump + ?Sized>(name: &str, value: &T) -> String {
    format!("[{}]: {}", name.dump_name(), value.dump())
}

#[macro_export]
macro_rules! dump {
    ($($value:expr),+ $(,)?) => {{
        let entries: Vec<String> =
            vec![$($crate::utils::dump::format_entry(stringify!($value), &$value)),+];
        println!("{}", entries.join(", "));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::strip_escapes;

    #[test]
    fn entries() {
        let base: u64 = 0x401000;
        let leak = vec![0x10u8, 0xff];
        let s = [
            format_entry("base", &base),
            format_entry("leak", &leak),
            format_entry("name", "puts"),
            format_entry("delta", &-16i32),
        ]
        .map(|e| strip_escapes(&e))
        .join("\n");
        insta::assert_snapshot!(s, @r#"
        [base]: 0x401000 (4198400)
        [leak]: [0x10, 0xff]
        [name]: "puts"
        [delta]: 0xfffffff0 (-16)
        "#);
    }

    #[test]
    fn macro_expands() {
        let x = 1u8;
        let bytes = b"AB";
        crate::dump!(x, bytes, x + 1);
    }
}
