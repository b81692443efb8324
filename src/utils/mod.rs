pub mod dump;
pub mod hexdump;
pub mod pack;
pub mod styles;

pub use hexdump::*;
pub use pack::*;
pub use styles::*;

use crate::error::{Error, Result};

pub fn require(predicate: bool, err: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(Error::Malformed(err.to_string()))
    }
}

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Verbose diagnostics, e.g. session traffic. Callers decide whether these are wanted.
pub fn trace(mesg: &str) {
    eprintln!("{}", mesg.trace());
}

pub fn explain(title: &str, text: &str) {
    println!("{}: {}", title.explain_title(), text.explain_text());
}

/// Parses "0x" prefixed hex or plain decimal.
pub fn parse_u64_expr(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    if let Some(t) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(t, 16).map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    } else {
        s.parse()
            .map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    }
}

/// Parses an unsigned value in an arbitrary radix, e.g. 2 for "1011".
pub fn parse_radix(s: &str, radix: u32) -> Result<u64> {
    u64::from_str_radix(s.trim(), radix)
        .map_err(|err| Error::Malformed(format!("`{s}` isn't a base {radix} number: {err}")))
}

/// Expands the escapes people type on a command line for delimiters, e.g. `\r\n`.
pub fn unescape(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push(b'\n'),
                Some('r') => result.push(b'\r'),
                Some('t') => result.push(b'\t'),
                Some('0') => result.push(0),
                Some('\\') => result.push(b'\\'),
                Some(other) => {
                    result.push(b'\\');
                    let mut buf = [0; 4];
                    result.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
                }
                None => result.push(b'\\'),
            }
        } else {
            let mut buf = [0; 4];
            result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    result
}

/// Remove escape sequences from the string (e.g. for colors).
pub fn strip_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_u64_expr("0x555555554000"), Ok(0x555555554000));
        assert_eq!(parse_u64_expr("4096"), Ok(4096));
        assert!(parse_u64_expr("0xzz").is_err());
        assert_eq!(parse_radix("1011", 2).unwrap(), 11);
        assert_eq!(parse_radix("777", 8).unwrap(), 0o777);
        assert!(parse_radix("9", 8).is_err());
    }

    #[test]
    fn unescape_delimiters() {
        assert_eq!(unescape(r"\r\n"), b"\r\n");
        assert_eq!(unescape("> "), b"> ");
        assert_eq!(unescape(r"a\qb"), br"a\qb");
    }

    #[test]
    fn strips_colors() {
        let s = "\x1b[31mred\x1b[0m plain";
        assert_eq!(strip_escapes(s), "red plain");
    }
}
