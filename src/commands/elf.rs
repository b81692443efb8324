use super::tables::{TableBuilder, add_field, uwriteln};
use crate::repl::{BaseArgs, HexdumpArgs, NameArgs, SymbolsArgs};
use pwner::utils::{self, Styling};
use pwner::{ElfImage, Result};
use std::io::Write;

pub fn base(image: &mut ElfImage, args: &BaseArgs, mut out: impl Write) {
    image.rebase(args.addr);
    uwriteln!(out, "base is {}", format!("0x{:x}", image.base()).address());
}

pub fn sym(image: &ElfImage, args: &NameArgs, out: impl Write) -> Result<()> {
    let addr = image.sym(&args.name)?;
    write_addr(out, addr, &args.name);
    Ok(())
}

pub fn plt(image: &ElfImage, args: &NameArgs, out: impl Write) -> Result<()> {
    let addr = image.plt(&args.name)?;
    write_addr(out, addr, &format!("{}@plt", args.name));
    Ok(())
}

pub fn got(image: &ElfImage, args: &NameArgs, out: impl Write) -> Result<()> {
    let addr = image.got(&args.name)?;
    write_addr(out, addr, &format!("{}@got", args.name));
    Ok(())
}

fn write_addr(mut out: impl Write, addr: u64, label: &str) {
    uwriteln!(out, "{}  {label}", format!("0x{addr:x}").address());
}

pub fn symbols(image: &ElfImage, args: &SymbolsArgs, mut out: impl Write) {
    let builder = symbols_table(&image.symbols(), args.filter.as_deref());
    if builder.is_empty() {
        uwriteln!(out, "no matching symbols");
    } else {
        builder.writeln(out, args.titles, args.explain);
    }
}

fn symbols_table(symbols: &[(&str, u64)], filter: Option<&str>) -> TableBuilder {
    let mut builder = TableBuilder::new();
    builder.add_col_r(
        "address",
        "where the symbol is with the current base applied (in hex)",
    );
    builder.add_col_l("name", "the symbol name, PLT stubs end with @plt");

    let matches = symbols
        .iter()
        .filter(|(name, _)| filter.is_none_or(|f| name.contains(f)));
    for (name, addr) in matches {
        add_field!(builder, "address", "{:x}", addr);
        add_field!(builder, "name", name);
    }
    builder
}

/// The value can be an address or a symbol name.
pub fn hexdump(image: &ElfImage, args: &HexdumpArgs, mut out: impl Write) -> Result<()> {
    let addr = match utils::parse_u64_expr(&args.value) {
        Ok(addr) => addr,
        Err(_) => image.sym(&args.value)?,
    };
    let bytes = image.read_at(addr, args.count)?;
    if bytes.is_empty() {
        uwriteln!(out, "no bytes at 0x{addr:x}");
    } else {
        uwriteln!(out, "{}", utils::hexdump(&bytes, addr, args.labels));
    }
    Ok(())
}
