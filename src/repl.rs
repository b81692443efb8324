//! Definitions for the commands that are used interactively by `pwner elf`, e.g.
//! `sym main` and `got puts`.
use clap::{Args, Parser, Subcommand};
use pwner::utils::{HexdumpLabels, parse_u64_expr};

#[derive(Parser)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Repl {
    #[command(subcommand)]
    pub command: MainCommand,
}

#[derive(Subcommand)]
pub enum MainCommand {
    /// Set the load base, e.g. a leaked PIE or libc base
    Base(BaseArgs),

    /// Print the address of a symbol
    Sym(NameArgs),

    /// Print the address of the PLT stub for a function
    Plt(NameArgs),

    /// Print the address of the GOT slot for a function
    Got(NameArgs),

    /// Show resolved symbols sorted by address
    Symbols(SymbolsArgs),

    /// Print bytes at an address or symbol as hex and ascii
    Hexdump(HexdumpArgs),

    /// Exit pwner
    Quit,
}

#[derive(Args)]
pub struct BaseArgs {
    /// New load base, hex with 0x or decimal
    #[arg(value_parser = parse_u64_expr)]
    pub addr: u64,
}

#[derive(Args)]
pub struct NameArgs {
    /// Symbol or function name, e.g. puts
    pub name: String,
}

#[derive(Args)]
pub struct SymbolsArgs {
    /// Explain columns
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,

    /// Only show symbols whose name contains this
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct HexdumpArgs {
    /// Number of bytes to dump
    #[arg(short, long)]
    #[arg(default_value_t = 64)]
    pub count: usize,

    /// How to display the start of each row
    #[arg(short, long, name = "TYPE")]
    #[arg(default_value_t = HexdumpLabels::Addr)]
    pub labels: HexdumpLabels,

    /// An address (hex with 0x or decimal) or a symbol name
    pub value: String,
}
