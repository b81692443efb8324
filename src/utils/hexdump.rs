use super::Styling;
use clap::ValueEnum;
use std::fmt;

const ROW: usize = 16;
const HEX_WIDTH: usize = 3 * ROW; // width of a full row of hex

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum HexdumpLabels {
    /// Show nothing at the start of lines
    #[default]
    None,

    /// Show the address for the first byte on each line
    Addr,

    /// Show the offset from zero for the first byte on each line
    Zero,
}

impl fmt::Display for HexdumpLabels {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HexdumpLabels::None => fmt.write_str("none")?,
            HexdumpLabels::Addr => fmt.write_str("addr")?,
            HexdumpLabels::Zero => fmt.write_str("zero")?,
        }
        Ok(())
    }
}

/// Formats bytes as rows of hex and ascii, e.g.
/// 000000401000: 7f 45 4c 46 02 01 01 00  00 00 00 00 00 00 00 00   .ELF............
/// `addr` is the address of the first byte and only matters for Addr labels.
pub fn hexdump(bytes: &[u8], addr: u64, labels: HexdumpLabels) -> String {
    let mut lines = Vec::new();
    for (row, chunk) in bytes.chunks(ROW).enumerate() {
        let delta = row * ROW;
        let mut line = String::new();
        match labels {
            HexdumpLabels::None => (),
            HexdumpLabels::Addr => {
                line.push_str(&format!("{:012x}: ", addr + delta as u64).hex_offset());
            }
            HexdumpLabels::Zero => {
                line.push_str(&format!("{:04x}: ", delta).hex_offset());
            }
        }

        let halves: Vec<String> = chunk
            .chunks(ROW / 2)
            .map(|half| {
                half.iter()
                    .map(|b| format!("{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        let hex = halves.join("  ");
        let padding = HEX_WIDTH - hex.len();
        line.push_str(&hex.hex_hex());
        line.push_str(&" ".repeat(padding + 3));

        let ascii: String = chunk
            .iter()
            .map(|&b| {
                let ch = b as char;
                if ch.is_ascii_graphic() { ch } else { '.' }
            })
            .collect();
        line.push_str(&ascii.hex_ascii());
        lines.push(line);
    }
    lines.join("\n")
}
