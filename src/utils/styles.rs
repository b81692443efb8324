//! Used to color and otherwise style various bits of output.
use nu_ansi_term::{Color, Style};

pub trait Styling {
    fn explain_title(self) -> String;
    fn explain_text(self) -> String;
    fn hex_offset(self) -> String;
    fn hex_hex(self) -> String;
    fn hex_ascii(self) -> String;
    fn table_header(self) -> String;
    fn table_sep(self) -> String;
    fn table_field(self) -> String;
    fn dump_name(self) -> String;
    fn dump_int(self) -> String;
    fn dump_bytes(self) -> String;
    fn dump_other(self) -> String;
    fn address(self) -> String;
    fn trace(self) -> String;
    fn warn(self) -> String;
}

fn paint(style: Style, s: &str) -> String {
    style.paint(s).to_string()
}

impl Styling for &str {
    fn explain_title(self) -> String {
        paint(Style::new().bold(), self)
    }

    fn explain_text(self) -> String {
        paint(Style::new().italic(), self)
    }

    fn hex_offset(self) -> String {
        paint(Style::new().fg(Color::DarkGray), self)
    }

    fn hex_hex(self) -> String {
        paint(Style::new().fg(Color::Cyan), self)
    }

    fn hex_ascii(self) -> String {
        paint(Style::new().fg(Color::Green), self)
    }

    fn table_header(self) -> String {
        paint(Style::new().bold(), self)
    }

    fn table_sep(self) -> String {
        paint(Style::new().fg(Color::DarkGray), self)
    }

    fn table_field(self) -> String {
        paint(Style::new(), self)
    }

    fn dump_name(self) -> String {
        paint(Style::new().fg(Color::Green), self)
    }

    fn dump_int(self) -> String {
        paint(Style::new().fg(Color::Red), self)
    }

    fn dump_bytes(self) -> String {
        paint(Style::new().fg(Color::Purple), self)
    }

    fn dump_other(self) -> String {
        paint(Style::new().fg(Color::White), self)
    }

    fn address(self) -> String {
        paint(Style::new().fg(Color::Blue).bold(), self)
    }

    fn trace(self) -> String {
        paint(Style::new().fg(Color::DarkGray), self)
    }

    fn warn(self) -> String {
        paint(Style::new().fg(Color::Yellow).bold(), self)
    }
}

impl Styling for String {
    fn explain_title(self) -> String {
        self.as_str().explain_title()
    }

    fn explain_text(self) -> String {
        self.as_str().explain_text()
    }

    fn hex_offset(self) -> String {
        self.as_str().hex_offset()
    }

    fn hex_hex(self) -> String {
        self.as_str().hex_hex()
    }

    fn hex_ascii(self) -> String {
        self.as_str().hex_ascii()
    }

    fn table_header(self) -> String {
        self.as_str().table_header()
    }

    fn table_sep(self) -> String {
        self.as_str().table_sep()
    }

    fn table_field(self) -> String {
        self.as_str().table_field()
    }

    fn dump_name(self) -> String {
        self.as_str().dump_name()
    }

    fn dump_int(self) -> String {
        self.as_str().dump_int()
    }

    fn dump_bytes(self) -> String {
        self.as_str().dump_bytes()
    }

    fn dump_other(self) -> String {
        self.as_str().dump_other()
    }

    fn address(self) -> String {
        self.as_str().address()
    }

    fn trace(self) -> String {
        self.as_str().trace()
    }

    fn warn(self) -> String {
        self.as_str().warn()
    }
}
