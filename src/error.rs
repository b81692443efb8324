use std::fmt;

/// What kind of name a failed lookup was for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lookup {
    Symbol,
    Plt,
    Got,
    Section,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lookup::Symbol => f.write_str("symbol"),
            Lookup::Plt => f.write_str("PLT entry"),
            Lookup::Got => f.write_str("GOT entry"),
            Lookup::Section => f.write_str("section"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An ELF image, process, or connection couldn't be created. Nothing is left
    /// half-built when this is returned.
    #[error("couldn't create {what}: {reason}")]
    Construction { what: String, reason: String },

    /// ELF bytes that don't hold together, e.g. a section that runs past the end of
    /// the file.
    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: Lookup, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("broken tube")]
    ClosedSession,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(kind: Lookup, name: &str) -> Self {
        Error::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn construction(what: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Construction {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Error::ClosedSession)
    }
}
