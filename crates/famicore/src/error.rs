use std::fmt;

use crate::cartridge::header::NES_HEADER_LEN;

#[derive(Debug)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte header.
    HeaderTooShort { actual: usize },
    /// Magic number ("NES<EOF>") is missing.
    InvalidMagic,
    /// A ROM section (trainer/PRG/CHR/...) is shorter than advertised.
    SectionTooShort {
        section: &'static str,
        expected: u64,
        actual: u64,
    },
    /// Header advertises a mapper number that this core does not implement.
    UnsupportedMapper(u16),
    /// The CPU fetched an undocumented opcode. Fatal to the emulation
    /// session; the machine state is left as it was at the faulting cycle.
    UnimplementedOpcode { opcode: u8, pc: u16 },
    /// Wrapper for I/O errors raised while reading ROMs from disk.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooShort { actual } => {
                write!(f, "header expected {NES_HEADER_LEN} bytes, got {actual}")
            }
            Self::InvalidMagic => write!(f, "missing NES magic bytes"),
            Self::SectionTooShort {
                section,
                expected,
                actual,
            } => write!(
                f,
                "{section} section expected {expected} bytes, got {actual}"
            ),
            Self::UnsupportedMapper(mapper) => {
                write!(f, "mapper {mapper} is not implemented")
            }
            Self::UnimplementedOpcode { opcode, pc } => {
                write!(f, "undocumented opcode {opcode:#04X} at {pc:#06X}")
            }
            Self::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
