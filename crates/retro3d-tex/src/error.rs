use std::fmt;
use std::io;

/// A failure reading or writing a `.tex` container.
#[derive(Debug)]
pub enum TexError {
    /// The underlying stream failed.
    Io(io::Error),
    /// The stream ended inside `what`.
    Truncated { what: &'static str },
    /// Pixel format code other than the ones in [`TexFormat`](crate::TexFormat).
    UnsupportedFormat(u8),
    /// Header fields out of range.
    InvalidHeader { width: i32, height: i32, mip_count: i32 },
    /// A mip record whose payload does not fit its declared size.
    InvalidRecord { index: usize, width: u16, height: u16, linear_size: u32 },
    /// `header.mip_count` disagrees with the number of records.
    MipCountMismatch { declared: i32, actual: usize },
}

impl TexError {
    pub(crate) fn from_io(err: io::Error, what: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            TexError::Truncated { what }
        } else {
            TexError::Io(err)
        }
    }
}

impl fmt::Display for TexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexError::Io(err) => write!(f, "tex i/o error: {err}"),
            TexError::Truncated { what } => write!(f, "tex stream truncated in {what}"),
            TexError::UnsupportedFormat(code) => write!(f, "unsupported tex pixel format {code}"),
            TexError::InvalidHeader { width, height, mip_count } => write!(
                f,
                "invalid tex header: {width}x{height} with {mip_count} mips"
            ),
            TexError::InvalidRecord { index, width, height, linear_size } => write!(
                f,
                "mip record {index} ({width}x{height}) declares {linear_size} bytes"
            ),
            TexError::MipCountMismatch { declared, actual } => write!(
                f,
                "header declares {declared} mips but {actual} records are present"
            ),
        }
    }
}

impl std::error::Error for TexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TexError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TexError {
    fn from(err: io::Error) -> Self {
        TexError::Io(err)
    }
}
