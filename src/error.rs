//! Error taxonomy for the compression adapter.
//!
//! Every fallible operation in this crate returns [`Error`], which carries a
//! [`Category`] (system vs. codec) plus the originating numeric code. This
//! mirrors the upstream C++ adapter's `error_code`/`error_category` split: a
//! single error type, not one enum variant per failure site.

use std::fmt;
use std::io;

/// Raw zstd error codes this crate can observe, taken from zstd's own
/// `ZSTD_ErrorCode` enumeration. Not exhaustive — only the codes the encode
/// and decode pumps can plausibly produce are listed.
pub mod codec_code {
    pub const GENERIC: i32 = 1;
    pub const PARAMETER_UNSUPPORTED: i32 = 40;
    pub const PARAMETER_OUT_OF_BOUND: i32 = 42;
    pub const STAGE_WRONG: i32 = 60;
    pub const DST_SIZE_TOO_SMALL: i32 = 70;
    pub const CORRUPTION_DETECTED: i32 = 20;
    pub const CHECKSUM_WRONG: i32 = 22;
    pub const MEMORY_ALLOCATION: i32 = 64;
}

/// Which side of the taxonomy an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Produced by the wrapped transport (I/O failures, EOF, cancellation).
    System,
    /// Produced by the zstd codec itself.
    Codec,
}

/// A single error value carrying a category tag and an integer code.
///
/// For [`Category::System`] errors, `io_source` is always present and `code`
/// is its raw OS error code (0 if none is available). For [`Category::Codec`]
/// errors, `code` is the raw numeric code zstd reported and `io_source` is
/// `None`.
#[derive(Debug)]
pub struct Error {
    category: Category,
    code: i32,
    io_source: Option<io::Error>,
}

impl Error {
    pub(crate) fn system(source: io::Error) -> Self {
        let code = source.raw_os_error().unwrap_or(0);
        Error {
            category: Category::System,
            code,
            io_source: Some(source),
        }
    }

    pub(crate) fn codec(code: i32) -> Self {
        Error {
            category: Category::Codec,
            code,
            io_source: None,
        }
    }

    pub(crate) fn parameter_out_of_bound() -> Self {
        Error::codec(codec_code::PARAMETER_OUT_OF_BOUND)
    }

    /// The category this error belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The raw numeric code: an OS error number for system errors, a zstd
    /// `ZSTD_ErrorCode` value for codec errors.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Equivalent of the source's `zstd_error_category::default_error_condition`:
    /// maps a handful of codes onto a portable [`io::ErrorKind`] so callers
    /// don't need to match on raw codec codes for common cases.
    pub fn default_error_condition(&self) -> Option<io::ErrorKind> {
        match self.category {
            Category::System => self.io_source.as_ref().map(|e| e.kind()),
            Category::Codec if self.code == codec_code::MEMORY_ALLOCATION => {
                Some(io::ErrorKind::OutOfMemory)
            }
            Category::Codec => None,
        }
    }

    /// The wrapped transport error, if this is a [`Category::System`] error.
    pub fn io_source(&self) -> Option<&io::Error> {
        self.io_source.as_ref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.category, &self.io_source) {
            (Category::System, Some(source)) => {
                write!(f, "transport error (code {}): {}", self.code, source)
            }
            (Category::System, None) => write!(f, "transport error (code {})", self.code),
            (Category::Codec, _) => write!(f, "codec error, code {}", self.code),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.io_source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::system(source)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Maps a raw zstd-safe result code (as returned by `compress_stream2`,
/// `decompress_stream`, or `set_parameter`) onto this crate's [`Error`].
///
/// `zstd_safe` decodes the library's `SIZE_MAX`-based sentinel into the
/// caller-facing `ZSTD_ErrorCode` value itself, so the numeric codes here
/// line up directly with the constants in [`codec_code`].
pub(crate) fn from_zstd_code(raw: usize) -> Error {
    let code = zstd::zstd_safe::get_error_code(raw) as i32;
    Error::codec(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_error_carries_kind() {
        let err = Error::from(io::Error::from(io::ErrorKind::NotConnected));
        assert_eq!(err.category(), Category::System);
        assert_eq!(err.default_error_condition(), Some(io::ErrorKind::NotConnected));
    }

    #[test]
    fn memory_allocation_maps_to_out_of_memory() {
        let err = Error::codec(codec_code::MEMORY_ALLOCATION);
        assert_eq!(err.default_error_condition(), Some(io::ErrorKind::OutOfMemory));
    }

    #[test]
    fn other_codec_errors_have_no_condition() {
        let err = Error::codec(codec_code::CORRUPTION_DETECTED);
        assert_eq!(err.default_error_condition(), None);
    }

    #[test]
    fn parameter_out_of_bound_is_codec_category() {
        let err = Error::parameter_out_of_bound();
        assert_eq!(err.category(), Category::Codec);
        assert_eq!(err.code(), codec_code::PARAMETER_OUT_OF_BOUND);
    }
}
