//! Error types for RARC encoding and parsing

use thiserror::Error;

/// Errors raised while laying out or reading a RARC archive
///
/// The layout variants indicate a broken internal invariant or an input that
/// cannot be expressed in the format's fixed-width fields. They are never
/// expected for a well-formed directory tree.
#[derive(Debug, Error)]
pub enum RarcError {
    /// Name is not representable in the format (names are stored as ASCII)
    #[error("name {0:?} contains non-ASCII characters")]
    NonAsciiName(String),

    /// Name was never interned into the string table
    #[error("name {0:?} missing from string table")]
    NameNotInterned(String),

    /// Node records address names with a 16-bit offset
    #[error("string table offset {offset:#x} for {name:?} exceeds the 16-bit node field")]
    StringOffsetOverflow {
        /// Name whose offset does not fit
        name: String,
        /// Offset assigned to the name
        offset: u32,
    },

    /// Too many records for a 16-bit field
    #[error("{what} count {count} exceeds the format limit of {limit}")]
    CountOverflow {
        /// Which count overflowed
        what: &'static str,
        /// Actual count
        count: usize,
        /// Largest representable value
        limit: usize,
    },

    /// A section ended up at an offset that is not 32-byte aligned
    #[error("{section} offset {offset:#x} is not aligned to {alignment} bytes")]
    Misaligned {
        /// Section name
        section: &'static str,
        /// Offending offset
        offset: u64,
        /// Required alignment
        alignment: u64,
    },

    /// File entry references a payload slot that was never written
    #[error("no payload recorded for file #{0}")]
    MissingPayload(usize),

    /// Directory entry references a directory index outside the arena
    #[error("directory index {0} out of range")]
    InvalidDirectoryIndex(usize),

    /// Payload section would exceed the 32-bit offset space
    #[error("payload section exceeds 4 GiB")]
    PayloadTooLarge,

    /// Invalid magic bytes (expected "RARC")
    #[error("invalid magic: expected 'RARC', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Data is shorter than the header claims
    #[error("truncated data: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Expected minimum size
        expected: usize,
        /// Actual data size
        actual: usize,
    },

    /// A table offset or size points outside the archive
    #[error("{table} at {offset:#x} (+{size:#x}) lies outside the archive")]
    TableOutOfBounds {
        /// Table name
        table: &'static str,
        /// Table start
        offset: usize,
        /// Table length
        size: usize,
    },

    /// Binary read/write error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for RARC operations
pub type Result<T> = std::result::Result<T, RarcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RarcError::InvalidMagic(*b"Yaz0");
        assert!(err.to_string().contains("'RARC'"));

        let err = RarcError::StringOffsetOverflow {
            name: "d_a_obj.rel".to_string(),
            offset: 0x1_0000,
        };
        assert!(err.to_string().contains("0x10000"));
        assert!(err.to_string().contains("d_a_obj.rel"));

        let err = RarcError::Misaligned {
            section: "node table",
            offset: 0x44,
            alignment: 32,
        };
        assert!(err.to_string().contains("node table"));
        assert!(err.to_string().contains("0x44"));

        let err = RarcError::CountOverflow {
            what: "file",
            count: 70_000,
            limit: 0xFFFF,
        };
        assert!(err.to_string().contains("70000"));
    }
}
