//! Error types for hive parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing a registry hive.
///
/// All parse errors are unrecoverable for the cell being decoded and abort
/// the whole tree build. Lookup misses (a name absent among children or
/// values) are not errors; they surface as `None` from the lookup methods.
#[derive(Debug, Error)]
pub enum HiveError {
    /// The input path does not exist.
    #[error("hive file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file does not start with the `regf` magic.
    #[error("not a registry hive (missing 'regf' magic)")]
    NotAHive,

    /// A cell expected to hold an NK record has the wrong signature.
    #[error("expected NK signature at {0:#x}")]
    BadNodeSignature(u64),

    /// A subkey index cell has a signature other than lf/lh/ri.
    #[error("bad subkey index signature at {0:#x}")]
    BadSubkeyIndex(u64),

    /// A cell expected to hold a VK record has the wrong signature.
    #[error("expected VK signature at {0:#x}")]
    BadValueSignature(u64),

    /// A read past the end of the hive data.
    #[error("truncated hive: read of {len} bytes at {offset:#x} past end of data")]
    TruncatedHive { offset: u64, len: usize },

    /// A subkey index reaches a node that is already on the decode stack.
    #[error("subkey cycle through cell at {0:#x}")]
    CyclicHive(u64),

    /// The Lsa class names do not form valid boot key material.
    #[error("bad boot key material: {0}")]
    BadBootKeyMaterial(String),

    /// I/O error while opening or mapping the hive file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hive operations.
pub type HiveResult<T> = Result<T, HiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_render_as_hex() {
        let err = HiveError::BadNodeSignature(0x1024);
        assert!(err.to_string().contains("0x1024"));

        let err = HiveError::TruncatedHive {
            offset: 0x2000,
            len: 16,
        };
        assert!(err.to_string().contains("0x2000"));
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_file_not_found_shows_path() {
        let err = HiveError::FileNotFound(PathBuf::from("/tmp/system.hive"));
        assert!(err.to_string().contains("/tmp/system.hive"));
    }
}
