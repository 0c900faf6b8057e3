//! hivekey: offline Windows registry hive parsing and boot key extraction.
//!
//! Parses raw hive files (`SYSTEM`, `SAM`, `SOFTWARE`) directly from their
//! on-disk binary format — no OS registry API — materializing the full
//! key/value tree in one pass. On top of the tree it recovers the SAM
//! boot key from the SYSTEM hive and enumerates users and installed
//! software from the SAM and SOFTWARE hives.
//!
//! ```rust,ignore
//! use hivekey::{bootkey, HiveTree};
//!
//! let system = HiveTree::open("/evidence/SYSTEM")?;
//! let key = bootkey::extract(&system)?;
//! println!("boot key: {}", bootkey::hex_encode(&key));
//! ```

pub mod bootkey;
pub mod error;
pub mod hive;
pub mod report;

pub use error::{HiveError, HiveResult};
pub use hive::{HiveReader, HiveTree, NodeRecord, ValueRecord, ValueType};
