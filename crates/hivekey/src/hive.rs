//! Registry hive file parsing.
//!
//! Parses the raw on-disk hive format (the binary behind `SYSTEM`, `SAM`,
//! `SOFTWARE`) without any OS registry API, materializing the whole key/value
//! tree in one eager pass over file offsets.
//!
//! Hive file format:
//! ```text
//! +0x0000  base block ("regf" signature, 4096 bytes)
//!   +0x0000  Signature: "regf" (4 bytes)
//!   +0x0024  RootCellOffset (u32) — offset of root NK cell within hive data
//! +0x1000  hive data (bins), cells addressed relative to this base
//!   Each cell is |size(i32)|data...|; cell-relative offsets skip the size
//!   prefix, so absolute = 4096 + offset + 4.
//!   Cell types identified by 2-byte signature:
//!     "nk" — key node (name, metadata, subkey/value list offsets)
//!     "vk" — key value (name, type tag, inline or indirect data)
//!     "lf"/"lh" — fast/hashed leaf subkey list
//!     "ri" — index root (indirection over multiple leaf lists)
//! ```
//!
//! Big-data records (values spanning more than one cell through a secondary
//! pointer block) are not decoded; see [`ValueRecord`].

use crate::error::{HiveError, HiveResult};
use memmap2::{Mmap, MmapOptions};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ── Constants ────────────────────────────────────────────────────────

const REGF_SIGNATURE: &[u8; 4] = b"regf";
const NK_SIGNATURE: u16 = 0x6B6E; // "nk" little-endian
const VK_SIGNATURE: u16 = 0x6B76; // "vk" little-endian
const LF_SIGNATURE: u16 = 0x666C; // "lf" little-endian
const LH_SIGNATURE: u16 = 0x686C; // "lh" little-endian
const RI_SIGNATURE: u16 = 0x6972; // "ri" little-endian

/// The base block is always 4096 bytes; all cell offsets are relative to
/// the data that follows it.
pub const BINS_BASE: u64 = 4096;

/// Offset of the root cell offset within the base block.
const REGF_ROOT_CELL_OFFSET: u64 = 0x24;

/// NK header byte 2 value marking the hive root
/// (KEY_HIVE_ENTRY | KEY_NO_DELETE | KEY_COMP_NAME).
const ROOT_NODE_SENTINEL: u8 = 0x2C;

// NK field offsets, relative to the first byte after the 4-byte NK header.
const NK_TIMESTAMP: u64 = 0; // i64 FILETIME
const NK_PARENT: u64 = 12; // i32 parent cell offset
const NK_SUBKEY_COUNT: u64 = 16; // i32
const NK_SUBKEY_INDEX: u64 = 24; // i32 subkey index cell offset, -1 = none
const NK_VALUE_COUNT: u64 = 32; // i32
const NK_VALUE_LIST: u64 = 36; // i32 value list cell offset, -1 = none
const NK_SECURITY_KEY: u64 = 40; // i32
const NK_CLASS_NAME: u64 = 44; // i32 class name cell offset
const NK_NAME_LENGTH: u64 = 68; // i16
const NK_CLASS_NAME_LENGTH: u64 = 70; // i16
const NK_NAME_START: u64 = 72; // name bytes

// VK field offsets, relative to the 2-byte VK signature.
const VK_NAME_LENGTH: u64 = 2; // i16
const VK_DATA_LENGTH: u64 = 4; // i32
const VK_DATA: u64 = 8; // 4 bytes: data cell offset, or inline data
const VK_TYPE: u64 = 12; // i32
const VK_NAME_START: u64 = 20; // name bytes

/// Name reported for a value whose stored name is empty.
const DEFAULT_VALUE_NAME: &str = "Default";

// ── Value types ──────────────────────────────────────────────────────

/// Registry value type tag.
///
/// The core does not decode value data by type; the tag is preserved so
/// consumers can pattern-match. Codes outside the well-known set are kept
/// as [`ValueType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    None,
    Sz,
    ExpandSz,
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiSz,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    Unknown(i32),
}

impl ValueType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => ValueType::None,
            1 => ValueType::Sz,
            2 => ValueType::ExpandSz,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiSz,
            8 => ValueType::ResourceList,
            9 => ValueType::FullResourceDescriptor,
            10 => ValueType::ResourceRequirementsList,
            11 => ValueType::Qword,
            other => ValueType::Unknown(other),
        }
    }

    /// The numeric tag as stored in the VK record.
    pub fn raw(self) -> i32 {
        match self {
            ValueType::None => 0,
            ValueType::Sz => 1,
            ValueType::ExpandSz => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiSz => 7,
            ValueType::ResourceList => 8,
            ValueType::FullResourceDescriptor => 9,
            ValueType::ResourceRequirementsList => 10,
            ValueType::Qword => 11,
            ValueType::Unknown(raw) => raw,
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────

/// A decoded registry key node (NK record) with its full subtree.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// True for the hive root node.
    pub is_root: bool,
    /// Last write time as a Windows FILETIME (100ns ticks since 1601).
    pub last_write_time: i64,
    /// Cell offset of the parent node.
    pub parent_offset: i32,
    /// Subkey count as stored in the record.
    pub subkey_count: i32,
    /// Subkey index cell offset; `None` when the record stores -1.
    pub subkey_index_offset: Option<i32>,
    /// Value count as stored in the record.
    pub value_count: i32,
    /// Value list cell offset; `None` when the record stores -1.
    pub value_list_offset: Option<i32>,
    /// Security key cell offset.
    pub security_key_offset: i32,
    /// Class name cell offset, -1 when absent.
    pub class_name_offset: i32,
    /// Class name length in bytes.
    pub class_name_length: i16,
    /// Key name.
    pub name: String,
    /// Raw class name bytes (UTF-16-like; used for boot key extraction).
    pub class_name: Vec<u8>,
    /// Child nodes, in subkey index order.
    pub children: Vec<NodeRecord>,
    /// Values, in value list order.
    pub values: Vec<ValueRecord>,
}

impl NodeRecord {
    /// Find a direct child by name, case-insensitively.
    pub fn child(&self, name: &str) -> Option<&NodeRecord> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find a value by name, case-insensitively.
    pub fn value(&self, name: &str) -> Option<&ValueRecord> {
        self.values.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// A decoded registry value (VK record).
///
/// Values whose data exceeds a single cell use a secondary "big data"
/// pointer block in the full format; that indirection is not decoded here,
/// so such values carry whatever bytes the first cell holds.
#[derive(Debug, Clone)]
pub struct ValueRecord {
    /// Value name; `"Default"` when the stored name is empty.
    pub name: String,
    /// Data length as stored in the record.
    pub data_length: i32,
    /// Value type tag.
    pub value_type: ValueType,
    /// Raw data bytes. For inline storage (`data_length < 5`) this is the
    /// 4 raw bytes of the offset field, regardless of the nominal length.
    pub data: Vec<u8>,
}

impl ValueRecord {
    /// The first four data bytes as a little-endian u32, if present.
    pub fn as_u32(&self) -> Option<u32> {
        let bytes = self.data.get(0..4)?;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Decode the data as a string: UTF-16LE for string-typed values,
    /// lossy UTF-8 otherwise.
    pub fn as_string(&self) -> String {
        match self.value_type {
            ValueType::Sz | ValueType::ExpandSz | ValueType::MultiSz => {
                read_utf16le_string(&self.data)
            }
            _ => String::from_utf8_lossy(&self.data)
                .trim_end_matches('\0')
                .to_string(),
        }
    }
}

// ── Reader ───────────────────────────────────────────────────────────

enum HiveData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl HiveData {
    fn as_slice(&self) -> &[u8] {
        match self {
            HiveData::Mapped(mmap) => mmap.as_ref(),
            HiveData::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// Random-access reader over a hive's bytes.
///
/// Validates the `regf` magic on construction and exposes little-endian
/// absolute-offset read primitives. Only needed while the tree is being
/// built; [`HiveTree`] owns all decoded bytes afterwards.
pub struct HiveReader {
    data: HiveData,
}

impl HiveReader {
    /// Memory-map a hive file and validate its magic.
    pub fn open(path: impl AsRef<Path>) -> HiveResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HiveError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        // Safety: mapped read-only; the hive is treated as immutable input.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Self::validate(HiveData::Mapped(mmap))
    }

    /// Wrap an in-memory hive image (tests, embedders) and validate its magic.
    pub fn from_bytes(bytes: Vec<u8>) -> HiveResult<Self> {
        Self::validate(HiveData::Owned(bytes))
    }

    fn validate(data: HiveData) -> HiveResult<Self> {
        let reader = HiveReader { data };
        let slice = reader.data.as_slice();
        if slice.len() < 4 || &slice[0..4] != REGF_SIGNATURE {
            return Err(HiveError::NotAHive);
        }
        Ok(reader)
    }

    /// Convert a cell-relative offset to an absolute one, skipping the
    /// 4-byte cell length prefix.
    pub fn cell_addr(&self, offset: i32) -> u64 {
        (BINS_BASE as i64 + offset as i64 + 4) as u64
    }

    /// Read `len` bytes at an absolute offset.
    pub fn read_bytes_at(&self, offset: u64, len: usize) -> HiveResult<&[u8]> {
        let data = self.data.as_slice();
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= data.len() && offset <= data.len() as u64 => {
                Ok(&data[start..end])
            }
            _ => Err(HiveError::TruncatedHive { offset, len }),
        }
    }

    pub fn read_i16_at(&self, offset: u64) -> HiveResult<i16> {
        let bytes = self.read_bytes_at(offset, 2)?;
        Ok(i16::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i32_at(&self, offset: u64) -> HiveResult<i32> {
        let bytes = self.read_bytes_at(offset, 4)?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64_at(&self, offset: u64) -> HiveResult<i64> {
        let bytes = self.read_bytes_at(offset, 8)?;
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_u16_at(&self, offset: u64) -> HiveResult<u16> {
        let bytes = self.read_bytes_at(offset, 2)?;
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    // ── NK decoding ──────────────────────────────────────────────────

    /// Decode the NK record at an absolute offset, recursively populating
    /// children and values. `visiting` holds the cell offsets currently on
    /// the decode stack; revisiting one means the subkey graph is cyclic.
    fn read_node(&self, offset: u64, visiting: &mut HashSet<u64>) -> HiveResult<NodeRecord> {
        if !visiting.insert(offset) {
            return Err(HiveError::CyclicHive(offset));
        }

        let header = self.read_bytes_at(offset, 4)?;
        if u16::from_le_bytes(header[0..2].try_into().unwrap()) != NK_SIGNATURE {
            return Err(HiveError::BadNodeSignature(offset));
        }
        let is_root = header[2] == ROOT_NODE_SENTINEL;

        // Fields are laid out relative to the first byte after the header.
        let base = offset + 4;
        let last_write_time = self.read_i64_at(base + NK_TIMESTAMP)?;
        let parent_offset = self.read_i32_at(base + NK_PARENT)?;
        let subkey_count = self.read_i32_at(base + NK_SUBKEY_COUNT)?;
        let subkey_index_offset = cell_ref(self.read_i32_at(base + NK_SUBKEY_INDEX)?);
        let value_count = self.read_i32_at(base + NK_VALUE_COUNT)?;
        let value_list_offset = cell_ref(self.read_i32_at(base + NK_VALUE_LIST)?);
        let security_key_offset = self.read_i32_at(base + NK_SECURITY_KEY)?;
        let class_name_offset = self.read_i32_at(base + NK_CLASS_NAME)?;
        let name_length = self.read_i16_at(base + NK_NAME_LENGTH)?;
        let class_name_length = self.read_i16_at(base + NK_CLASS_NAME_LENGTH)?;

        let name_bytes = self.read_bytes_at(base + NK_NAME_START, name_length.max(0) as usize)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        let class_name = if class_name_length > 0 && class_name_offset != -1 {
            self.read_bytes_at(self.cell_addr(class_name_offset), class_name_length as usize)?
                .to_vec()
        } else {
            Vec::new()
        };

        let children = match subkey_index_offset {
            Some(index) => {
                let offsets = self.read_subkey_index(self.cell_addr(index))?;
                let mut children = Vec::with_capacity(offsets.len());
                for child in offsets {
                    children.push(self.read_node(self.cell_addr(child), visiting)?);
                }
                children
            }
            None => Vec::new(),
        };

        let values = match value_list_offset {
            Some(list) => self.read_value_list(list, value_count)?,
            None => Vec::new(),
        };

        visiting.remove(&offset);

        Ok(NodeRecord {
            is_root,
            last_write_time,
            parent_offset,
            subkey_count,
            subkey_index_offset,
            value_count,
            value_list_offset,
            security_key_offset,
            class_name_offset,
            class_name_length,
            name,
            class_name,
            children,
            values,
        })
    }

    // ── Subkey index resolution ──────────────────────────────────────

    /// Resolve a subkey index cell (lf/lh/ri) at an absolute offset into a
    /// flat, ordered list of child cell offsets. Each stored entry yields
    /// exactly one offset; `ri` entries are concatenated in index order.
    fn read_subkey_index(&self, offset: u64) -> HiveResult<Vec<i32>> {
        match self.read_u16_at(offset)? {
            LF_SIGNATURE | LH_SIGNATURE => self.read_leaf_list(offset),
            RI_SIGNATURE => {
                // 4-byte entries, each pointing at a secondary leaf list.
                // Only lf/lh are allowed there; in particular a nested ri
                // would make unbounded recursion possible on a corrupt hive.
                let count = self.read_i16_at(offset + 2)?.max(0) as u64;
                let mut offsets = Vec::new();
                for i in 0..count {
                    let list = self.read_i32_at(offset + 4 + i * 4)?;
                    let list_addr = self.cell_addr(list);
                    match self.read_u16_at(list_addr)? {
                        LF_SIGNATURE | LH_SIGNATURE => {
                            offsets.extend(self.read_leaf_list(list_addr)?);
                        }
                        _ => return Err(HiveError::BadSubkeyIndex(list_addr)),
                    }
                }
                Ok(offsets)
            }
            _ => Err(HiveError::BadSubkeyIndex(offset)),
        }
    }

    /// Read an lf/lh leaf list whose signature the caller has verified:
    /// 8-byte entries of child cell offset + hash (hash unused).
    fn read_leaf_list(&self, offset: u64) -> HiveResult<Vec<i32>> {
        let count = self.read_i16_at(offset + 2)?.max(0) as u64;
        let mut offsets = Vec::with_capacity(count as usize);
        for i in 0..count {
            offsets.push(self.read_i32_at(offset + 4 + i * 8)?);
        }
        Ok(offsets)
    }

    // ── Value decoding ───────────────────────────────────────────────

    /// Resolve a value list: `count` contiguous 4-byte offsets, each
    /// pointing at a VK cell, decoded in stored order.
    fn read_value_list(&self, list_offset: i32, count: i32) -> HiveResult<Vec<ValueRecord>> {
        let base = self.cell_addr(list_offset);
        let count = count.max(0) as u64;
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count {
            let offset = self.read_i32_at(base + i * 4)?;
            values.push(self.read_value(self.cell_addr(offset))?);
        }
        Ok(values)
    }

    /// Decode the VK record at an absolute offset.
    fn read_value(&self, offset: u64) -> HiveResult<ValueRecord> {
        if self.read_u16_at(offset)? != VK_SIGNATURE {
            return Err(HiveError::BadValueSignature(offset));
        }

        let name_length = self.read_i16_at(offset + VK_NAME_LENGTH)?;
        let data_length = self.read_i32_at(offset + VK_DATA_LENGTH)?;
        let data_field: [u8; 4] = self
            .read_bytes_at(offset + VK_DATA, 4)?
            .try_into()
            .unwrap();
        let value_type = ValueType::from_raw(self.read_i32_at(offset + VK_TYPE)?);

        let name = if name_length <= 0 {
            DEFAULT_VALUE_NAME.to_string()
        } else {
            let bytes = self.read_bytes_at(offset + VK_NAME_START, name_length as usize)?;
            String::from_utf8_lossy(bytes).into_owned()
        };

        // Small values are stored inline in the offset field itself; the
        // full 4 bytes are kept regardless of the nominal length.
        let data = if data_length < 5 {
            data_field.to_vec()
        } else {
            let data_offset = i32::from_le_bytes(data_field);
            self.read_bytes_at(self.cell_addr(data_offset), data_length as usize)?
                .to_vec()
        };

        Ok(ValueRecord {
            name,
            data_length,
            value_type,
            data,
        })
    }
}

// ── Tree ─────────────────────────────────────────────────────────────

/// A fully materialized hive tree.
///
/// Built eagerly in a single pass; owns every decoded record, so the
/// underlying file/bytes are released as soon as construction returns.
/// Immutable afterwards and freely shareable.
#[derive(Debug)]
pub struct HiveTree {
    root: NodeRecord,
}

impl HiveTree {
    /// Open a hive file and materialize its whole tree.
    pub fn open(path: impl AsRef<Path>) -> HiveResult<Self> {
        Self::build(HiveReader::open(path)?)
    }

    /// Materialize a tree from an in-memory hive image.
    pub fn from_bytes(bytes: Vec<u8>) -> HiveResult<Self> {
        Self::build(HiveReader::from_bytes(bytes)?)
    }

    fn build(reader: HiveReader) -> HiveResult<Self> {
        let root_cell = reader.read_i32_at(REGF_ROOT_CELL_OFFSET)?;
        let mut visiting = HashSet::new();
        let root = reader.read_node(reader.cell_addr(root_cell), &mut visiting)?;
        debug!(
            "hive: materialized tree, root '{}' with {} children",
            root.name,
            root.children.len()
        );
        Ok(HiveTree { root })
    }

    /// The hive root node.
    pub fn root(&self) -> &NodeRecord {
        &self.root
    }

    /// Walk a backslash-delimited key path from the root. Empty components
    /// are skipped; matching is case-insensitive. `None` on any miss.
    pub fn node_at(&self, path: &str) -> Option<&NodeRecord> {
        let mut node = &self.root;
        for component in path.split('\\').filter(|c| !c.is_empty()) {
            node = node.child(component)?;
        }
        Some(node)
    }

    /// Look up a value by path; the last component is the value name, the
    /// rest the key path. `None` on any miss.
    pub fn value_at(&self, path: &str) -> Option<&ValueRecord> {
        let (key_path, name) = path.rsplit_once('\\').unwrap_or(("", path));
        self.node_at(key_path)?.value(name)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Map the -1 "no cell" sentinel to an absent marker.
fn cell_ref(offset: i32) -> Option<i32> {
    if offset == -1 {
        None
    } else {
        Some(offset)
    }
}

/// Decode a UTF-16LE string from raw bytes, stopping at first null or end.
pub(crate) fn read_utf16le_string(data: &[u8]) -> String {
    let chars: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16_lossy(&chars)
}

// ── Synthetic hive builder (test support) ────────────────────────────

/// Builds minimal in-memory hive images for tests, cell by cell.
#[cfg(test)]
pub(crate) mod testhive {
    use super::BINS_BASE;

    pub struct NkParams {
        pub is_root: bool,
        pub subkey_count: i32,
        pub subkey_index: i32,
        pub value_count: i32,
        pub value_list: i32,
        pub class_name: i32,
        pub class_name_length: i16,
    }

    impl Default for NkParams {
        fn default() -> Self {
            NkParams {
                is_root: false,
                subkey_count: 0,
                subkey_index: -1,
                value_count: 0,
                value_list: -1,
                class_name: -1,
                class_name_length: 0,
            }
        }
    }

    pub struct HiveBuilder {
        data: Vec<u8>,
    }

    impl HiveBuilder {
        pub fn new() -> Self {
            let mut data = vec![0u8; BINS_BASE as usize];
            data[0..4].copy_from_slice(b"regf");
            HiveBuilder { data }
        }

        /// Cell-relative offset the next cell will land at.
        pub fn next_offset(&self) -> i32 {
            (self.data.len() - BINS_BASE as usize) as i32
        }

        /// Append a cell (length prefix + payload), returning its relative
        /// offset. Allocated cells carry a negative length.
        pub fn cell(&mut self, payload: &[u8]) -> i32 {
            let offset = self.next_offset();
            let size = -((payload.len() as i32) + 4);
            self.data.extend_from_slice(&size.to_le_bytes());
            self.data.extend_from_slice(payload);
            offset
        }

        pub fn nk(&mut self, name: &str, params: NkParams) -> i32 {
            let mut p = vec![0u8; 76 + name.len()];
            p[0] = b'n';
            p[1] = b'k';
            p[2] = if params.is_root { 0x2C } else { 0x20 };
            w32(&mut p, 4 + 12, -1); // parent, unused by the decoder
            w32(&mut p, 4 + 16, params.subkey_count);
            w32(&mut p, 4 + 24, params.subkey_index);
            w32(&mut p, 4 + 32, params.value_count);
            w32(&mut p, 4 + 36, params.value_list);
            w32(&mut p, 4 + 40, -1); // security key
            w32(&mut p, 4 + 44, params.class_name);
            w16(&mut p, 4 + 68, name.len() as i16);
            w16(&mut p, 4 + 70, params.class_name_length);
            p[4 + 72..].copy_from_slice(name.as_bytes());
            self.cell(&p)
        }

        /// A key with children reachable through a single lf list.
        pub fn node(&mut self, name: &str, children: &[i32]) -> i32 {
            let index = if children.is_empty() {
                -1
            } else {
                self.lf_list(children)
            };
            self.nk(
                name,
                NkParams {
                    subkey_count: children.len() as i32,
                    subkey_index: index,
                    ..Default::default()
                },
            )
        }

        /// A key with values but no children.
        pub fn node_with_values(&mut self, name: &str, values: &[i32]) -> i32 {
            let list = self.value_list(values);
            self.nk(
                name,
                NkParams {
                    value_count: values.len() as i32,
                    value_list: list,
                    ..Default::default()
                },
            )
        }

        pub fn lf_list(&mut self, children: &[i32]) -> i32 {
            let mut p = Vec::with_capacity(4 + children.len() * 8);
            p.extend_from_slice(b"lf");
            p.extend_from_slice(&(children.len() as i16).to_le_bytes());
            for &child in children {
                p.extend_from_slice(&child.to_le_bytes());
                p.extend_from_slice(&[0u8; 4]); // hash, unused
            }
            self.cell(&p)
        }

        pub fn ri_list(&mut self, lists: &[i32]) -> i32 {
            let mut p = Vec::with_capacity(4 + lists.len() * 4);
            p.extend_from_slice(b"ri");
            p.extend_from_slice(&(lists.len() as i16).to_le_bytes());
            for &list in lists {
                p.extend_from_slice(&list.to_le_bytes());
            }
            self.cell(&p)
        }

        pub fn value_list(&mut self, values: &[i32]) -> i32 {
            let mut p = Vec::with_capacity(values.len() * 4);
            for &value in values {
                p.extend_from_slice(&value.to_le_bytes());
            }
            self.cell(&p)
        }

        /// A VK record with the raw 4-byte data field given verbatim.
        pub fn vk(&mut self, name: &str, data_length: i32, data_field: [u8; 4], value_type: i32) -> i32 {
            let mut p = vec![0u8; 20 + name.len()];
            p[0] = b'v';
            p[1] = b'k';
            w16(&mut p, 2, name.len() as i16);
            w32(&mut p, 4, data_length);
            p[8..12].copy_from_slice(&data_field);
            w32(&mut p, 12, value_type);
            p[20..].copy_from_slice(name.as_bytes());
            self.cell(&p)
        }

        /// A VK record whose data lives in its own cell.
        pub fn vk_with_data(&mut self, name: &str, data: &[u8], value_type: i32) -> i32 {
            let data_cell = self.cell(data);
            self.vk(name, data.len() as i32, data_cell.to_le_bytes(), value_type)
        }

        /// A class name cell holding UTF-16LE text; returns (offset, byte length).
        pub fn class_name(&mut self, text: &str) -> (i32, i16) {
            let mut bytes = Vec::with_capacity(text.len() * 2);
            for ch in text.chars() {
                bytes.push(ch as u8);
                bytes.push(0);
            }
            let len = bytes.len() as i16;
            (self.cell(&bytes), len)
        }

        /// Finalize the image, pointing the header at the root cell.
        pub fn finish(mut self, root: i32) -> Vec<u8> {
            self.data[0x24..0x28].copy_from_slice(&root.to_le_bytes());
            self.data
        }
    }

    fn w16(buf: &mut [u8], at: usize, v: i16) {
        buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn w32(buf: &mut [u8], at: usize, v: i32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

// ── Tests ────────────────────────────────────────────────────────────
