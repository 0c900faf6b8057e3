//! Boot key (SysKey) recovery from a parsed SYSTEM hive.
//!
//! The boot key is 16 bytes hidden in the class names of four registry keys
//! under `ControlSet00N\Control\Lsa` (JD, Skew1, GBG, Data). Each class name
//! stores hex digits in UTF-16-like slots, one meaningful byte per character;
//! the digits concatenate to a 32-character "scrambled key" that is decoded
//! and run through a fixed byte permutation.

use crate::error::{HiveError, HiveResult};
use crate::hive::HiveTree;
use tracing::debug;

/// The fixed permutation applied to the descrambled key material.
pub const BOOT_KEY_PERMUTATION: [usize; 16] = [
    0x08, 0x05, 0x04, 0x02, 0x0B, 0x09, 0x0D, 0x03,
    0x00, 0x06, 0x01, 0x0C, 0x0E, 0x0A, 0x0F, 0x07,
];

/// Lsa subkey names whose class names form the key material, in fixed order.
pub const LSA_KEY_NAMES: [&str; 4] = ["JD", "Skew1", "GBG", "Data"];

/// Hex digits contributed by each Lsa subkey's class name.
const DIGITS_PER_SUBKEY: usize = 8;

/// Extract the boot key from a materialized SYSTEM hive tree.
///
/// Resolves the active control set from `Select\Default`, collects the four
/// Lsa class names, and descrambles them. Fails with
/// [`HiveError::BadBootKeyMaterial`] when any lookup misses or the class
/// names do not form 32 hex digits.
pub fn extract(tree: &HiveTree) -> HiveResult<[u8; 16]> {
    let select = tree
        .value_at("Select\\Default")
        .ok_or_else(|| material_err("Select\\Default value not found"))?;
    let control_set = select
        .as_u32()
        .ok_or_else(|| material_err("Select\\Default data too short"))?;

    let lsa_path = format!("ControlSet{:03}\\Control\\Lsa", control_set);
    debug!("bootkey: using {}", lsa_path);

    let mut class_names = Vec::with_capacity(LSA_KEY_NAMES.len());
    for name in LSA_KEY_NAMES {
        let node = tree
            .node_at(&format!("{}\\{}", lsa_path, name))
            .ok_or_else(|| material_err(&format!("Lsa subkey '{}' not found", name)))?;
        if node.class_name.is_empty() {
            return Err(material_err(&format!("Lsa subkey '{}' has no class name", name)));
        }
        class_names.push(node.class_name.as_slice());
    }

    descramble([class_names[0], class_names[1], class_names[2], class_names[3]])
}

/// Descramble four Lsa class-name buffers (order: JD, Skew1, GBG, Data)
/// into the 16-byte boot key.
///
/// Pure and deterministic: no I/O, identical inputs give identical output.
pub fn descramble(class_names: [&[u8]; 4]) -> HiveResult<[u8; 16]> {
    // Keep the even-indexed byte of up to 8 byte-pairs per class name.
    let mut scrambled = Vec::with_capacity(32);
    for buffer in class_names {
        for i in 0..DIGITS_PER_SUBKEY {
            match buffer.get(i * 2) {
                Some(&b) => scrambled.push(b),
                None => break,
            }
        }
    }

    if scrambled.len() != 32 {
        return Err(material_err(&format!(
            "expected 32 hex digits of key material, got {}",
            scrambled.len()
        )));
    }

    let mut raw = [0u8; 16];
    for (i, pair) in scrambled.chunks_exact(2).enumerate() {
        let hi = hex_digit(pair[0])
            .ok_or_else(|| material_err(&format!("non-hex key material at digit {}", i * 2)))?;
        let lo = hex_digit(pair[1])
            .ok_or_else(|| material_err(&format!("non-hex key material at digit {}", i * 2 + 1)))?;
        raw[i] = (hi << 4) | lo;
    }

    let mut boot_key = [0u8; 16];
    for (i, &from) in BOOT_KEY_PERMUTATION.iter().enumerate() {
        boot_key[i] = raw[from];
    }
    Ok(boot_key)
}

fn material_err(msg: &str) -> HiveError {
    HiveError::BadBootKeyMaterial(msg.to_string())
}

// ── Hex helpers ──────────────────────────────────────────────────────

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Encode bytes as a lowercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

// ── Tests ────────────────────────────────────────────────────────────
