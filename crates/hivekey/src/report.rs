//! Enumeration reports over parsed SAM and SOFTWARE hives.
//!
//! These consume the materialized tree through plain by-name lookups; a
//! missing key yields an empty report, never an error.

use crate::hive::HiveTree;
use serde::Serialize;
use tracing::debug;

/// Key holding one subkey per local account name.
const USER_NAMES_PATH: &str = "SAM\\Domains\\Account\\Users\\Names";

/// Key holding one subkey per installed program.
const UNINSTALL_PATH: &str = "Microsoft\\Windows\\CurrentVersion\\Uninstall";

/// One installed program from the SOFTWARE hive.
#[derive(Debug, Clone, Serialize)]
pub struct SoftwareEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// List local account names from a SAM hive.
pub fn system_users(sam: &HiveTree) -> Vec<String> {
    let Some(names) = sam.node_at(USER_NAMES_PATH) else {
        debug!("report: {} not present", USER_NAMES_PATH);
        return Vec::new();
    };
    names.children.iter().map(|c| c.name.clone()).collect()
}

/// List installed software from a SOFTWARE hive.
pub fn installed_software(software: &HiveTree) -> Vec<SoftwareEntry> {
    let Some(uninstall) = software.node_at(UNINSTALL_PATH) else {
        debug!("report: {} not present", UNINSTALL_PATH);
        return Vec::new();
    };
    uninstall
        .children
        .iter()
        .map(|child| SoftwareEntry {
            name: child.name.clone(),
            version: child.value("DisplayVersion").map(|v| v.as_string()),
            location: child.value("InstallLocation").map(|v| v.as_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hive::testhive::HiveBuilder;

    fn utf16(text: &str) -> Vec<u8> {
        let mut bytes: Vec<u8> = text.bytes().flat_map(|b| [b, 0]).collect();
        bytes.extend([0, 0]);
        bytes
    }

    #[test]
    fn test_system_users() {
        let mut b = HiveBuilder::new();
        let admin = b.node("Administrator", &[]);
        let guest = b.node("Guest", &[]);
        let names = b.node("Names", &[admin, guest]);
        let users = b.node("Users", &[names]);
        let account = b.node("Account", &[users]);
        let domains = b.node("Domains", &[account]);
        let sam = b.node("SAM", &[domains]);
        let root = b.node("ROOT", &[sam]);
        let tree = crate::hive::HiveTree::from_bytes(b.finish(root)).unwrap();

        assert_eq!(system_users(&tree), ["Administrator", "Guest"]);
    }

    #[test]
    fn test_system_users_missing_key_is_empty() {
        let mut b = HiveBuilder::new();
        let root = b.node("ROOT", &[]);
        let tree = crate::hive::HiveTree::from_bytes(b.finish(root)).unwrap();
        assert!(system_users(&tree).is_empty());
    }

    #[test]
    fn test_installed_software() {
        let mut b = HiveBuilder::new();
        let version = b.vk_with_data("DisplayVersion", &utf16("1.2.3"), 1);
        let list = b.value_list(&[version]);
        let app = b.nk(
            "DemoApp",
            crate::hive::testhive::NkParams {
                value_count: 1,
                value_list: list,
                ..Default::default()
            },
        );
        let bare = b.node("BareApp", &[]);
        let uninstall = b.node("Uninstall", &[app, bare]);
        let current = b.node("CurrentVersion", &[uninstall]);
        let windows = b.node("Windows", &[current]);
        let microsoft = b.node("Microsoft", &[windows]);
        let root = b.node("ROOT", &[microsoft]);
        let tree = crate::hive::HiveTree::from_bytes(b.finish(root)).unwrap();

        let entries = installed_software(&tree);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "DemoApp");
        assert_eq!(entries[0].version.as_deref(), Some("1.2.3"));
        assert_eq!(entries[0].location, None);
        assert_eq!(entries[1].name, "BareApp");
        assert_eq!(entries[1].version, None);
    }
}
