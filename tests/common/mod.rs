//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Once};

use advperm::directory::{GroupEntry, ModuleEntry, RoleEntry, UserEntry};
use advperm::{clear_all, init, test_lock, DirectoryData, Member, Services, StaticDirectory};
use tempfile::TempDir;

static INIT: Once = Once::new();
static mut TEST_DIR: Option<TempDir> = None;

pub const ACCOUNTS: u64 = 6;
pub const HELPDESK: u64 = 13;
pub const UNKNOWN_MODULE: u64 = 999;

fn setup() {
    INIT.call_once(|| {
        let dir = TempDir::new().unwrap();
        init(dir.path().to_str().unwrap()).unwrap();
        unsafe { TEST_DIR = Some(dir); }
    });
}

/// Lock, open the store once per binary and start from empty tables
pub fn setup_clean() -> std::sync::MutexGuard<'static, ()> {
    let lock = test_lock();
    setup();
    clear_all().unwrap();
    lock
}

fn user(id: u64, first: &str, last: &str, role: &str) -> UserEntry {
    UserEntry { id, first_name: first.into(), last_name: last.into(), role: role.into() }
}

fn role(id: &str, name: &str, parent: Option<&str>) -> RoleEntry {
    RoleEntry { id: id.into(), name: name.into(), parent: parent.map(String::from) }
}

/// Board (H1) > Director (H2) > Agent (H3)
pub fn directory() -> StaticDirectory {
    StaticDirectory::new(DirectoryData {
        users: vec![
            user(1, "Olga", "Admin", "H1"),
            user(2, "Marek", "Director", "H2"),
            user(3, "Kasia", "Agent", "H3"),
            user(4, "Tomek", "Agent", "H3"),
        ],
        groups: vec![GroupEntry { id: 20, name: "Support".into(), members: vec![Member::user(3), Member::user(4)] }],
        roles: vec![
            role("H1", "Board", None),
            role("H2", "Director", Some("H1")),
            role("H3", "Agent", Some("H2")),
        ],
        modules: vec![
            ModuleEntry { tabid: ACCOUNTS, name: "Accounts".into() },
            ModuleEntry { tabid: HELPDESK, name: "HelpDesk".into() },
        ],
        translations: [("Groups".to_string(), "Group".to_string())].into_iter().collect(),
    })
}

pub fn services() -> Services {
    Services::from_shared(Arc::new(directory()))
}
