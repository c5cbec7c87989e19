//! advperm - Advanced permission rules for CRM modules
//!
//! Rules grant or remove access to a module's records for a set of members
//! (users, groups, roles, role trees) under optional conditions. This crate
//! stores them in LMDB, formats them for display, resolves members to users
//! and keeps the process-wide permission cache and recalculation queue in
//! step with every write.

pub mod cache;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod db;
pub mod directory;
pub mod error;
pub mod links;
pub mod member;
pub mod rule;
pub mod services;
pub mod tx;
pub mod updater;
pub mod view;

#[cfg(feature = "server")]
pub mod server;

pub use conditions::{Condition, ConditionGroup, ConditionNode, Glue};
pub use config::Config;
pub use constants::*;
pub use db::{clear_all, init, init_with, test_lock};
pub use directory::{DirectoryData, StaticDirectory};
pub use error::{AdvPermError, Result};
pub use links::Link;
pub use member::{Member, MemberKind};
pub use rule::{Field, PermissionRule};
pub use services::{Directory, ModuleRegistry, NoTranslation, RoleDetail, Services, Translator};
pub use tx::{transact, Tx};
pub use view::{CheckConfigView, ConfigCheck, MailSettingsCheck, Request, View};
