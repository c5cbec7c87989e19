//! Collaborators used to resolve names and members
//!
//! Rules only store ids. Turning them into labels, module names and concrete
//! users goes through these traits, bundled in [`Services`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::member::Member;

/// Role as seen by display code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDetail {
    pub id: String,
    pub name: String,
}

/// Users, groups and roles
pub trait Directory: Send + Sync {
    /// Display label of a user
    fn user_label(&self, id: u64) -> Option<String>;
    /// Untranslated name of a group
    fn group_name(&self, id: u64) -> Option<String>;
    fn role_detail(&self, id: &str) -> Option<RoleDetail>;
    /// Concrete users a member reference stands for
    fn users_by_member(&self, member: &Member) -> Vec<u64>;
}

/// Module (tabid) lookup
pub trait ModuleRegistry: Send + Sync {
    fn module_name(&self, tabid: u64) -> Option<String>;
}

/// Label translation; unknown keys come back unchanged
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Translator that returns every key as is
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translator for NoTranslation {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Everything rule operations need from the outside
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<dyn Directory>,
    pub modules: Arc<dyn ModuleRegistry>,
    pub translator: Arc<dyn Translator>,
}

impl Services {
    pub fn new(
        directory: Arc<dyn Directory>,
        modules: Arc<dyn ModuleRegistry>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Services { directory, modules, translator }
    }

    /// Use one value for all three roles
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: Directory + ModuleRegistry + Translator + 'static,
    {
        Services {
            directory: shared.clone(),
            modules: shared.clone(),
            translator: shared,
        }
    }

    #[inline]
    pub fn translate(&self, key: &str) -> String {
        self.translator.translate(key)
    }
}

/// Expand members to user ids, each id once, in order of first appearance
pub fn users_for_members(directory: &dyn Directory, members: &[Member]) -> Vec<u64> {
    let mut seen = HashSet::new();
    members
        .iter()
        .flat_map(|m| directory.users_by_member(m))
        .filter(|id| seen.insert(*id))
        .collect()
}
