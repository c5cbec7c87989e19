//! In-memory directory of users, groups, roles and modules
//!
//! Loaded from JSON (see `ADVPERM_DIRECTORY`) or built in code. Implements
//! [`Directory`], [`ModuleRegistry`] and [`Translator`] so a single value can
//! back [`Services`](crate::services::Services).

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ROLE_DEPTH;
use crate::error::Result;
use crate::member::{Member, MemberKind};
use crate::services::{Directory, ModuleRegistry, RoleDetail, Translator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: String,
}

impl UserEntry {
    fn label(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub id: u64,
    pub name: String,
    /// Users, roles, role trees or other groups
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub tabid: u64,
    pub name: String,
}

/// Serialized form of a directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryData {
    #[serde(default)]
    pub users: Vec<UserEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

/// Indexed, read-only directory
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: HashMap<u64, UserEntry>,
    groups: HashMap<u64, GroupEntry>,
    roles: HashMap<String, RoleEntry>,
    modules: HashMap<u64, String>,
    translations: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new(data: DirectoryData) -> Self {
        StaticDirectory {
            users: data.users.into_iter().map(|u| (u.id, u)).collect(),
            groups: data.groups.into_iter().map(|g| (g.id, g)).collect(),
            roles: data.roles.into_iter().map(|r| (r.id.clone(), r)).collect(),
            modules: data.modules.into_iter().map(|m| (m.tabid, m.name)).collect(),
            translations: data.translations,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// True when `role` is `ancestor` or sits below it
    fn is_within(&self, role: &str, ancestor: &str) -> bool {
        let mut cur = Some(role);
        for _ in 0..MAX_ROLE_DEPTH {
            match cur {
                Some(r) if r == ancestor => return true,
                Some(r) => cur = self.roles.get(r).and_then(|e| e.parent.as_deref()),
                None => return false,
            }
        }
        tracing::warn!(role, ancestor, max_depth = MAX_ROLE_DEPTH, "role hierarchy too deep, subordinates cut off");
        false
    }

    fn users_where<F: Fn(&UserEntry) -> bool>(&self, pred: F) -> BTreeSet<u64> {
        self.users.values().filter(|u| pred(u)).map(|u| u.id).collect()
    }

    fn expand(&self, member: &Member, visited: &mut HashSet<u64>) -> BTreeSet<u64> {
        match member.kind {
            MemberKind::Users => member.numeric_id().into_iter().collect(),
            MemberKind::Roles => self.users_where(|u| u.role == member.id),
            MemberKind::RoleAndSubordinates => self.users_where(|u| self.is_within(&u.role, &member.id)),
            MemberKind::Groups => {
                let Some(group) = member.numeric_id().and_then(|id| self.groups.get(&id)) else {
                    return BTreeSet::new();
                };
                if !visited.insert(group.id) {
                    return BTreeSet::new();
                }
                group.members.iter().flat_map(|m| self.expand(m, visited)).collect()
            }
        }
    }
}

impl Directory for StaticDirectory {
    fn user_label(&self, id: u64) -> Option<String> {
        self.users.get(&id).map(UserEntry::label)
    }

    fn group_name(&self, id: u64) -> Option<String> {
        self.groups.get(&id).map(|g| g.name.clone())
    }

    fn role_detail(&self, id: &str) -> Option<RoleDetail> {
        self.roles.get(id).map(|r| RoleDetail {
            id: r.id.clone(),
            name: r.name.clone(),
        })
    }

    fn users_by_member(&self, member: &Member) -> Vec<u64> {
        self.expand(member, &mut HashSet::new()).into_iter().collect()
    }
}

impl ModuleRegistry for StaticDirectory {
    fn module_name(&self, tabid: u64) -> Option<String> {
        self.modules.get(&tabid).cloned()
    }
}

impl Translator for StaticDirectory {
    fn translate(&self, key: &str) -> String {
        self.translations.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small company: H1 (CEO) > H2 (Sales Manager) > H3 (Sales), H1 > H4 (Support)
    pub(crate) fn sample() -> StaticDirectory {
        StaticDirectory::from_json(
            r#"{
                "users": [
                    {"id": 1, "first_name": "Anna", "last_name": "Nowak", "role": "H1"},
                    {"id": 2, "first_name": "Piotr", "last_name": "Kowalski", "role": "H2"},
                    {"id": 3, "first_name": "Ewa", "last_name": "Lis", "role": "H3"},
                    {"id": 4, "first_name": "Jan", "last_name": "Wolny", "role": "H3"},
                    {"id": 5, "last_name": "Support", "role": "H4"}
                ],
                "groups": [
                    {"id": 10, "name": "Team Selling", "members": ["Users:2", "Roles:H3"]},
                    {"id": 11, "name": "Everyone", "members": ["Groups:10", "Roles:H4", "Groups:11"]}
                ],
                "roles": [
                    {"id": "H1", "name": "CEO"},
                    {"id": "H2", "name": "Sales Manager", "parent": "H1"},
                    {"id": "H3", "name": "Sales Person", "parent": "H2"},
                    {"id": "H4", "name": "Support", "parent": "H1"}
                ],
                "modules": [
                    {"tabid": 6, "name": "Accounts"},
                    {"tabid": 9, "name": "HelpDesk"}
                ],
                "translations": {
                    "Users": "User",
                    "Roles": "Role",
                    "Sales Manager": "Kierownik sprzedaży"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_labels() {
        let d = sample();
        assert_eq!(d.user_label(1).as_deref(), Some("Anna Nowak"));
        assert_eq!(d.user_label(5).as_deref(), Some("Support"));
        assert_eq!(d.user_label(99), None);
        assert_eq!(d.group_name(10).as_deref(), Some("Team Selling"));
        assert_eq!(d.role_detail("H3").unwrap().name, "Sales Person");
        assert_eq!(d.module_name(9).as_deref(), Some("HelpDesk"));
    }

    #[test]
    fn test_role_members() {
        let d = sample();
        assert_eq!(d.users_by_member(&Member::role("H3")), vec![3, 4]);
        assert_eq!(d.users_by_member(&Member::role_and_subordinates("H2")), vec![2, 3, 4]);
        assert_eq!(d.users_by_member(&Member::role_and_subordinates("H1")), vec![1, 2, 3, 4, 5]);
        assert!(d.users_by_member(&Member::role("H9")).is_empty());
    }

    #[test]
    fn test_group_members_nested_and_cyclic() {
        let d = sample();
        assert_eq!(d.users_by_member(&Member::group(10)), vec![2, 3, 4]);
        // Group 11 contains itself
        assert_eq!(d.users_by_member(&Member::group(11)), vec![2, 3, 4, 5]);
        assert!(d.users_by_member(&Member::group(404)).is_empty());
    }

    #[test]
    fn test_role_tree_depth_limit() {
        // R0 > R1 > ... > R39, one user per role
        let roles = (0..40)
            .map(|i| RoleEntry {
                id: format!("R{}", i),
                name: format!("Level {}", i),
                parent: (i > 0).then(|| format!("R{}", i - 1)),
            })
            .collect();
        let users = (0..40)
            .map(|i| UserEntry { id: i, first_name: String::new(), last_name: format!("L{}", i), role: format!("R{}", i) })
            .collect();
        let d = StaticDirectory::new(DirectoryData { users, roles, ..Default::default() });

        let users = d.users_by_member(&Member::role_and_subordinates("R0"));
        assert_eq!(users, (0..MAX_ROLE_DEPTH as u64).collect::<Vec<_>>());
        // Within the limit from a lower root
        assert_eq!(d.users_by_member(&Member::role_and_subordinates("R20")), (20..40).collect::<Vec<u64>>());
    }

    #[test]
    fn test_translation_fallback() {
        let d = sample();
        assert_eq!(d.translate("Roles"), "Role");
        assert_eq!(d.translate("Groups"), "Groups");
    }
}
