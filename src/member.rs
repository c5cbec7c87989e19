//! Member references: `"type:id"` pairs naming users, groups or roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AdvPermError;

/// Kind of a member reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    Users,
    Groups,
    Roles,
    RoleAndSubordinates,
}

impl MemberKind {
    pub const ALL: [MemberKind; 4] = [
        MemberKind::Users,
        MemberKind::Groups,
        MemberKind::Roles,
        MemberKind::RoleAndSubordinates,
    ];

    /// Name used in stored references and as translation key
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Users => "Users",
            MemberKind::Groups => "Groups",
            MemberKind::Roles => "Roles",
            MemberKind::RoleAndSubordinates => "RoleAndSubordinates",
        }
    }
}

impl FromStr for MemberKind {
    type Err = AdvPermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemberKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AdvPermError::InvalidMember(s.to_string()))
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member of a rule, e.g. `Users:5` or `Roles:H3`
///
/// Ids stay strings: users and groups are numeric, roles are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Member {
    pub kind: MemberKind,
    pub id: String,
}

impl Member {
    pub fn new(kind: MemberKind, id: impl Into<String>) -> Self {
        Member { kind, id: id.into() }
    }

    pub fn user(id: u64) -> Self {
        Member::new(MemberKind::Users, id.to_string())
    }

    pub fn group(id: u64) -> Self {
        Member::new(MemberKind::Groups, id.to_string())
    }

    pub fn role(id: impl Into<String>) -> Self {
        Member::new(MemberKind::Roles, id)
    }

    pub fn role_and_subordinates(id: impl Into<String>) -> Self {
        Member::new(MemberKind::RoleAndSubordinates, id)
    }

    /// Numeric id, for users and groups
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

impl FromStr for Member {
    type Err = AdvPermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| AdvPermError::InvalidMember(s.to_string()))?;
        if id.is_empty() {
            return Err(AdvPermError::InvalidMember(s.to_string()));
        }
        let kind: MemberKind = kind.parse()?;
        // Users and groups are keyed by number, roles by code
        if matches!(kind, MemberKind::Users | MemberKind::Groups) && id.parse::<u64>().is_err() {
            return Err(AdvPermError::InvalidMember(s.to_string()));
        }
        Ok(Member { kind, id: id.to_string() })
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl Serialize for Member {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Member {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
