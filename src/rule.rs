//! Advanced permission rule record
//!
//! One row of the `adv_permission` table. Rows are written as JSON with
//! `conditions` and `members` nested as JSON-encoded strings, so the column
//! layout matches the settings table the rules are edited in.
//!
//! Every save and delete reloads the process-wide [`cache`](crate::cache).
//! When the rule carries conditions, the owning module is also queued in the
//! [`updater`](crate::updater) for permission recalculation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache;
use crate::conditions::ConditionGroup;
use crate::constants::{action_label, priority_label, status_label, ACTION_ADD, PRIORITY_LOW, STATUS_ACTIVE};
use crate::db::read;
use crate::error::{AdvPermError, Result};
use crate::member::{Member, MemberKind};
use crate::services::{users_for_members, Directory, Services};
use crate::tx::{decode, transact, Tx};
use crate::updater::UpdaterEntry;

/// Stored form of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRow {
    pub name: String,
    pub tabid: u64,
    pub status: u8,
    pub action: u8,
    pub priority: u8,
    pub conditions: Option<String>,
    pub members: Option<String>,
}

/// Fields that have a display form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Tabid,
    Status,
    Action,
    Priority,
    Conditions,
    Members,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Id,
        Field::Name,
        Field::Tabid,
        Field::Status,
        Field::Action,
        Field::Priority,
        Field::Conditions,
        Field::Members,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Tabid => "tabid",
            Field::Status => "status",
            Field::Action => "action",
            Field::Priority => "priority",
            Field::Conditions => "conditions",
            Field::Members => "members",
        }
    }
}

impl FromStr for Field {
    type Err = AdvPermError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| AdvPermError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access-control rule for one module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRule {
    id: Option<u64>,
    pub name: String,
    pub tabid: u64,
    pub status: u8,
    pub action: u8,
    pub priority: u8,
    pub conditions: Option<ConditionGroup>,
    pub members: Vec<Member>,
}

impl PermissionRule {
    /// A new, unsaved rule: active, adding access, low priority, no members
    pub fn new(name: impl Into<String>, tabid: u64) -> Self {
        PermissionRule {
            id: None,
            name: name.into(),
            tabid,
            status: STATUS_ACTIVE,
            action: ACTION_ADD,
            priority: PRIORITY_LOW,
            conditions: None,
            members: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load a rule by id; `None` if there is no such row
    pub fn get_instance(id: u64) -> Result<Option<Self>> {
        read(|d, tx| match d.rules.get(tx, &id)? {
            Some(json) => Ok(Some(Self::from_row(id, decode(json)?)?)),
            None => Ok(None),
        })
    }

    /// All stored rules, ordered by id
    pub fn all() -> Result<Vec<Self>> {
        read(|d, tx| {
            let mut r = Vec::new();
            for item in d.rules.iter(tx)? {
                let (id, json) = item?;
                r.push(Self::from_row(id, decode(json)?)?);
            }
            Ok(r)
        })
    }

    /// Stored rules governing one module
    pub fn for_module(tabid: u64) -> Result<Vec<Self>> {
        Ok(Self::all()?.into_iter().filter(|r| r.tabid == tabid).collect())
    }

    /// Rules that decode; undecodable rows are logged and skipped
    pub(crate) fn all_decodable() -> Result<Vec<Self>> {
        read(|d, tx| {
            let mut r = Vec::new();
            for item in d.rules.iter(tx)? {
                let (id, json) = item?;
                match decode(json).and_then(|row| Self::from_row(id, row)) {
                    Ok(rule) => r.push(rule),
                    Err(e) => tracing::warn!(id, error = %e, "skipping undecodable permission rule"),
                }
            }
            Ok(r)
        })
    }

    /// Insert (no id yet) or update the row
    ///
    /// The row and its updater entry are written in one transaction. The
    /// cache reload that follows cannot fail the save.
    pub fn save(&mut self, services: &Services) -> Result<()> {
        let row = self.to_row()?;
        let entry = self.updater_entry(services);
        match self.id {
            None => {
                let id = transact(|tx| {
                    let id = tx.insert_rule(&row)?;
                    queue(tx, entry.as_ref())?;
                    Ok(id)
                })?;
                self.id = Some(id);
                tracing::info!(id, tabid = self.tabid, "permission rule created");
            }
            Some(id) => {
                let updated = transact(|tx| {
                    if !tx.update_rule(id, &row)? {
                        return Ok(false);
                    }
                    queue(tx, entry.as_ref())?;
                    Ok(true)
                })?;
                if !updated {
                    return Err(AdvPermError::RuleNotFound(id));
                }
                tracing::info!(id, tabid = self.tabid, "permission rule updated");
            }
        }
        refresh_cache(services);
        Ok(())
    }

    /// Remove the row; returns whether one was removed
    pub fn delete(&self, services: &Services) -> Result<bool> {
        let entry = self.updater_entry(services);
        let removed = transact(|tx| {
            let removed = match self.id {
                Some(id) => tx.delete_rule(id)?,
                None => false,
            };
            queue(tx, entry.as_ref())?;
            Ok(removed)
        })?;
        tracing::info!(id = ?self.id, removed, "permission rule deleted");
        refresh_cache(services);
        Ok(removed)
    }

    /// Recalculation to queue with a write: only rules with conditions
    fn updater_entry(&self, services: &Services) -> Option<UpdaterEntry> {
        self.conditions.as_ref()?;
        match services.modules.module_name(self.tabid) {
            Some(module) => Some(UpdaterEntry::for_module(&module)),
            None => {
                tracing::warn!(tabid = self.tabid, "no module for tabid, updater not queued");
                None
            }
        }
    }

    /// Human-readable form of a stored value
    pub fn display_value(&self, field: Field, services: &Services) -> String {
        match field {
            Field::Id => self.id.map(|id| id.to_string()).unwrap_or_default(),
            Field::Name => self.name.clone(),
            Field::Tabid => services.modules.module_name(self.tabid).unwrap_or_default(),
            Field::Status => code_label(self.status, status_label),
            Field::Action => code_label(self.action, action_label),
            Field::Priority => code_label(self.priority, priority_label),
            Field::Conditions => self
                .conditions
                .as_ref()
                .and_then(|c| serde_json::to_string(c).ok())
                .unwrap_or_default(),
            Field::Members => self
                .members
                .iter()
                .map(|m| format!("{}: {}", services.translate(m.kind.as_str()), member_name(m, services)))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Users the members resolve to, each once, with their labels
    pub fn user_by_member(&self, directory: &dyn Directory) -> Vec<(u64, String)> {
        users_for_members(directory, &self.members)
            .into_iter()
            .map(|id| (id, directory.user_label(id).unwrap_or_default()))
            .collect()
    }

    fn to_row(&self) -> Result<RuleRow> {
        Ok(RuleRow {
            name: self.name.clone(),
            tabid: self.tabid,
            status: self.status,
            action: self.action,
            priority: self.priority,
            conditions: Some(serde_json::to_string(&self.conditions)?),
            members: Some(serde_json::to_string(&self.members)?),
        })
    }

    fn from_row(id: u64, row: RuleRow) -> Result<Self> {
        let conditions = match row.conditions.as_deref() {
            Some(json) if !json.is_empty() => decode::<Option<ConditionGroup>>(json)?,
            _ => None,
        };
        let members = match row.members.as_deref() {
            Some(json) if !json.is_empty() => decode::<Option<Vec<Member>>>(json)?.unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(PermissionRule {
            id: Some(id),
            name: row.name,
            tabid: row.tabid,
            status: row.status,
            action: row.action,
            priority: row.priority,
            conditions,
            members,
        })
    }
}

fn queue(tx: &mut Tx, entry: Option<&UpdaterEntry>) -> Result<()> {
    if let Some(entry) = entry {
        if tx.queue_updater(entry)? {
            tracing::info!(module = %entry.module, "permission recalculation queued");
        }
    }
    Ok(())
}

/// The write is committed by now; a failed reload drops the snapshot
fn refresh_cache(services: &Services) {
    if let Err(e) = cache::reload(services.directory.as_ref()) {
        tracing::error!(error = %e, "permission cache reload failed, snapshot dropped");
        cache::clear();
    }
}

fn code_label(code: u8, table: fn(u8) -> Option<&'static str>) -> String {
    table(code).map(str::to_string).unwrap_or_else(|| code.to_string())
}

fn member_name(member: &Member, services: &Services) -> String {
    let dir = services.directory.as_ref();
    match member.kind {
        MemberKind::Users => member
            .numeric_id()
            .and_then(|id| dir.user_label(id))
            .unwrap_or_default(),
        MemberKind::Groups => member
            .numeric_id()
            .and_then(|id| dir.group_name(id))
            .map(|n| services.translate(&n))
            .unwrap_or_default(),
        // Both role kinds show the role itself
        MemberKind::Roles | MemberKind::RoleAndSubordinates => dir
            .role_detail(&member.id)
            .map(|r| services.translate(&r.name))
            .unwrap_or_default(),
    }
}
