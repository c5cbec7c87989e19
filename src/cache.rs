//! Process-wide advanced permission cache
//!
//! A snapshot of the active rules, grouped per module, ordered by priority
//! (highest first) then id, with members already expanded to user ids.
//! [`reload`] rebuilds the snapshot from the store and swaps it in whole.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;

use crate::conditions::ConditionGroup;
use crate::constants::STATUS_ACTIVE;
use crate::error::Result;
use crate::rule::PermissionRule;
use crate::services::{users_for_members, Directory};

/// A rule as seen by access checks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedRule {
    pub id: u64,
    pub action: u8,
    pub priority: u8,
    pub conditions: Option<ConditionGroup>,
    pub users: BTreeSet<u64>,
}

type Snapshot = HashMap<u64, Vec<CachedRule>>;

static CACHE: RwLock<Option<Arc<Snapshot>>> = RwLock::new(None);
static GENERATION: AtomicU64 = AtomicU64::new(0);
/// Held from the store read to the swap, so the last swap saw the last commit
static RELOAD_LOCK: Mutex<()> = Mutex::new(());

fn snapshot() -> Option<Arc<Snapshot>> {
    CACHE.read().unwrap_or_else(|p| p.into_inner()).clone()
}

fn replace(next: Option<Arc<Snapshot>>) {
    *CACHE.write().unwrap_or_else(|p| p.into_inner()) = next;
    GENERATION.fetch_add(1, Ordering::SeqCst);
}

/// Rebuild the snapshot from the stored rules
///
/// Reloads are serialized. Rows that fail to decode are skipped.
pub fn reload(directory: &dyn Directory) -> Result<()> {
    let _guard = RELOAD_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    let mut next: Snapshot = HashMap::new();
    for rule in PermissionRule::all_decodable()? {
        let Some(id) = rule.id() else { continue };
        if rule.status != STATUS_ACTIVE {
            continue;
        }
        next.entry(rule.tabid).or_default().push(CachedRule {
            id,
            action: rule.action,
            priority: rule.priority,
            users: users_for_members(directory, &rule.members).into_iter().collect(),
            conditions: rule.conditions,
        });
    }
    for rules in next.values_mut() {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
    }
    let modules = next.len();
    replace(Some(Arc::new(next)));
    tracing::debug!(modules, generation = generation(), "advanced permission cache reloaded");
    Ok(())
}

/// Drop the snapshot
pub fn clear() {
    replace(None);
}

pub fn is_loaded() -> bool {
    snapshot().is_some()
}

/// Bumped on every reload or clear
pub fn generation() -> u64 {
    GENERATION.load(Ordering::SeqCst)
}

/// Active rules of a module
pub fn rules_for_module(tabid: u64) -> Vec<CachedRule> {
    snapshot()
        .and_then(|s| s.get(&tabid).cloned())
        .unwrap_or_default()
}

/// Active rules of a module that apply to a user
pub fn rules_for_user(tabid: u64, user_id: u64) -> Vec<CachedRule> {
    rules_for_module(tabid)
        .into_iter()
        .filter(|r| r.users.contains(&user_id))
        .collect()
}
