//! Table names, lookup tables and link constants

/// Sub-database holding permission rule rows
pub const TABLE_ADV_PERMISSION: &str = "adv_permission";
/// Sub-database holding queued permission recalculations
pub const TABLE_PRIVILEGES_UPDATER: &str = "privileges_updater";
/// Sub-database holding sequences and other bookkeeping
pub const TABLE_META: &str = "meta";

/// Key of the rule id sequence in the meta table
pub const SEQ_ADV_PERMISSION: &str = "seq:adv_permission";

// Status codes
pub const STATUS_ACTIVE: u8 = 0;
pub const STATUS_INACTIVE: u8 = 1;

// Action codes
pub const ACTION_ADD: u8 = 0;
pub const ACTION_REMOVE: u8 = 1;

// Priority codes
pub const PRIORITY_LOW: u8 = 0;
pub const PRIORITY_MEDIUM: u8 = 1;
pub const PRIORITY_HIGH: u8 = 2;

const STATUS: &[(u8, &str)] = &[(STATUS_ACTIVE, "FL_ACTIVE"), (STATUS_INACTIVE, "FL_INACTIVE")];

const ACTION: &[(u8, &str)] = &[(ACTION_ADD, "FL_ACTION_ADD"), (ACTION_REMOVE, "FL_ACTION_REMOVE")];

const PRIORITY: &[(u8, &str)] = &[
    (PRIORITY_LOW, "FL_PRIORITY_LOW"),
    (PRIORITY_MEDIUM, "FL_PRIORITY_MEDIUM"),
    (PRIORITY_HIGH, "FL_PRIORITY_HIGH"),
];

fn lookup(table: &[(u8, &'static str)], code: u8) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, l)| *l)
}

/// Label of a status code, if known
pub fn status_label(code: u8) -> Option<&'static str> {
    lookup(STATUS, code)
}

/// Label of an action code, if known
pub fn action_label(code: u8) -> Option<&'static str> {
    lookup(ACTION, code)
}

/// Label of a priority code, if known
pub fn priority_label(code: u8) -> Option<&'static str> {
    lookup(PRIORITY, code)
}

// Settings module the rules are administered from
pub const SETTINGS_MODULE: &str = "AdvancedPermission";
pub const SETTINGS_PARENT: &str = "Settings";

// Record links
pub const LINK_TYPE_LIST_RECORD: &str = "LISTVIEWRECORD";
pub const LBL_EDIT_RECORD: &str = "LBL_EDIT_RECORD";
pub const LBL_DELETE_RECORD: &str = "LBL_DELETE_RECORD";
pub const ICON_EDIT: &str = "glyphicon glyphicon-pencil";
pub const ICON_DELETE: &str = "glyphicon glyphicon-trash";

// Updater defaults used when a rule changes a module's definitions
pub const UPDATER_MODULE_RECORD: u64 = 0;
pub const UPDATER_DEFAULT_PRIORITY: u8 = 0;
pub const UPDATER_KIND_MODULE: u8 = 1;

/// Maximum depth walked when collecting subordinate roles
pub const MAX_ROLE_DEPTH: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(status_label(STATUS_ACTIVE), Some("FL_ACTIVE"));
        assert_eq!(status_label(STATUS_INACTIVE), Some("FL_INACTIVE"));
        assert_eq!(action_label(ACTION_REMOVE), Some("FL_ACTION_REMOVE"));
        assert_eq!(priority_label(PRIORITY_HIGH), Some("FL_PRIORITY_HIGH"));
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(status_label(7), None);
        assert_eq!(action_label(2), None);
        assert_eq!(priority_label(3), None);
    }
}
