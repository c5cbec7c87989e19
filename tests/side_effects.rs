//! Cache reloads and updater notifications triggered by rule writes

mod common;

use advperm::{cache, updater, ConditionGroup, Glue, Member, PermissionRule, PRIORITY_HIGH, STATUS_INACTIVE};
use common::{services, setup_clean, ACCOUNTS, HELPDESK, UNKNOWN_MODULE};

fn conditions() -> ConditionGroup {
    ConditionGroup::new(Glue::And).with("industry", "equal", "Banking")
}

#[test]
fn save_and_delete_reload_cache() {
    let _lock = setup_clean();
    let s = services();

    let before = cache::generation();
    let mut rule = PermissionRule::new("plain", ACCOUNTS);
    rule.save(&s).unwrap();
    let after_save = cache::generation();
    assert!(after_save > before);
    assert!(cache::is_loaded());

    rule.delete(&s).unwrap();
    assert!(cache::generation() > after_save);
}

#[test]
fn conditions_queue_module_update() {
    let _lock = setup_clean();
    let s = services();

    let mut rule = PermissionRule::new("conditional", ACCOUNTS);
    rule.conditions = Some(conditions());
    rule.save(&s).unwrap();

    let pending = updater::pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].module, "Accounts");
    assert_eq!(pending[0].record, 0);
    assert_eq!(pending[0].kind, 1);
}

#[test]
fn no_conditions_no_update() {
    let _lock = setup_clean();
    let s = services();

    let mut rule = PermissionRule::new("unconditional", ACCOUNTS);
    rule.members = vec![Member::user(1)];
    rule.save(&s).unwrap();
    rule.delete(&s).unwrap();
    assert!(updater::pending().unwrap().is_empty());
}

#[test]
fn delete_with_conditions_queues_update() {
    let _lock = setup_clean();
    let s = services();

    let mut rule = PermissionRule::new("conditional", HELPDESK);
    rule.conditions = Some(conditions());
    rule.save(&s).unwrap();
    assert!(updater::remove("HelpDesk", 0).unwrap());
    assert!(!updater::is_pending("HelpDesk").unwrap());

    rule.delete(&s).unwrap();
    assert!(updater::is_pending("HelpDesk").unwrap());
}

#[test]
fn updater_queues_each_module_once() {
    let _lock = setup_clean();
    let s = services();

    for name in ["first", "second"] {
        let mut rule = PermissionRule::new(name, ACCOUNTS);
        rule.conditions = Some(conditions());
        rule.save(&s).unwrap();
    }
    assert_eq!(updater::pending().unwrap().len(), 1);
    // Same key as the entry queued by the saves
    assert!(!updater::set_module_updater("Accounts").unwrap());
    assert!(updater::set_module_updater("HelpDesk").unwrap());
    assert!(updater::remove("HelpDesk", 0).unwrap());

    assert!(updater::set_updater("Accounts", 15, 2, 0).unwrap());
    assert!(!updater::set_updater("Accounts", 15, 2, 0).unwrap());
    let pending = updater::pending().unwrap();
    assert_eq!(pending.len(), 2);
    // Highest priority first
    assert_eq!(pending[0].record, 15);

    updater::clear().unwrap();
    assert!(updater::pending().unwrap().is_empty());
}

#[test]
fn unknown_module_is_not_queued() {
    let _lock = setup_clean();
    let s = services();

    let mut rule = PermissionRule::new("orphan", UNKNOWN_MODULE);
    rule.conditions = Some(conditions());
    rule.save(&s).unwrap();
    assert!(updater::pending().unwrap().is_empty());
}

#[test]
fn cache_holds_active_rules_by_priority() {
    let _lock = setup_clean();
    let s = services();

    let mut low = PermissionRule::new("low", ACCOUNTS);
    low.members = vec![Member::group(20)];
    low.save(&s).unwrap();

    let mut high = PermissionRule::new("high", ACCOUNTS);
    high.priority = PRIORITY_HIGH;
    high.members = vec![Member::role("H2")];
    high.conditions = Some(conditions());
    high.save(&s).unwrap();

    let mut off = PermissionRule::new("off", ACCOUNTS);
    off.status = STATUS_INACTIVE;
    off.members = vec![Member::user(3)];
    off.save(&s).unwrap();

    let mut other = PermissionRule::new("other", HELPDESK);
    other.members = vec![Member::user(1)];
    other.save(&s).unwrap();

    let rules = cache::rules_for_module(ACCOUNTS);
    let ids: Vec<u64> = rules.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![high.id().unwrap(), low.id().unwrap()]);
    assert_eq!(rules[0].conditions, Some(conditions()));
    assert_eq!(rules[1].users.iter().copied().collect::<Vec<_>>(), vec![3, 4]);

    let for_agent: Vec<u64> = cache::rules_for_user(ACCOUNTS, 3).iter().map(|r| r.id).collect();
    assert_eq!(for_agent, vec![low.id().unwrap()]);
    assert_eq!(cache::rules_for_user(ACCOUNTS, 2).len(), 1);
    assert_eq!(cache::rules_for_module(HELPDESK).len(), 1);
}

#[test]
fn deleted_rule_leaves_cache() {
    let _lock = setup_clean();
    let s = services();

    let mut rule = PermissionRule::new("short lived", HELPDESK);
    rule.members = vec![Member::user(4)];
    rule.save(&s).unwrap();
    assert_eq!(cache::rules_for_user(HELPDESK, 4).len(), 1);

    rule.delete(&s).unwrap();
    assert!(cache::rules_for_module(HELPDESK).is_empty());
}

#[test]
fn clear_drops_snapshot() {
    let _lock = setup_clean();
    let s = services();

    PermissionRule::new("any", ACCOUNTS).save(&s).unwrap();
    cache::clear();
    assert!(!cache::is_loaded());
    assert!(cache::rules_for_module(ACCOUNTS).is_empty());

    cache::reload(s.directory.as_ref()).unwrap();
    assert_eq!(cache::rules_for_module(ACCOUNTS).len(), 1);
}

#[test]
fn concurrent_saves_all_reach_cache() {
    let _lock = setup_clean();
    let s = services();

    for round in 0..5 {
        std::thread::scope(|scope| {
            for n in 0..8 {
                let s = &s;
                scope.spawn(move || {
                    let mut rule = PermissionRule::new(format!("round {} rule {}", round, n), ACCOUNTS);
                    rule.members = vec![Member::user(1)];
                    rule.save(s).unwrap();
                });
            }
        });
        let stored = PermissionRule::all().unwrap().len();
        assert_eq!(stored, (round + 1) * 8);
        assert_eq!(cache::rules_for_module(ACCOUNTS).len(), stored);
    }
}

#[test]
fn undecodable_row_does_not_fail_save() {
    let _lock = setup_clean();
    let s = services();

    let env = advperm::db::env().unwrap();
    let mut wtxn = env.write_txn().unwrap();
    advperm::db::dbs()
        .unwrap()
        .rules
        .put(
            &mut wtxn,
            &999,
            r#"{"name":"broken","tabid":6,"status":0,"action":0,"priority":0,"conditions":null,"members":"[\"Teams:1\"]"}"#,
        )
        .unwrap();
    wtxn.commit().unwrap();

    let mut rule = PermissionRule::new("after broken row", ACCOUNTS);
    rule.conditions = Some(conditions());
    rule.save(&s).unwrap();

    let id = rule.id().unwrap();
    assert!(PermissionRule::get_instance(id).unwrap().is_some());
    assert!(updater::is_pending("Accounts").unwrap());
    let cached: Vec<u64> = cache::rules_for_module(ACCOUNTS).iter().map(|r| r.id).collect();
    assert_eq!(cached, vec![id]);

    assert!(rule.delete(&s).unwrap());
    assert!(cache::rules_for_module(ACCOUNTS).is_empty());
}
