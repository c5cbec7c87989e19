//! Settings URLs and list-view links for a rule

use serde::Serialize;

use crate::constants::{
    ICON_DELETE, ICON_EDIT, LBL_DELETE_RECORD, LBL_EDIT_RECORD, LINK_TYPE_LIST_RECORD, SETTINGS_MODULE,
    SETTINGS_PARENT,
};
use crate::rule::PermissionRule;

/// One action link shown next to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub link_type: String,
    pub label: String,
    pub url: String,
    pub icon: String,
}

impl Link {
    fn list_record(label: &str, url: String, icon: &str) -> Self {
        Link {
            link_type: LINK_TYPE_LIST_RECORD.into(),
            label: label.into(),
            url,
            icon: icon.into(),
        }
    }
}

fn record_param(rule: &PermissionRule) -> String {
    rule.id().map(|id| id.to_string()).unwrap_or_default()
}

impl PermissionRule {
    /// Edit view, optionally at a wizard step
    pub fn edit_view_url(&self, step: Option<u32>) -> String {
        let mode = step.map(|s| format!("&mode=step{}", s)).unwrap_or_default();
        format!(
            "?module={}&parent={}&view=Edit&record={}{}",
            SETTINGS_MODULE,
            SETTINGS_PARENT,
            record_param(self),
            mode
        )
    }

    pub fn delete_action_url(&self) -> String {
        format!(
            "index.php?module={}&parent={}&action=DeleteAjax&record={}",
            SETTINGS_MODULE,
            SETTINGS_PARENT,
            record_param(self)
        )
    }

    pub fn detail_view_url(&self) -> String {
        format!(
            "?module={}&parent={}&view=Detail&record={}",
            SETTINGS_MODULE,
            SETTINGS_PARENT,
            record_param(self)
        )
    }

    /// Edit and delete links for the list view
    pub fn record_links(&self) -> Vec<Link> {
        vec![
            Link::list_record(LBL_EDIT_RECORD, self.edit_view_url(None), ICON_EDIT),
            Link::list_record(LBL_DELETE_RECORD, self.delete_action_url(), ICON_DELETE),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_without_id() {
        let r = PermissionRule::new("draft", 6);
        assert_eq!(r.edit_view_url(None), "?module=AdvancedPermission&parent=Settings&view=Edit&record=");
        assert_eq!(
            r.edit_view_url(Some(2)),
            "?module=AdvancedPermission&parent=Settings&view=Edit&record=&mode=step2"
        );
        assert_eq!(r.detail_view_url(), "?module=AdvancedPermission&parent=Settings&view=Detail&record=");
    }

    #[test]
    fn test_record_links() {
        let links = PermissionRule::new("draft", 6).record_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "LBL_EDIT_RECORD");
        assert_eq!(links[0].icon, "glyphicon glyphicon-pencil");
        assert_eq!(links[1].link_type, "LISTVIEWRECORD");
        assert!(links[1].url.starts_with("index.php?module=AdvancedPermission&parent=Settings&action=DeleteAjax"));
    }
}
