//! Filter expressions attached to a rule
//!
//! Stored in the query-builder shape: a group has a glue (`AND`/`OR`) and a
//! list of children, each either a field comparison or a nested group.
//! Unknown keys written by the editor (`id`, `type`, `input`, ...) are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Glue {
    And,
    Or,
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Group node; also the root of every rule's conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub condition: Glue,
    #[serde(default)]
    pub rules: Vec<ConditionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Condition(Condition),
}

impl ConditionGroup {
    pub fn new(condition: Glue) -> Self {
        ConditionGroup { condition, rules: Vec::new() }
    }

    /// Add a field comparison
    pub fn with(mut self, field: &str, operator: &str, value: impl Into<serde_json::Value>) -> Self {
        self.rules.push(ConditionNode::Condition(Condition {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }));
        self
    }

    /// Add a nested group
    pub fn with_group(mut self, group: ConditionGroup) -> Self {
        self.rules.push(ConditionNode::Group(group));
        self
    }

    /// Every field referenced anywhere in the tree, in order of appearance
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        for node in &self.rules {
            match node {
                ConditionNode::Condition(c) => out.push(&c.field),
                ConditionNode::Group(g) => g.collect_fields(out),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
