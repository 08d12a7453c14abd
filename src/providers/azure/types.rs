use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::url_utils::child_id_from_url;

pub const FIELD_STATE: &str = "System.State";
pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_EFFORT: &str = "Microsoft.VSTS.Scheduling.Effort";
pub const FIELD_STORY_POINTS: &str = "Microsoft.VSTS.Scheduling.StoryPoints";

pub const HIERARCHY_FORWARD: &str = "System.LinkTypes.Hierarchy-Forward";

const NOT_AVAILABLE: &str = "N/A";

/// The `fields` bag of a work item. Any field may be missing, so every read
/// goes through a get-or-default accessor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WorkItemFields(Map<String, Value>);

impl WorkItemFields {
    /// Strings are used as-is, other JSON values by their JSON text, absent fields as "N/A".
    pub fn text_or_na(&self, name: &str) -> String {
        match self.0.get(name) {
            None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Numbers and numeric strings; anything else reads as 0.
    pub fn number_or_zero(&self, name: &str) -> f64 {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub rel: String,
    pub url: Option<String>,
}

impl Relation {
    pub fn is_hierarchy_forward(&self) -> bool {
        self.rel == HIERARCHY_FORWARD
    }

    pub fn child_id(&self) -> Option<&str> {
        self.url.as_deref().and_then(child_id_from_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpicRecord {
    pub id: u64,
    pub state: String,
    pub title: String,
    pub effort: f64,
    pub relations: Vec<Relation>,
}

impl EpicRecord {
    pub fn new(id: u64, fields: &WorkItemFields, relations: Vec<Relation>) -> Self {
        Self {
            id,
            state: fields.text_or_na(FIELD_STATE),
            title: fields.text_or_na(FIELD_TITLE),
            effort: fields.number_or_zero(FIELD_EFFORT),
            relations,
        }
    }

    /// Child IDs of forward-hierarchy links, in relation order.
    /// Links whose URL yields no ID are skipped with a warning.
    pub fn child_ids(&self) -> Vec<&str> {
        self.relations
            .iter()
            .filter(|r| r.is_hierarchy_forward())
            .filter_map(|r| {
                let child_id = r.child_id();
                if child_id.is_none() {
                    warn!("Skipping relation of Epic {} without a child id", self.id);
                }
                child_id
            })
            .collect()
    }
}
