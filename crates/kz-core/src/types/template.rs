use serde::{Deserialize, Serialize};

/// Reusable blueprint of ordered stages; ids are assigned when a review is
/// created from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stages: Vec<StageDefinition>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    #[serde(default = "default_required_approvals")]
    pub required_approvals: u32,
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
    pub deadline_hours: Option<u32>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_required_approvals() -> u32 {
    1
}

fn default_auto_advance() -> bool {
    true
}
