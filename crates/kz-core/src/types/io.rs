use crate::types::enums::Decision;
use crate::types::ids::StageId;
use crate::types::review::ReviewSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    pub title: String,
    pub description: Option<String>,
    pub video_id: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub settings: ReviewSettings,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub stage_id: StageId,
    pub user_id: String,
    pub user_name: String,
    pub decision: Decision,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteReviewerInput {
    pub stage_id: StageId,
    pub user_id: String,
    pub user_name: String,
}
