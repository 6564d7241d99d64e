use crate::types::enums::ReviewStatus;
use crate::types::ids::{ReviewId, StageId};
use crate::types::review::{Approval, ClientReview};
use chrono::{DateTime, Utc};
use kz_events::types::EventSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub seq: i64,
    pub at: DateTime<Utc>,
    pub correlation_id: Option<String>,
    pub source: EventSource,
    pub body: EventBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    ReviewCreated {
        review: ClientReview,
    },
    ReviewOpened {
        review_id: ReviewId,
    },
    ReviewerInvited {
        review_id: ReviewId,
        approval: Approval,
    },
    DecisionRecorded {
        review_id: ReviewId,
        approval: Approval,
    },
    StageAdvanced {
        review_id: ReviewId,
        from: StageId,
        to: StageId,
    },
    ChangesRequested {
        review_id: ReviewId,
        stage_id: StageId,
        feedback: Option<String>,
    },
    ReviewApproved {
        review: ClientReview,
    },
    ReviewRejected {
        review: ClientReview,
        feedback: Option<String>,
    },
    StatusChanged {
        review_id: ReviewId,
        from: ReviewStatus,
        to: ReviewStatus,
    },
}

impl EventBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReviewCreated { .. } => "ReviewCreated",
            Self::ReviewOpened { .. } => "ReviewOpened",
            Self::ReviewerInvited { .. } => "ReviewerInvited",
            Self::DecisionRecorded { .. } => "DecisionRecorded",
            Self::StageAdvanced { .. } => "StageAdvanced",
            Self::ChangesRequested { .. } => "ChangesRequested",
            Self::ReviewApproved { .. } => "ReviewApproved",
            Self::ReviewRejected { .. } => "ReviewRejected",
            Self::StatusChanged { .. } => "StatusChanged",
        }
    }
}
