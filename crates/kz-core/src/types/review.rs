use crate::types::enums::{ApprovalStatus, ReviewStatus};
use crate::types::ids::{ApprovalId, ReviewId, StageId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStage {
    pub id: StageId,
    pub name: String,
    pub description: String,
    pub order: u32,
    pub required_approvals: u32,
    pub auto_advance: bool,
    pub deadline_hours: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: ApprovalId,
    pub review_id: ReviewId,
    pub stage_id: StageId,
    pub user_id: String,
    pub user_name: String,
    pub status: ApprovalStatus,
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSettings {
    pub allow_comments: bool,
    pub require_all_approvals: bool,
    pub auto_advance_stages: bool,
    pub send_notifications: bool,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            allow_comments: true,
            require_all_approvals: false,
            auto_advance_stages: true,
            send_notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReview {
    pub id: ReviewId,
    pub video_id: Option<String>,
    pub title: String,
    pub description: String,
    pub template_name: String,
    pub current_stage_id: StageId,
    pub status: ReviewStatus,
    pub stages: Vec<ReviewStage>,
    pub approvals: Vec<Approval>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub settings: ReviewSettings,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl ClientReview {
    pub fn stage(&self, id: &StageId) -> Option<&ReviewStage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    pub fn current_stage(&self) -> Option<&ReviewStage> {
        self.stage(&self.current_stage_id)
    }

    /// The stage following `id` by order, `None` for the last stage.
    pub fn next_stage(&self, id: &StageId) -> Option<&ReviewStage> {
        let current = self.stage(id)?;
        self.stages
            .iter()
            .filter(|stage| stage.order > current.order)
            .min_by_key(|stage| stage.order)
    }

    pub fn approvals_for<'a>(&'a self, stage_id: &'a StageId) -> impl Iterator<Item = &'a Approval> {
        self.approvals
            .iter()
            .filter(move |approval| &approval.stage_id == stage_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.completed_at.is_some() || self.status.is_terminal()
    }
}

/// Per-stage completion view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    pub stage_id: StageId,
    pub name: String,
    pub order: u32,
    pub approved: u32,
    pub required: u32,
    pub pending_invites: u32,
    pub complete: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: u32,
    pub draft: u32,
    pub in_review: u32,
    pub changes_requested: u32,
    pub approved: u32,
    pub rejected: u32,
    pub overdue: u32,
    pub average_progress: f64,
}

/// Time left until a deadline, bucketed for display.
///
/// Both buckets round up, so 90 minutes is `Hours { hours: 2, .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Overdue { late: Duration },
    Hours { hours: i64, remaining: Duration },
    Days { days: i64, remaining: Duration },
}

impl TimeRemaining {
    /// Raw time left; zero once overdue.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Overdue { .. } => Duration::zero(),
            Self::Hours { remaining, .. } | Self::Days { remaining, .. } => *remaining,
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Self::Overdue { .. })
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue { .. } => f.write_str("Overdue"),
            Self::Hours { hours, .. } => write!(f, "{hours}h left"),
            Self::Days { days: 1, .. } => f.write_str("1 day left"),
            Self::Days { days, .. } => write!(f, "{days} days left"),
        }
    }
}
