//! Review workflow engine.
//!
//! Every function here is pure: it reads a review snapshot and returns a new
//! one (or an error), never touching the input. Persistence, notification and
//! logging belong to the caller, see [`crate::kazi`].

use crate::error::WorkflowError;
use crate::types::{
    Approval, ApprovalId, ApprovalStatus, ClientReview, CreateReviewInput, Decision,
    DecisionInput, InviteReviewerInput, ReviewId, ReviewStage, ReviewStatus, ReviewTemplate,
    StageId, StageProgress, TimeRemaining,
};
use crate::validation::{
    validate_feedback, validate_reviewer, validate_stage_definitions, validate_title,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Instantiates a draft review from `template`, assigning `stage-1..n` in
/// template order.
pub fn create_review(
    template: &ReviewTemplate,
    input: &CreateReviewInput,
    now: DateTime<Utc>,
) -> Result<ClientReview, WorkflowError> {
    validate_title(&input.title)?;
    validate_stage_definitions(&template.stages)?;

    let stages: Vec<ReviewStage> = template
        .stages
        .iter()
        .enumerate()
        .map(|(index, definition)| ReviewStage {
            id: StageId::nth(index + 1),
            name: definition.name.clone(),
            description: definition.description.clone(),
            order: definition.order,
            required_approvals: definition.required_approvals,
            auto_advance: definition.auto_advance,
            deadline_hours: definition.deadline_hours,
        })
        .collect();

    let reviewers = input
        .reviewers
        .iter()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .collect();

    Ok(ClientReview {
        id: ReviewId::generate(),
        video_id: input.video_id.clone(),
        title: input.title.trim().to_string(),
        description: input.description.clone().unwrap_or_default(),
        template_name: template.name.clone(),
        current_stage_id: stages[0].id.clone(),
        status: ReviewStatus::Draft,
        stages,
        approvals: Vec::new(),
        reviewers,
        deadline: input.deadline,
        started_at: now,
        completed_at: None,
        settings: input.settings,
        created_by: input.created_by.clone(),
        created_at: now,
        updated_at: now,
        version: 1,
    })
}

/// Moves a draft review into `in_review`.
pub fn open_review(review: &ClientReview, now: DateTime<Utc>) -> Result<ClientReview, WorkflowError> {
    if review.is_terminal() || review.status != ReviewStatus::Draft {
        return Err(WorkflowError::InvalidState {
            status: review.status,
        });
    }
    let mut next = review.clone();
    next.status = ReviewStatus::InReview;
    touch(&mut next, now);
    Ok(next)
}

/// Records that a reviewer has been asked to weigh in on a stage.
pub fn invite_reviewer(
    review: &ClientReview,
    input: &InviteReviewerInput,
    now: DateTime<Utc>,
) -> Result<ClientReview, WorkflowError> {
    if review.is_terminal() {
        return Err(WorkflowError::InvalidState {
            status: review.status,
        });
    }
    validate_reviewer(&input.user_id, &input.user_name)?;
    if review.stage(&input.stage_id).is_none() {
        return Err(WorkflowError::validation(format!(
            "unknown stage {}",
            input.stage_id
        )));
    }
    if outstanding_invites(review, &input.stage_id).contains(input.user_id.trim()) {
        return Err(WorkflowError::validation(format!(
            "{} already has a pending invite on {}",
            input.user_id, input.stage_id
        )));
    }

    let mut next = review.clone();
    next.approvals.push(Approval {
        id: ApprovalId::generate(),
        review_id: review.id.clone(),
        stage_id: input.stage_id.clone(),
        user_id: input.user_id.trim().to_string(),
        user_name: input.user_name.trim().to_string(),
        status: ApprovalStatus::Pending,
        feedback: None,
        timestamp: now,
    });
    touch(&mut next, now);
    Ok(next)
}

/// Applies one reviewer decision to the current stage.
///
/// A rejection ends the review. A change request parks it in
/// `changes_requested` on the same stage. An approval returns it to
/// `in_review` and advances the stage (or completes the review) once the stage
/// gate is satisfied.
pub fn submit_decision(
    review: &ClientReview,
    input: &DecisionInput,
    now: DateTime<Utc>,
) -> Result<ClientReview, WorkflowError> {
    if review.is_terminal() || !review.status.accepts_decisions() {
        return Err(WorkflowError::InvalidState {
            status: review.status,
        });
    }
    if input.stage_id != review.current_stage_id {
        return Err(WorkflowError::StageMismatch {
            expected: review.current_stage_id.clone(),
            got: input.stage_id.clone(),
        });
    }
    if review.current_stage().is_none() {
        return Err(WorkflowError::validation(format!(
            "current stage {} is not part of the review",
            review.current_stage_id
        )));
    }
    validate_reviewer(&input.user_id, &input.user_name)?;
    validate_feedback(input.decision, input.feedback.as_deref())?;

    let feedback = input
        .feedback
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let mut next = review.clone();
    next.approvals.push(Approval {
        id: ApprovalId::generate(),
        review_id: review.id.clone(),
        stage_id: input.stage_id.clone(),
        user_id: input.user_id.trim().to_string(),
        user_name: input.user_name.trim().to_string(),
        status: input.decision.approval_status(),
        feedback,
        timestamp: now,
    });

    match input.decision {
        Decision::Reject => {
            next.status = ReviewStatus::Rejected;
            next.completed_at = Some(now);
        }
        Decision::RequestChanges => {
            next.status = ReviewStatus::ChangesRequested;
        }
        Decision::Approve => {
            next.status = ReviewStatus::InReview;
            advance_if_satisfied(&mut next, now);
        }
    }
    touch(&mut next, now);
    Ok(next)
}

/// Number of distinct reviewers holding an `approved` decision on the stage.
pub fn approved_count(review: &ClientReview, stage_id: &StageId) -> u32 {
    let users: HashSet<&str> = review
        .approvals_for(stage_id)
        .filter(|approval| approval.status == ApprovalStatus::Approved)
        .map(|approval| approval.user_id.as_str())
        .collect();
    u32::try_from(users.len()).unwrap_or(u32::MAX)
}

/// Invited reviewers on the stage who have not recorded a decision since
/// their latest invite.
pub fn outstanding_invites(review: &ClientReview, stage_id: &StageId) -> HashSet<String> {
    let mut outstanding = HashSet::new();
    for approval in review.approvals_for(stage_id) {
        if approval.status == ApprovalStatus::Pending {
            outstanding.insert(approval.user_id.clone());
        } else {
            outstanding.remove(&approval.user_id);
        }
    }
    outstanding
}

pub fn is_stage_complete(review: &ClientReview, stage: &ReviewStage) -> bool {
    approved_count(review, &stage.id) >= stage.required_approvals
}

/// Completion gate used for advancing: the approval threshold, plus no
/// unresolved invites when the review requires all approvals.
pub fn is_stage_satisfied(review: &ClientReview, stage: &ReviewStage) -> bool {
    if !is_stage_complete(review, stage) {
        return false;
    }
    !review.settings.require_all_approvals || outstanding_invites(review, &stage.id).is_empty()
}

/// Percentage of stages whose approval threshold is met, in `[0, 100]`.
pub fn calculate_progress(review: &ClientReview) -> f64 {
    if review.stages.is_empty() {
        return 0.0;
    }
    let completed = review
        .stages
        .iter()
        .filter(|stage| is_stage_complete(review, stage))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let pct = 100.0 * completed as f64 / review.stages.len() as f64;
    pct
}

pub fn stage_progress(review: &ClientReview) -> Vec<StageProgress> {
    let mut stages: Vec<&ReviewStage> = review.stages.iter().collect();
    stages.sort_by_key(|stage| stage.order);
    stages
        .into_iter()
        .map(|stage| StageProgress {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            order: stage.order,
            approved: approved_count(review, &stage.id),
            required: stage.required_approvals,
            pending_invites: u32::try_from(outstanding_invites(review, &stage.id).len())
                .unwrap_or(u32::MAX),
            complete: is_stage_complete(review, stage),
            current: stage.id == review.current_stage_id,
        })
        .collect()
}

/// A completed review is never overdue.
pub fn is_overdue(review: &ClientReview, now: DateTime<Utc>) -> bool {
    match review.deadline {
        Some(deadline) => deadline < now && review.completed_at.is_none(),
        None => false,
    }
}

pub fn time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let remaining = deadline - now;
    if remaining < Duration::zero() {
        return TimeRemaining::Overdue { late: -remaining };
    }
    let millis = remaining.num_milliseconds();
    if remaining < Duration::hours(24) {
        TimeRemaining::Hours {
            hours: div_ceil(millis, 3_600_000),
            remaining,
        }
    } else {
        TimeRemaining::Days {
            days: div_ceil(millis, 86_400_000),
            remaining,
        }
    }
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

fn advance_if_satisfied(review: &mut ClientReview, now: DateTime<Utc>) {
    let Some(stage) = review.current_stage().cloned() else {
        return;
    };
    if !is_stage_satisfied(review, &stage) {
        return;
    }
    let next_id = review.next_stage(&stage.id).map(|next| next.id.clone());
    match next_id {
        None => {
            review.status = ReviewStatus::Approved;
            review.completed_at = Some(now);
        }
        Some(next_id) if stage.auto_advance && review.settings.auto_advance_stages => {
            review.current_stage_id = next_id;
        }
        Some(_) => {}
    }
}

fn touch(review: &mut ClientReview, now: DateTime<Utc>) {
    review.updated_at = now;
    review.version += 1;
}
