use crate::error::KaziError;
use crate::types::event::Event;
use crate::types::{ApprovalStatus, ClientReview, EventBody, ReviewStatus};
use kz_events::types::EventRecord;

/// Notifications implied by moving from `before` to `after`.
///
/// Approvals appended since `before` become `ReviewerInvited` or
/// `DecisionRecorded`; stage and status changes follow in that order.
pub fn transition_events(before: &ClientReview, after: &ClientReview) -> Vec<EventBody> {
    let mut events = Vec::new();
    let review_id = after.id.clone();

    for approval in after.approvals.iter().skip(before.approvals.len()) {
        let body = if approval.status == ApprovalStatus::Pending {
            EventBody::ReviewerInvited {
                review_id: review_id.clone(),
                approval: approval.clone(),
            }
        } else {
            EventBody::DecisionRecorded {
                review_id: review_id.clone(),
                approval: approval.clone(),
            }
        };
        events.push(body);
    }

    if before.current_stage_id != after.current_stage_id {
        events.push(EventBody::StageAdvanced {
            review_id: review_id.clone(),
            from: before.current_stage_id.clone(),
            to: after.current_stage_id.clone(),
        });
    }

    if before.status != after.status {
        let latest_feedback = after.approvals.last().and_then(|a| a.feedback.clone());
        let body = match (before.status, after.status) {
            (ReviewStatus::Draft, ReviewStatus::InReview) => EventBody::ReviewOpened {
                review_id: review_id.clone(),
            },
            (_, ReviewStatus::ChangesRequested) => EventBody::ChangesRequested {
                review_id: review_id.clone(),
                stage_id: after.current_stage_id.clone(),
                feedback: latest_feedback,
            },
            (_, ReviewStatus::Approved) => EventBody::ReviewApproved {
                review: after.clone(),
            },
            (_, ReviewStatus::Rejected) => EventBody::ReviewRejected {
                review: after.clone(),
                feedback: latest_feedback,
            },
            (from, to) => EventBody::StatusChanged {
                review_id: review_id.clone(),
                from,
                to,
            },
        };
        events.push(body);
    }

    events
}

impl Event {
    pub fn from_record(record: &EventRecord) -> Result<Self, KaziError> {
        Ok(Self {
            id: record.id.clone(),
            seq: record.seq,
            at: record.at,
            correlation_id: record.correlation_id.clone(),
            source: record.source,
            body: serde_json::from_value(record.body.clone())?,
        })
    }
}
