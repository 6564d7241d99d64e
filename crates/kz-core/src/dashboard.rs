use crate::types::{ClientReview, ReviewFilter, ReviewStats, ReviewStatus};
use crate::workflow::{calculate_progress, is_overdue};
use chrono::{DateTime, Utc};

pub fn matches_filter(review: &ClientReview, filter: ReviewFilter, now: DateTime<Utc>) -> bool {
    match filter {
        ReviewFilter::All => true,
        ReviewFilter::Draft => review.status == ReviewStatus::Draft,
        ReviewFilter::InReview => review.status == ReviewStatus::InReview,
        ReviewFilter::ChangesRequested => review.status == ReviewStatus::ChangesRequested,
        ReviewFilter::Approved => review.status == ReviewStatus::Approved,
        ReviewFilter::Rejected => review.status == ReviewStatus::Rejected,
        ReviewFilter::Overdue => is_overdue(review, now),
        ReviewFilter::Completed => review.is_terminal(),
    }
}

pub fn filter_reviews<'a>(
    reviews: &'a [ClientReview],
    filter: ReviewFilter,
    now: DateTime<Utc>,
) -> Vec<&'a ClientReview> {
    reviews
        .iter()
        .filter(|review| matches_filter(review, filter, now))
        .collect()
}

pub fn summarize(reviews: &[ClientReview], now: DateTime<Utc>) -> ReviewStats {
    let mut stats = ReviewStats {
        total: 0,
        draft: 0,
        in_review: 0,
        changes_requested: 0,
        approved: 0,
        rejected: 0,
        overdue: 0,
        average_progress: 0.0,
    };
    let mut progress_sum = 0.0;
    for review in reviews {
        stats.total += 1;
        match review.status {
            ReviewStatus::Draft => stats.draft += 1,
            ReviewStatus::InReview => stats.in_review += 1,
            ReviewStatus::ChangesRequested => stats.changes_requested += 1,
            ReviewStatus::Approved => stats.approved += 1,
            ReviewStatus::Rejected => stats.rejected += 1,
        }
        if is_overdue(review, now) {
            stats.overdue += 1;
        }
        progress_sum += calculate_progress(review);
    }
    if stats.total > 0 {
        stats.average_progress = progress_sum / f64::from(stats.total);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CreateReviewInput, Decision, DecisionInput, ReviewTemplate, StageDefinition, StageId,
    };
    use crate::workflow::{create_review, open_review, submit_decision};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 11, 12, 0, 0).unwrap()
    }

    fn review(title: &str, deadline: Option<DateTime<Utc>>) -> ClientReview {
        let template = ReviewTemplate {
            name: "Two step".to_string(),
            description: String::new(),
            stages: (1..=2)
                .map(|order| StageDefinition {
                    name: format!("Step {order}"),
                    description: String::new(),
                    order,
                    required_approvals: 1,
                    auto_advance: true,
                    deadline_hours: None,
                })
                .collect(),
            category: "general".to_string(),
            is_public: false,
        };
        let input = CreateReviewInput {
            title: title.to_string(),
            deadline,
            created_by: "owner".to_string(),
            ..CreateReviewInput::default()
        };
        create_review(&template, &input, now()).unwrap()
    }

    fn decide(review: &ClientReview, decision: Decision) -> ClientReview {
        let input = DecisionInput {
            stage_id: review.current_stage_id.clone(),
            user_id: "u".to_string(),
            user_name: "U".to_string(),
            decision,
            feedback: Some("note".to_string()),
        };
        submit_decision(review, &input, now()).unwrap()
    }

    fn board() -> Vec<ClientReview> {
        let draft = review("draft", None);
        let late = open_review(&review("late", Some(now() - Duration::hours(2))), now()).unwrap();
        let halfway = decide(&open_review(&review("halfway", None), now()).unwrap(), Decision::Approve);
        let rejected = decide(
            &open_review(&review("rejected", Some(now() - Duration::days(3))), now()).unwrap(),
            Decision::Reject,
        );
        let changes = decide(&open_review(&review("changes", None), now()).unwrap(), Decision::RequestChanges);
        vec![draft, late, halfway, rejected, changes]
    }

    #[test]
    fn test_tabs_select_matching_reviews() {
        let reviews = board();
        let titles = |filter| -> Vec<String> {
            filter_reviews(&reviews, filter, now())
                .into_iter()
                .map(|review| review.title.clone())
                .collect()
        };
        assert_eq!(titles(ReviewFilter::All).len(), 5);
        assert_eq!(titles(ReviewFilter::Draft), vec!["draft"]);
        assert_eq!(titles(ReviewFilter::InReview), vec!["late", "halfway"]);
        assert_eq!(titles(ReviewFilter::ChangesRequested), vec!["changes"]);
        assert_eq!(titles(ReviewFilter::Overdue), vec!["late"]);
        assert_eq!(titles(ReviewFilter::Completed), vec!["rejected"]);
        assert!(titles(ReviewFilter::Approved).is_empty());
    }

    #[test]
    fn test_summary_counts_and_average() {
        let reviews = board();
        let stats = summarize(&reviews, now());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.in_review, 2);
        assert_eq!(stats.changes_requested, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.approved, 0);
        assert_eq!(stats.overdue, 1);
        // Only "halfway" has a completed stage: 50 / 5.
        assert!((stats.average_progress - 10.0).abs() < 1e-9);
        assert_eq!(StageId::nth(2), reviews[2].current_stage_id);
    }

    #[test]
    fn test_empty_board() {
        let stats = summarize(&[], now());
        assert_eq!(stats.total, 0);
        assert!(stats.average_progress.abs() < f64::EPSILON);
    }
}
