use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand, ValueEnum};
use kz_core::types::{
    ClientReview, CreateReviewInput, Decision, DecisionInput, InviteReviewerInput, ReviewFilter,
    ReviewId, ReviewSettings, StageId, StageProgress, TimeRemaining,
};
use kz_core::workflow::{is_overdue, time_remaining};
use kz_core::{Kazi, MemoryStore, RequestContext};

use crate::error::Result;

#[derive(Subcommand)]
pub enum ReviewCommand {
    /// Create a draft review from a template
    Create(CreateArgs),
    /// Open a draft review for feedback
    Open { id: ReviewId },
    /// Ask a reviewer to weigh in on a stage
    Invite(InviteArgs),
    /// Record an approve / reject / request-changes decision
    Decide(DecideArgs),
    /// Show stages, progress and deadline of a review
    Show { id: ReviewId },
    /// List reviews on the board
    List {
        #[arg(long, default_value = "all")]
        filter: ReviewFilter,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub title: String,
    #[arg(long, default_value = "Standard Client Review")]
    pub template: String,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Id of the video or asset under review
    #[arg(long)]
    pub video: Option<String>,
    /// RFC 3339 deadline, e.g. 2026-11-01T17:00:00Z
    #[arg(long, conflicts_with = "due_in_hours")]
    pub deadline: Option<DateTime<Utc>>,
    #[arg(long)]
    pub due_in_hours: Option<u32>,
    /// Reviewer e-mail, repeatable
    #[arg(long = "reviewer")]
    pub reviewers: Vec<String>,
    #[arg(long)]
    pub require_all: bool,
    #[arg(long)]
    pub no_auto_advance: bool,
    #[arg(long)]
    pub no_comments: bool,
    #[arg(long)]
    pub no_notify: bool,
    #[arg(long, default_value = "cli")]
    pub created_by: String,
}

#[derive(Args)]
pub struct InviteArgs {
    pub id: ReviewId,
    /// Defaults to the current stage
    #[arg(long)]
    pub stage: Option<StageId>,
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
    RequestChanges,
}

impl From<DecisionArg> for Decision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Approve => Decision::Approve,
            DecisionArg::Reject => Decision::Reject,
            DecisionArg::RequestChanges => Decision::RequestChanges,
        }
    }
}

#[derive(Args)]
pub struct DecideArgs {
    pub id: ReviewId,
    #[arg(value_enum)]
    pub decision: DecisionArg,
    /// Defaults to the current stage
    #[arg(long)]
    pub stage: Option<StageId>,
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub feedback: Option<String>,
    /// Refuse the decision if the review changed since this version
    #[arg(long)]
    pub expect_version: Option<u64>,
}

#[derive(Debug)]
pub struct ReviewSummary {
    pub review: ClientReview,
    pub progress: f64,
    pub stages: Vec<StageProgress>,
    pub overdue: bool,
    pub remaining: Option<TimeRemaining>,
}

#[derive(Debug)]
pub enum ReviewResult {
    Updated(ClientReview),
    Summary(Box<ReviewSummary>),
    List(Vec<ClientReview>),
}

impl ReviewResult {
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

pub fn handle(
    kazi: &Kazi<MemoryStore>,
    ctx: &RequestContext,
    cmd: ReviewCommand,
) -> Result<ReviewResult> {
    let reviews = kazi.reviews();
    match cmd {
        ReviewCommand::Create(args) => {
            let input = create_input(&args);
            let review = reviews.create(ctx, &args.template, input)?;
            Ok(ReviewResult::Updated(review))
        }
        ReviewCommand::Open { id } => Ok(ReviewResult::Updated(reviews.open(ctx, &id)?)),
        ReviewCommand::Invite(args) => {
            let stage_id = match args.stage {
                Some(stage) => stage,
                None => reviews.require(&args.id)?.current_stage_id,
            };
            let input = InviteReviewerInput {
                stage_id,
                user_name: args.name.unwrap_or_else(|| args.user.clone()),
                user_id: args.user,
            };
            Ok(ReviewResult::Updated(reviews.invite(ctx, &args.id, &input)?))
        }
        ReviewCommand::Decide(args) => {
            let stage_id = match args.stage {
                Some(stage) => stage,
                None => reviews.require(&args.id)?.current_stage_id,
            };
            let input = DecisionInput {
                stage_id,
                user_name: args.name.unwrap_or_else(|| args.user.clone()),
                user_id: args.user,
                decision: args.decision.into(),
                feedback: args.feedback,
            };
            let review = match args.expect_version {
                Some(version) => reviews.decide_checked(ctx, &args.id, version, &input)?,
                None => reviews.decide(ctx, &args.id, &input)?,
            };
            Ok(ReviewResult::Updated(review))
        }
        ReviewCommand::Show { id } => {
            let review = reviews.require(&id)?;
            let now = Utc::now();
            Ok(ReviewResult::Summary(Box::new(ReviewSummary {
                progress: reviews.progress(&id)?,
                stages: reviews.stages(&id)?,
                overdue: is_overdue(&review, now),
                remaining: review
                    .deadline
                    .filter(|_| review.completed_at.is_none())
                    .map(|deadline| time_remaining(deadline, now)),
                review,
            })))
        }
        ReviewCommand::List { filter } => Ok(ReviewResult::List(reviews.list(filter, Utc::now())?)),
    }
}

fn create_input(args: &CreateArgs) -> CreateReviewInput {
    let deadline = args.deadline.or_else(|| {
        args.due_in_hours
            .map(|hours| Utc::now() + Duration::hours(i64::from(hours)))
    });
    CreateReviewInput {
        title: args.title.clone(),
        description: args.description.clone(),
        video_id: args.video.clone(),
        deadline,
        reviewers: args.reviewers.clone(),
        settings: ReviewSettings {
            allow_comments: !args.no_comments,
            require_all_approvals: args.require_all,
            auto_advance_stages: !args.no_auto_advance,
            send_notifications: !args.no_notify,
        },
        created_by: args.created_by.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use assert_matches::assert_matches;
    use kz_core::types::ReviewStatus;
    use kz_core::{KaziError, TemplateCatalog, WorkflowError};
    use kz_events::bus::EventBus;
    use kz_events::types::EventSource;

    fn kazi() -> Kazi<MemoryStore> {
        Kazi::new(MemoryStore::new(), EventBus::default(), TemplateCatalog::builtin())
    }

    fn ctx() -> RequestContext {
        RequestContext::new(EventSource::Cli, None)
    }

    fn create_args(title: &str) -> CreateArgs {
        CreateArgs {
            title: title.to_string(),
            template: "Quick Approval".to_string(),
            description: None,
            video: None,
            deadline: None,
            due_in_hours: Some(48),
            reviewers: vec!["ana@studio.io".to_string()],
            require_all: false,
            no_auto_advance: false,
            no_comments: false,
            no_notify: true,
            created_by: "cli".to_string(),
        }
    }

    fn created(kazi: &Kazi<MemoryStore>) -> ClientReview {
        match handle(kazi, &ctx(), ReviewCommand::Create(create_args("Promo"))).unwrap() {
            ReviewResult::Updated(review) => review,
            _ => panic!("create should return the review"),
        }
    }

    #[test]
    fn test_create_maps_flags() {
        let kazi = kazi();
        let review = created(&kazi);
        assert_eq!(review.status, ReviewStatus::Draft);
        assert!(!review.settings.send_notifications);
        assert!(review.deadline.is_some());
        assert_eq!(review.reviewers, vec!["ana@studio.io".to_string()]);
    }

    #[test]
    fn test_decide_defaults_to_current_stage() {
        let kazi = kazi();
        let review = created(&kazi);
        handle(&kazi, &ctx(), ReviewCommand::Open { id: review.id.clone() }).unwrap();

        let result = handle(
            &kazi,
            &ctx(),
            ReviewCommand::Decide(DecideArgs {
                id: review.id.clone(),
                decision: DecisionArg::Approve,
                stage: None,
                user: "lead".to_string(),
                name: None,
                feedback: None,
                expect_version: Some(2),
            }),
        )
        .unwrap();
        assert!(result.mutated());
        match result {
            ReviewResult::Updated(review) => {
                assert_eq!(review.status, ReviewStatus::Approved);
                assert_eq!(review.approvals[0].user_name, "lead");
            }
            _ => panic!("decide should return the review"),
        }
    }

    #[test]
    fn test_show_reports_progress_and_deadline() {
        let kazi = kazi();
        let review = created(&kazi);
        let result = handle(&kazi, &ctx(), ReviewCommand::Show { id: review.id }).unwrap();
        assert!(!result.mutated());
        let ReviewResult::Summary(summary) = result else {
            panic!("show should summarize");
        };
        assert!(summary.progress.abs() < f64::EPSILON);
        assert!(!summary.overdue);
        assert_matches!(summary.remaining, Some(TimeRemaining::Days { days: 2, .. }));
        assert!(summary.stages[0].current);
    }

    #[test]
    fn test_blank_title_surfaces_validation_error() {
        let kazi = kazi();
        let result = handle(&kazi, &ctx(), ReviewCommand::Create(create_args("  ")));
        assert_matches!(
            result,
            Err(CliError::Kazi(KaziError::Workflow(WorkflowError::Validation { .. })))
        );
        assert!(kazi.store().snapshot().is_empty());
    }
}
