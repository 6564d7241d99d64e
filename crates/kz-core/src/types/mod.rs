pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod review;
pub mod template;

pub use enums::{ApprovalStatus, Decision, ReviewFilter, ReviewStatus};
pub use event::EventBody;
pub use ids::{ApprovalId, IdError, ReviewId, StageId};
pub use io::{CreateReviewInput, DecisionInput, InviteReviewerInput};
pub use review::{
    Approval, ClientReview, ReviewSettings, ReviewStage, ReviewStats, StageProgress,
    TimeRemaining,
};
pub use template::{ReviewTemplate, StageDefinition};
