use chrono::Utc;
use clap::Args;
use kz_core::types::{ClientReview, ReviewFilter, ReviewStats};
use kz_core::{Kazi, MemoryStore};

use crate::error::Result;

#[derive(Args)]
pub struct DashboardArgs {
    /// Tab to list under the summary
    #[arg(long, default_value = "overdue")]
    pub tab: ReviewFilter,
}

pub struct DashboardResult {
    pub stats: ReviewStats,
    pub tab: ReviewFilter,
    pub reviews: Vec<ClientReview>,
}

pub fn handle(kazi: &Kazi<MemoryStore>, args: DashboardArgs) -> Result<DashboardResult> {
    let now = Utc::now();
    let reviews = kazi.reviews();
    Ok(DashboardResult {
        stats: reviews.dashboard(now)?,
        tab: args.tab,
        reviews: reviews.list(args.tab, now)?,
    })
}
