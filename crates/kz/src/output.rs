use kz_core::types::event::Event;
use kz_core::types::{
    ApprovalStatus, ClientReview, EventBody, ReviewStatus, ReviewTemplate, StageProgress,
};
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use crate::commands::dashboard::DashboardResult;
use crate::commands::review::{ReviewResult, ReviewSummary};
use crate::commands::templates::TemplatesResult;
use crate::error::Result;

fn status_label(status: ReviewStatus) -> String {
    let text = status.as_str();
    match status {
        ReviewStatus::Approved => text.if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        ReviewStatus::Rejected => text.if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
        ReviewStatus::ChangesRequested => text
            .if_supports_color(Stream::Stdout, |t| t.yellow())
            .to_string(),
        ReviewStatus::InReview => text.if_supports_color(Stream::Stdout, |t| t.cyan()).to_string(),
        ReviewStatus::Draft => text.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string(),
    }
}

fn approval_label(status: ApprovalStatus) -> String {
    let text = status.as_str();
    match status {
        ApprovalStatus::Approved => text.if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        ApprovalStatus::Rejected => text.if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
        ApprovalStatus::ChangesRequested => text
            .if_supports_color(Stream::Stdout, |t| t.yellow())
            .to_string(),
        ApprovalStatus::Pending => text.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn review_line(review: &ClientReview) -> String {
    format!(
        "{}  {:<18}  {}  ({})",
        review.id,
        status_label(review.status),
        review.title.if_supports_color(Stream::Stdout, |t| t.bold()),
        review.current_stage_id
    )
}

fn stage_line(stage: &StageProgress) -> String {
    let marker = if stage.current { ">" } else { " " };
    let check = if stage.complete { "x" } else { " " };
    let mut line = format!(
        "{marker} [{check}] {} {} ({}/{})",
        stage.stage_id, stage.name, stage.approved, stage.required
    );
    if stage.pending_invites > 0 {
        line.push_str(&format!(", {} invited", stage.pending_invites));
    }
    line
}

pub fn print_templates(result: &TemplatesResult, json: bool) -> Result<()> {
    match result {
        TemplatesResult::List(templates) if json => print_json(templates),
        TemplatesResult::Show(template) if json => print_json(template),
        TemplatesResult::List(templates) => {
            for template in templates {
                println!(
                    "{}  [{}] {} stage(s)",
                    template.name.if_supports_color(Stream::Stdout, |t| t.bold()),
                    template.category,
                    template.stages.len()
                );
            }
            Ok(())
        }
        TemplatesResult::Show(template) => {
            print_template(template);
            Ok(())
        }
    }
}

fn print_template(template: &ReviewTemplate) {
    println!("{}", template.name.if_supports_color(Stream::Stdout, |t| t.bold()));
    if !template.description.is_empty() {
        println!("{}", template.description);
    }
    for stage in &template.stages {
        let due = stage
            .deadline_hours
            .map(|hours| format!(", due in {hours}h"))
            .unwrap_or_default();
        let advance = if stage.auto_advance { "" } else { ", manual release" };
        println!(
            "  {}. {} - {} approval(s){due}{advance}",
            stage.order, stage.name, stage.required_approvals
        );
    }
}

pub fn print_review(result: &ReviewResult, notifications: &[Event], json: bool) -> Result<()> {
    if json {
        return match result {
            ReviewResult::Updated(review) => print_json(review),
            ReviewResult::List(reviews) => print_json(reviews),
            ReviewResult::Summary(summary) => print_json(&summary_json(summary)),
        };
    }

    match result {
        ReviewResult::Updated(review) => {
            println!("{}", review_line(review));
        }
        ReviewResult::List(reviews) => {
            if reviews.is_empty() {
                println!("no reviews");
            }
            for review in reviews {
                println!("{}", review_line(review));
            }
        }
        ReviewResult::Summary(summary) => print_summary(summary),
    }
    for event in notifications {
        println!(
            "{} {}",
            "notify".if_supports_color(Stream::Stdout, |t| t.magenta()),
            describe(&event.body)
        );
    }
    Ok(())
}

fn summary_json(summary: &ReviewSummary) -> serde_json::Value {
    json!({
        "review": summary.review,
        "progress": summary.progress,
        "stages": summary.stages,
        "overdue": summary.overdue,
        "timeRemaining": summary.remaining.map(|left| left.to_string()),
        "remainingSeconds": summary.remaining.map(|left| left.duration().num_seconds()),
    })
}

fn print_summary(summary: &ReviewSummary) {
    let review = &summary.review;
    println!("{}", review_line(review));
    if !review.description.is_empty() {
        println!("{}", review.description);
    }
    println!("progress: {:.0}%  version: {}", summary.progress, review.version);
    if let Some(left) = summary.remaining {
        let text = left.to_string();
        if summary.overdue {
            println!("deadline: {}", text.if_supports_color(Stream::Stdout, |t| t.red()));
        } else {
            println!("deadline: {text}");
        }
    }
    for stage in &summary.stages {
        println!("{}", stage_line(stage));
    }
    for approval in &review.approvals {
        let feedback = approval
            .feedback
            .as_deref()
            .map(|text| format!(": {text}"))
            .unwrap_or_default();
        println!(
            "    {} {} {}{feedback}",
            approval.stage_id,
            approval.user_name,
            approval_label(approval.status)
        );
    }
}

pub fn print_dashboard(result: &DashboardResult, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "stats": result.stats,
            "tab": result.tab,
            "reviews": result.reviews,
        }));
    }
    let stats = &result.stats;
    println!(
        "{} reviews  draft {}  in review {}  changes {}  approved {}  rejected {}  overdue {}",
        stats.total,
        stats.draft,
        stats.in_review,
        stats.changes_requested,
        stats.approved,
        stats.rejected,
        stats.overdue
    );
    println!("average progress: {:.0}%", stats.average_progress);
    println!();
    println!("{}:", result.tab.as_str().if_supports_color(Stream::Stdout, |t| t.bold()));
    if result.reviews.is_empty() {
        println!("  none");
    }
    for review in &result.reviews {
        println!("  {}", review_line(review));
    }
    Ok(())
}

fn describe(body: &EventBody) -> String {
    match body {
        EventBody::ReviewCreated { review } => format!("review {} created", review.id),
        EventBody::ReviewOpened { review_id } => format!("review {review_id} opened for feedback"),
        EventBody::ReviewerInvited { approval, .. } => {
            format!("{} invited to {}", approval.user_name, approval.stage_id)
        }
        EventBody::DecisionRecorded { approval, .. } => format!(
            "{} {} {}",
            approval.user_name, approval.status, approval.stage_id
        ),
        EventBody::StageAdvanced { from, to, .. } => format!("advanced {from} -> {to}"),
        EventBody::ChangesRequested { stage_id, .. } => format!("changes requested on {stage_id}"),
        EventBody::ReviewApproved { review } => format!("review {} approved", review.id),
        EventBody::ReviewRejected { review, .. } => format!("review {} rejected", review.id),
        EventBody::StatusChanged { review_id, from, to } => {
            format!("review {review_id} {from} -> {to}")
        }
    }
}
