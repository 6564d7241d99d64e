use crate::error::{KaziError, StoreError};
use crate::events::transition_events;
use crate::reviews::ReviewRepository;
use crate::store::Store;
use crate::templates::TemplateCatalog;
use crate::types::{
    ClientReview, CreateReviewInput, DecisionInput, EventBody, InviteReviewerInput, ReviewFilter,
    ReviewId, ReviewStats, StageProgress,
};
use crate::{dashboard, workflow};
use chrono::{DateTime, Utc};
use kz_events::bus::EventBus;
use kz_events::types::{EventRecord, EventSource};
use serde::Serialize;
use std::cell::Cell;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

/// Runs the workflow engine against a [`Store`], publishing the resulting
/// notifications once each transaction commits.
pub struct Kazi<S: Store> {
    store: S,
    event_bus: EventBus,
    catalog: TemplateCatalog,
    seq: Cell<i64>,
}

impl<S: Store> Kazi<S> {
    pub fn new(store: S, event_bus: EventBus, catalog: TemplateCatalog) -> Self {
        Self {
            store,
            event_bus,
            catalog,
            seq: Cell::new(0),
        }
    }

    pub fn reviews(&self) -> ReviewsApi<'_, S> {
        ReviewsApi { core: self }
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn with_events<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T, KaziError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>, bool), KaziError>,
    {
        let (value, bodies, notify) = self.store.with_tx(f)?;
        if !notify {
            debug!(count = bodies.len(), "notifications disabled for review");
            return Ok(value);
        }
        for body in &bodies {
            self.publish(ctx, body.kind(), body);
        }
        Ok(value)
    }

    /// Called after commit. Failures are logged, never returned.
    fn publish<B: Serialize>(&self, ctx: &RequestContext, kind: &str, body: &B) {
        let record = match self.build_event_record(ctx, body) {
            Ok(record) => record,
            Err(err) => {
                warn!(kind, error = %err, "dropping notification that failed to serialize");
                return;
            }
        };
        if self.event_bus.publish(record).is_err() {
            debug!(kind, "no notification subscribers");
        }
    }

    fn build_event_record<B: Serialize>(
        &self,
        ctx: &RequestContext,
        body: &B,
    ) -> Result<EventRecord, KaziError> {
        let value = serde_json::to_value(body)?;
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        Ok(EventRecord::new(
            seq,
            ctx.source,
            ctx.correlation_id.clone(),
            value,
        ))
    }
}

pub struct ReviewsApi<'a, S: Store> {
    core: &'a Kazi<S>,
}

impl<S: Store> ReviewsApi<'_, S> {
    pub fn create(
        &self,
        ctx: &RequestContext,
        template_name: &str,
        input: CreateReviewInput,
    ) -> Result<ClientReview, KaziError> {
        let template = self.core.catalog.get(template_name)?;
        let review = workflow::create_review(template, &input, Utc::now())?;
        self.core.with_events(ctx, |store| {
            let review = store.reviews().insert(&review)?;
            info!(
                review_id = %review.id,
                template = %review.template_name,
                stages = review.stages.len(),
                "review created"
            );
            let notify = review.settings.send_notifications;
            Ok((
                review.clone(),
                vec![EventBody::ReviewCreated { review }],
                notify,
            ))
        })
    }

    pub fn open(&self, ctx: &RequestContext, id: &ReviewId) -> Result<ClientReview, KaziError> {
        self.mutate(ctx, id, None, |review, now| workflow::open_review(review, now))
    }

    pub fn invite(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &InviteReviewerInput,
    ) -> Result<ClientReview, KaziError> {
        self.mutate(ctx, id, None, |review, now| {
            workflow::invite_reviewer(review, input, now)
        })
    }

    pub fn decide(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &DecisionInput,
    ) -> Result<ClientReview, KaziError> {
        self.mutate(ctx, id, None, |review, now| {
            workflow::submit_decision(review, input, now)
        })
    }

    /// Like [`Self::decide`], but fails with a version conflict when the
    /// review changed since the caller read `seen_version`.
    pub fn decide_checked(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        seen_version: u64,
        input: &DecisionInput,
    ) -> Result<ClientReview, KaziError> {
        self.mutate(ctx, id, Some(seen_version), |review, now| {
            workflow::submit_decision(review, input, now)
        })
    }

    pub fn get(&self, id: &ReviewId) -> Result<Option<ClientReview>, KaziError> {
        self.core
            .store
            .reviews()
            .get(id)
            .map_err(KaziError::from)
    }

    pub fn require(&self, id: &ReviewId) -> Result<ClientReview, KaziError> {
        self.get(id)?.ok_or_else(|| {
            KaziError::Store(StoreError::ReviewNotFound { id: id.clone() })
        })
    }

    pub fn list(
        &self,
        filter: ReviewFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClientReview>, KaziError> {
        let reviews = self.core.store.reviews().list()?;
        Ok(reviews
            .into_iter()
            .filter(|review| dashboard::matches_filter(review, filter, now))
            .collect())
    }

    pub fn progress(&self, id: &ReviewId) -> Result<f64, KaziError> {
        Ok(workflow::calculate_progress(&self.require(id)?))
    }

    pub fn stages(&self, id: &ReviewId) -> Result<Vec<StageProgress>, KaziError> {
        Ok(workflow::stage_progress(&self.require(id)?))
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<ReviewStats, KaziError> {
        let reviews = self.core.store.reviews().list()?;
        Ok(dashboard::summarize(&reviews, now))
    }

    fn mutate<F>(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        seen_version: Option<u64>,
        apply: F,
    ) -> Result<ClientReview, KaziError>
    where
        F: FnOnce(&ClientReview, DateTime<Utc>) -> Result<ClientReview, crate::WorkflowError>,
    {
        self.core.with_events(ctx, |store| {
            let before = store
                .reviews()
                .get(id)?
                .ok_or_else(|| StoreError::ReviewNotFound { id: id.clone() })?;
            if let Some(seen) = seen_version {
                if seen != before.version {
                    warn!(review_id = %id, seen, current = before.version, "stale review snapshot");
                    return Err(StoreError::VersionConflict {
                        id: id.clone(),
                        expected: seen,
                        found: before.version,
                    }
                    .into());
                }
            }

            let after = apply(&before, Utc::now()).inspect_err(|err| {
                debug!(review_id = %id, error = %err, "workflow rejected operation");
            })?;
            let after = store
                .reviews()
                .replace(&after, before.version)
                .inspect_err(|err| warn!(review_id = %id, error = %err, "review write failed"))?;

            if before.status != after.status {
                info!(
                    review_id = %id,
                    from = %before.status,
                    to = %after.status,
                    "review status changed"
                );
            }
            if before.current_stage_id != after.current_stage_id {
                info!(
                    review_id = %id,
                    from = %before.current_stage_id,
                    to = %after.current_stage_id,
                    "review advanced stage"
                );
            }
            debug!(
                review_id = %id,
                approvals = after.approvals.len(),
                version = after.version,
                "review updated"
            );

            let events = transition_events(&before, &after);
            let notify = after.settings.send_notifications;
            Ok((after, events, notify))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::{Decision, ReviewSettings, ReviewStatus, StageId};
    use crate::WorkflowError;
    use assert_matches::assert_matches;
    use std::collections::BTreeMap;

    fn kazi() -> Kazi<MemoryStore> {
        Kazi::new(
            MemoryStore::new(),
            EventBus::new(64),
            TemplateCatalog::builtin(),
        )
    }

    fn ctx() -> RequestContext {
        RequestContext::new(EventSource::Api, Some("req-1".to_string()))
    }

    fn input(title: &str) -> CreateReviewInput {
        CreateReviewInput {
            title: title.to_string(),
            created_by: "producer".to_string(),
            ..CreateReviewInput::default()
        }
    }

    fn approve(stage: &StageId, user: &str) -> DecisionInput {
        DecisionInput {
            stage_id: stage.clone(),
            user_id: user.to_string(),
            user_name: user.to_string(),
            decision: Decision::Approve,
            feedback: None,
        }
    }

    #[test]
    fn test_full_review_through_service() {
        let kazi = kazi();
        let mut rx = kazi.event_bus.subscribe();
        let reviews = kazi.reviews();

        let review = reviews
            .create(&ctx(), "standard client review", input("Brand film"))
            .unwrap();
        assert_eq!(review.stages.len(), 3);
        reviews.open(&ctx(), &review.id).unwrap();
        for stage in 1..=3 {
            reviews
                .decide(&ctx(), &review.id, &approve(&StageId::nth(stage), "dir"))
                .unwrap();
        }

        let stored = reviews.require(&review.id).unwrap();
        assert_eq!(stored.status, ReviewStatus::Approved);
        assert!((reviews.progress(&review.id).unwrap() - 100.0).abs() < f64::EPSILON);

        let mut kinds = Vec::new();
        let mut last_seq = 0;
        while let Ok(record) = rx.try_recv() {
            assert!(record.seq > last_seq);
            assert_eq!(record.correlation_id.as_deref(), Some("req-1"));
            last_seq = record.seq;
            kinds.push(record.kind().unwrap_or_default().to_string());
        }
        assert_eq!(kinds.first().map(String::as_str), Some("ReviewCreated"));
        assert_eq!(kinds.last().map(String::as_str), Some("ReviewApproved"));
        assert_eq!(kinds.iter().filter(|k| *k == "StageAdvanced").count(), 2);
    }

    #[test]
    fn test_engine_errors_leave_store_untouched() {
        let kazi = kazi();
        let reviews = kazi.reviews();
        let review = reviews
            .create(&ctx(), "Quick Approval", input("Teaser"))
            .unwrap();

        let err = reviews
            .decide(&ctx(), &review.id, &approve(&StageId::nth(1), "a"))
            .unwrap_err();
        assert_matches!(
            err,
            KaziError::Workflow(WorkflowError::InvalidState {
                status: ReviewStatus::Draft
            })
        );
        assert_eq!(reviews.require(&review.id).unwrap(), review);
    }

    #[test]
    fn test_unknown_template_and_review() {
        let kazi = kazi();
        let reviews = kazi.reviews();
        assert_matches!(
            reviews.create(&ctx(), "Missing", input("x")),
            Err(KaziError::Template(_))
        );
        assert_matches!(
            reviews.open(&ctx(), &ReviewId::generate()),
            Err(KaziError::Store(StoreError::ReviewNotFound { .. }))
        );
    }

    #[test]
    fn test_stale_version_is_refused() {
        let kazi = kazi();
        let reviews = kazi.reviews();
        let review = reviews
            .create(&ctx(), "Agency Production", input("Spot"))
            .unwrap();
        let opened = reviews.open(&ctx(), &review.id).unwrap();

        reviews
            .decide_checked(&ctx(), &review.id, opened.version, &approve(&StageId::nth(1), "cd"))
            .unwrap();
        let err = reviews
            .decide_checked(&ctx(), &review.id, opened.version, &approve(&StageId::nth(1), "x"))
            .unwrap_err();
        assert_matches!(
            err,
            KaziError::Store(StoreError::VersionConflict { expected, found, .. })
                if expected == opened.version && found == opened.version + 1
        );
    }

    #[test]
    fn test_notifications_respect_settings() {
        let kazi = kazi();
        let mut rx = kazi.event_bus.subscribe();
        let mut details = input("Silent");
        details.settings = ReviewSettings {
            send_notifications: false,
            ..ReviewSettings::default()
        };
        let review = kazi
            .reviews()
            .create(&ctx(), "Quick Approval", details)
            .unwrap();
        kazi.reviews().open(&ctx(), &review.id).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unserializable_notification_is_dropped() {
        let kazi = kazi();
        let mut rx = kazi.event_bus.subscribe();
        let broken: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);

        kazi.publish(&ctx(), "Broken", &broken);
        assert!(rx.try_recv().is_err());

        let review = kazi
            .reviews()
            .create(&ctx(), "Quick Approval", input("After"))
            .unwrap();
        let record = rx.try_recv().unwrap();
        assert_eq!(record.seq, 1);
        assert_eq!(record.body["payload"]["review"]["id"], review.id.as_str());
    }

    #[test]
    fn test_list_and_dashboard() {
        let kazi = kazi();
        let reviews = kazi.reviews();
        let a = reviews.create(&ctx(), "Quick Approval", input("A")).unwrap();
        reviews.create(&ctx(), "Quick Approval", input("B")).unwrap();
        reviews.open(&ctx(), &a.id).unwrap();
        reviews
            .decide(&ctx(), &a.id, &approve(&StageId::nth(1), "boss"))
            .unwrap();

        let now = Utc::now();
        assert_eq!(reviews.list(ReviewFilter::All, now).unwrap().len(), 2);
        let approved = reviews.list(ReviewFilter::Approved, now).unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].title, "A");

        let stats = reviews.dashboard(now).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.draft, 1);
        assert!((stats.average_progress - 50.0).abs() < f64::EPSILON);

        let stages = reviews.stages(&a.id).unwrap();
        assert!(stages[0].complete);
    }
}
