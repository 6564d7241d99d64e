use crate::error::StoreError;
use crate::reviews::ReviewRepository;
use crate::store::Store;
use crate::types::{ClientReview, ReviewId};
use crate::KaziError;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// In-memory store. Transactions snapshot the map and restore it when the
/// closure fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    reviews: RefCell<BTreeMap<ReviewId, ClientReview>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reviews(reviews: Vec<ClientReview>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut map = store.reviews.borrow_mut();
            for review in reviews {
                if map.contains_key(&review.id) {
                    return Err(StoreError::ReviewExists { id: review.id });
                }
                map.insert(review.id.clone(), review);
            }
        }
        Ok(store)
    }

    /// All reviews, oldest `created_at` first. Ties fall back to id order.
    pub fn snapshot(&self) -> Vec<ClientReview> {
        let mut reviews: Vec<ClientReview> = self.reviews.borrow().values().cloned().collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        reviews
    }
}

pub struct MemoryReviews<'a> {
    store: &'a MemoryStore,
}

impl ReviewRepository for MemoryReviews<'_> {
    fn insert(&self, review: &ClientReview) -> Result<ClientReview, StoreError> {
        let mut map = self.store.reviews.borrow_mut();
        if map.contains_key(&review.id) {
            return Err(StoreError::ReviewExists {
                id: review.id.clone(),
            });
        }
        map.insert(review.id.clone(), review.clone());
        Ok(review.clone())
    }

    fn get(&self, id: &ReviewId) -> Result<Option<ClientReview>, StoreError> {
        Ok(self.store.reviews.borrow().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ClientReview>, StoreError> {
        Ok(self.store.snapshot())
    }

    fn replace(
        &self,
        review: &ClientReview,
        expected_version: u64,
    ) -> Result<ClientReview, StoreError> {
        let mut map = self.store.reviews.borrow_mut();
        let Some(stored) = map.get_mut(&review.id) else {
            return Err(StoreError::ReviewNotFound {
                id: review.id.clone(),
            });
        };
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: review.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = review.clone();
        Ok(review.clone())
    }
}

impl Store for MemoryStore {
    type Reviews<'a>
        = MemoryReviews<'a>
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_> {
        MemoryReviews { store: self }
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, KaziError>
    where
        F: FnOnce(&Self) -> Result<T, KaziError>,
    {
        let saved = self.reviews.borrow().clone();
        let result = f(self);
        if result.is_err() {
            *self.reviews.borrow_mut() = saved;
        }
        result
    }
}
