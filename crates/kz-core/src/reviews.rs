use crate::error::StoreError;
use crate::types::{ClientReview, ReviewId};

/// Persistence seam for review snapshots.
///
/// `replace` is a compare-and-swap: it succeeds only while the stored
/// version still equals `expected_version`.
pub trait ReviewRepository {
    fn insert(&self, review: &ClientReview) -> Result<ClientReview, StoreError>;
    fn get(&self, id: &ReviewId) -> Result<Option<ClientReview>, StoreError>;
    fn list(&self) -> Result<Vec<ClientReview>, StoreError>;
    fn replace(
        &self,
        review: &ClientReview,
        expected_version: u64,
    ) -> Result<ClientReview, StoreError>;
}
