use crate::reviews::ReviewRepository;
use crate::KaziError;

pub trait Store {
    type Reviews<'a>: ReviewRepository
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, KaziError>
    where
        F: FnOnce(&Self) -> Result<T, KaziError>;
}
