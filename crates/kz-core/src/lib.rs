pub mod dashboard;
pub mod error;
pub mod events;
pub mod kazi;
pub mod memory;
pub mod reviews;
pub mod store;
pub mod templates;
pub mod validation;
pub mod workflow;

pub mod types;

pub use crate::error::{KaziError, StoreError, TemplateError, WorkflowError};
pub use crate::kazi::{Kazi, RequestContext};
pub use crate::memory::MemoryStore;
pub use crate::store::Store;
pub use crate::templates::TemplateCatalog;
