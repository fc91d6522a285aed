//! In-memory todo server: the task store and the REST surface over it.

pub mod api;
pub mod config;
pub mod error;
pub mod store;

pub use api::{router, AppState};
pub use config::Config;
pub use error::{ApiError, StoreError};
pub use store::TaskStore;
