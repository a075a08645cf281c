//! Article extraction with optional cached, rate-limited summaries.

pub mod app_state;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod summary;

pub use app_state::AppState;
pub use extractor::{ArticleResult, ExtractError, Extractor};
