pub mod client;
pub mod encoding;
pub mod errors;
pub mod types;

pub use client::{Fetcher, USER_AGENT};
pub use encoding::detect_and_transcode;
pub use errors::FetchError;
pub use types::{Decoded, PageResponse};
