/// JSON HTTP client with standardized responses.
pub mod api_client;
/// The read contract viewers poll, and its HTTP implementation.
pub mod feed;

pub use api_client::{ApiClient, ApiResponse, FeedError};
pub use feed::{FireFeed, HttpFireFeed, LocalFires};
