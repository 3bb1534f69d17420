//! File-backed stores for listings and conversations.

pub mod conversation;
pub mod csv_file;
pub mod listing;

pub use conversation::ConversationStore;
pub use listing::ListingStore;

use crate::error::StoreError;

/// Run blocking file work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
