use std::path::{Path, PathBuf};

use chrono::Utc;
use haggle_common::listing::{Listing, ListingId, NewListing};
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{blocking, csv_file};
use crate::error::StoreError;

/// Column order of the listings file.
pub const LISTING_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "price",
    "location",
    "imageUrl",
    "datePosted",
    "sellerName",
];

/// The listing catalogue, backed by a single CSV file that is re-read on
/// every call. Lookups are linear; the catalogue is expected to stay small.
pub struct ListingStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All listings in file order. A missing file is an empty catalogue; a
    /// file that cannot be read or parsed is an error.
    pub async fn load(&self) -> Result<Vec<Listing>, StoreError> {
        let path = self.path.clone();
        blocking(move || Ok(csv_file::read_all(&path)?.unwrap_or_default())).await
    }

    /// All listings in file order, or an empty list if the file cannot be
    /// read. The failure is logged; use [`ListingStore::load`] to see it.
    pub async fn list(&self) -> Vec<Listing> {
        self.load().await.unwrap_or_else(|e| {
            error!("Error reading listings from {}: {e}", self.path.display());
            Vec::new()
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError> {
        let listings = self.load().await?;
        Ok(listings.into_iter().find(|l| l.id.as_str() == id))
    }

    /// Append a new listing. The id is one past the largest numeric id in the
    /// file and the posting date is today (UTC).
    pub async fn add(&self, new_listing: NewListing) -> Result<Listing, StoreError> {
        new_listing.validate()?;

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let date_posted = Utc::now().date_naive().format("%Y-%m-%d").to_string();

        let listing = blocking(move || {
            let existing: Vec<Listing> = csv_file::read_all(&path)?.unwrap_or_default();
            let listing = new_listing.into_listing(next_id(&existing), date_posted);

            let mut file = csv_file::open_for_append(&path, true)?;
            csv_file::append(&mut file, LISTING_COLUMNS, std::slice::from_ref(&listing))?;
            Ok(listing)
        })
        .await?;

        info!(id = %listing.id, title = %listing.title, "listing created");
        Ok(listing)
    }
}

fn next_id(existing: &[Listing]) -> ListingId {
    let next = existing
        .iter()
        .filter_map(|l| l.id.as_number())
        .max()
        .map_or(1, |n| n + 1);
    ListingId(next.to_string())
}
