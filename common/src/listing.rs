use std::fmt;

use serde::{Deserialize, Serialize};

/// Listing identifier as it appears in the listings file.
///
/// Ids assigned by the store are decimal counters, but hand-edited files may
/// use any string, so no numeric form is assumed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value of the id, if it is one.
    pub fn as_number(&self) -> Option<u64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(s: &str) -> Self {
        ListingId(s.to_string())
    }
}

/// An item a seller has put up for sale.
///
/// Field names serialize in camelCase, which is both the JSON shape served by
/// the API and the header row of the listings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Asking price in dollars.
    pub price: f64,
    pub location: String,
    pub image_url: String,
    /// Calendar date the listing went up, `YYYY-MM-DD` for listings created
    /// through the API. Older rows may hold any date string.
    pub date_posted: String,
    pub seller_name: String,
}

/// The fields a seller supplies when posting a listing. The id and posting
/// date are filled in by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image_url: String,
    pub seller_name: String,
}

/// Why a [`NewListing`] was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingError {
    #[error("listing title is required")]
    MissingTitle,
    #[error("seller name is required")]
    MissingSeller,
    #[error("price must be a finite, non-negative amount (got {0})")]
    InvalidPrice(f64),
}

impl NewListing {
    pub fn validate(&self) -> Result<(), ListingError> {
        if self.title.trim().is_empty() {
            return Err(ListingError::MissingTitle);
        }
        if self.seller_name.trim().is_empty() {
            return Err(ListingError::MissingSeller);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ListingError::InvalidPrice(self.price));
        }
        Ok(())
    }

    /// Complete the listing with the id and date chosen by the store.
    pub fn into_listing(self, id: ListingId, date_posted: String) -> Listing {
        Listing {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            location: self.location,
            image_url: self.image_url,
            date_posted,
            seller_name: self.seller_name,
        }
    }
}
