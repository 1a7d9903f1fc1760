//! Link entity representing a shortened URL mapping owned by one principal.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;

use super::OwnerId;
use crate::error::AppError;

/// A shortened URL link with its owner and click counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub owner_id: OwnerId,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        id: i64,
        original_url: String,
        short_code: String,
        owner_id: OwnerId,
        click_count: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            owner_id,
            click_count,
            created_at,
        }
    }

    /// Returns true if `owner` holds this link.
    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner_id == owner
    }
}

/// Input data for creating a link together with its owner association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub owner_id: OwnerId,
}

/// The fields an owner may change on an existing link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkField {
    OriginalUrl,
    ShortCode,
    ClickCount,
}

impl LinkField {
    pub const ALL: [LinkField; 3] = [
        LinkField::OriginalUrl,
        LinkField::ShortCode,
        LinkField::ClickCount,
    ];

    /// Public name of the field as used in API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkField::OriginalUrl => "original_url",
            LinkField::ShortCode => "short_code",
            LinkField::ClickCount => "click_count",
        }
    }

    /// Resolves a caller-supplied field name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidField`] for names outside the allow-list.
    pub fn parse(name: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| {
                AppError::invalid_field(
                    format!("Field '{name}' cannot be updated"),
                    json!({
                        "field": name,
                        "allowed": Self::ALL.map(LinkField::as_str),
                    }),
                )
            })
    }
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed change to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChange {
    OriginalUrl(String),
    ShortCode(String),
    ClickCount(i64),
}

impl LinkChange {
    pub fn field(&self) -> LinkField {
        match self {
            LinkChange::OriginalUrl(_) => LinkField::OriginalUrl,
            LinkChange::ShortCode(_) => LinkField::ShortCode,
            LinkChange::ClickCount(_) => LinkField::ClickCount,
        }
    }
}
