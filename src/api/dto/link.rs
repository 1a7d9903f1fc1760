//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

use crate::domain::entities::{Link, LinkChange, LinkField, OwnerId};
use crate::error::AppError;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

/// JSON representation of a link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub owner_id: OwnerId,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl LinkResponse {
    /// Builds the response, deriving `short_url` from the public base URL.
    pub fn from_link(link: Link, public_base_url: &str) -> Self {
        let short_url = format!(
            "{}/{}",
            public_base_url.trim_end_matches('/'),
            link.short_code
        );

        Self {
            id: link.id,
            original_url: link.original_url,
            short_code: link.short_code,
            short_url,
            owner_id: link.owner_id,
            click_count: link.click_count,
            created_at: link.created_at,
        }
    }
}

/// Response for `GET /api/links`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub total: usize,
}

/// Request body for `PATCH /api/links/{id}`.
///
/// A sparse JSON object keyed by field name. Only present keys are changed:
///
/// ```json
/// { "original_url": "https://new.example.com", "click_count": 40 }
/// ```
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct UpdateLinkRequest(pub Map<String, Value>);

impl UpdateLinkRequest {
    /// Converts the body into typed changes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidField`] for an unknown key.
    /// Returns [`AppError::Validation`] if a value has the wrong JSON type.
    pub fn into_changes(self) -> Result<Vec<LinkChange>, AppError> {
        self.0
            .into_iter()
            .map(|(key, value)| {
                let field = LinkField::parse(&key)?;
                match (field, value) {
                    (LinkField::OriginalUrl, Value::String(url)) => Ok(LinkChange::OriginalUrl(url)),
                    (LinkField::ShortCode, Value::String(code)) => Ok(LinkChange::ShortCode(code)),
                    (LinkField::ClickCount, Value::Number(n)) => n
                        .as_i64()
                        .map(LinkChange::ClickCount)
                        .ok_or_else(|| type_error(field, "an integer")),
                    (LinkField::ClickCount, _) => Err(type_error(field, "an integer")),
                    (_, _) => Err(type_error(field, "a string")),
                }
            })
            .collect()
    }
}

fn type_error(field: LinkField, expected: &str) -> AppError {
    AppError::bad_request(
        format!("Field '{field}' must be {expected}"),
        json!({ "field": field.as_str() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> UpdateLinkRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_into_changes_maps_known_fields() {
        let changes = request(json!({
            "original_url": "https://new.example.com",
            "short_code": "fresh",
            "click_count": 12
        }))
        .into_changes()
        .unwrap();

        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&LinkChange::OriginalUrl("https://new.example.com".to_string())));
        assert!(changes.contains(&LinkChange::ShortCode("fresh".to_string())));
        assert!(changes.contains(&LinkChange::ClickCount(12)));
    }

    #[test]
    fn test_into_changes_rejects_unknown_field() {
        let err = request(json!({ "owner_id": 9 })).into_changes().unwrap_err();

        assert!(matches!(err, AppError::InvalidField { .. }));
    }

    #[test]
    fn test_into_changes_rejects_wrong_type() {
        let err = request(json!({ "click_count": "ten" }))
            .into_changes()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = request(json!({ "short_code": 5 })).into_changes().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_into_changes_empty_body() {
        assert!(request(json!({})).into_changes().unwrap().is_empty());
    }

    #[test]
    fn test_short_url_joins_base() {
        let link = Link::new(
            1,
            "https://example.com".to_string(),
            "abcde".to_string(),
            OwnerId(7),
            0,
            Utc::now(),
        );

        let response = LinkResponse::from_link(link, "https://s.example.com/");

        assert_eq!(response.short_url, "https://s.example.com/abcde");
        assert_eq!(response.owner_id, OwnerId(7));
    }
}
