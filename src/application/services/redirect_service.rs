//! Public redirect path: resolve a short code and count the visit.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::LinkService;
use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Default bound on visit recording, retries included.
pub const DEFAULT_VISIT_TIMEOUT: Duration = Duration::from_millis(250);

/// Retries after the first failed increment.
const VISIT_RETRIES: usize = 2;

/// Result of resolving a short code.
///
/// A lookup starts in the resolving state and ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Resolved {
        link_id: i64,
        destination: String,
        /// Counter after this visit, or `None` if recording it failed.
        click_count: Option<i64>,
    },
    NotFound,
}

/// Resolves short codes for anonymous visitors.
///
/// Visit counting is best-effort: the destination is returned even when the
/// counter update fails or times out.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    link_service: Arc<LinkService<L>>,
    visit_timeout: Duration,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(link_service: Arc<LinkService<L>>) -> Self {
        Self {
            link_service,
            visit_timeout: DEFAULT_VISIT_TIMEOUT,
        }
    }

    /// Sets the upper bound on recording a visit.
    pub fn with_visit_timeout(mut self, timeout: Duration) -> Self {
        self.visit_timeout = timeout;
        self
    }

    /// Resolves `code` and records the visit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] only if the lookup itself fails. Failures while
    /// recording the visit are logged and counted, never returned.
    pub async fn resolve(&self, code: &str) -> Result<RedirectOutcome, AppError> {
        let link = match self.link_service.resolve_by_code(code).await {
            Ok(link) => link,
            Err(AppError::NotFound { .. }) => {
                counter!("shortlink_redirects_total", "outcome" => "not_found").increment(1);
                debug!(short_code = code, "Short code not found");
                return Ok(RedirectOutcome::NotFound);
            }
            Err(e) => return Err(e),
        };

        counter!("shortlink_redirects_total", "outcome" => "resolved").increment(1);

        let click_count = self.record_visit(&link).await;

        Ok(RedirectOutcome::Resolved {
            link_id: link.id,
            destination: link.original_url,
            click_count,
        })
    }

    /// Increments the counter, retrying transient store errors within the timeout.
    async fn record_visit(&self, link: &Link) -> Option<i64> {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_millis(100))
            .map(jitter)
            .take(VISIT_RETRIES);

        let (link_id, observed_count) = (link.id, link.click_count);
        let link_service = self.link_service.as_ref();

        let attempt = RetryIf::spawn(
            strategy,
            move || link_service.record_visit(link_id, observed_count),
            |e: &AppError| e.is_transient(),
        );

        match tokio::time::timeout(self.visit_timeout, attempt).await {
            Ok(Ok(count)) => Some(count),
            Ok(Err(e)) => {
                counter!("shortlink_visit_record_failures_total").increment(1);
                warn!(link_id = link.id, error = %e, "Failed to record visit");
                None
            }
            Err(_) => {
                counter!("shortlink_visit_record_failures_total").increment(1);
                warn!(
                    link_id = link.id,
                    timeout_ms = self.visit_timeout.as_millis() as u64,
                    "Recording visit timed out"
                );
                None
            }
        }
    }
}
