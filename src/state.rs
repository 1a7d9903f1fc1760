//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::link_service::{DEFAULT_MAX_CODE_ATTEMPTS, DEFAULT_STORE_TIMEOUT};
use crate::application::services::redirect_service::DEFAULT_VISIT_TIMEOUT;
use crate::application::services::{AuthService, LinkService, RedirectService};
use crate::config::Config;
use crate::domain::repositories::{LinkRepository, TokenRepository};

/// Service tuning shared by the HTTP server and embedders.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub public_base_url: String,
    pub token_signing_secret: String,
    pub store_timeout: Duration,
    pub visit_timeout: Duration,
    pub max_code_attempts: usize,
}

impl ServiceSettings {
    /// Settings with default timeouts and attempt budget.
    pub fn new(public_base_url: impl Into<String>, token_signing_secret: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            token_signing_secret: token_signing_secret.into(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            visit_timeout: DEFAULT_VISIT_TIMEOUT,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            token_signing_secret: config.token_signing_secret.clone(),
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            visit_timeout: Duration::from_millis(config.visit_timeout_ms),
            max_code_attempts: config.code_max_attempts,
        }
    }
}

/// Services behind trait objects, so the same router serves the PostgreSQL
/// and in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub redirect_service: Arc<RedirectService<dyn LinkRepository>>,
    pub auth_service: Arc<AuthService<dyn TokenRepository>>,
    pub public_base_url: String,
}

impl AppState {
    /// Wires the services over the given repositories.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        token_repository: Arc<dyn TokenRepository>,
        settings: ServiceSettings,
    ) -> Self {
        let link_service = Arc::new(
            LinkService::new(link_repository)
                .with_store_timeout(settings.store_timeout)
                .with_max_code_attempts(settings.max_code_attempts),
        );

        let redirect_service = Arc::new(
            RedirectService::new(link_service.clone()).with_visit_timeout(settings.visit_timeout),
        );

        let auth_service = Arc::new(AuthService::new(
            token_repository,
            settings.token_signing_secret,
        ));

        Self {
            link_service,
            redirect_service,
            auth_service,
            public_base_url: settings.public_base_url,
        }
    }
}
