// Application state (AppState)

use crate::auth::authenticator::Authenticator;
use crate::auth::token::TokenIssuer;
use crate::core::config::Config;
use crate::db::Store;
use crate::proxy_tools::ProxyTester;
use crate::remote::RemoteClient;
use crate::security::LoginLimiter;
use std::sync::Arc;

/// Shared application state, cloned into every handler via Arc
pub struct AppState {
    /// Embedded database, also serves as the authenticator's user
    /// repository
    pub store: Arc<Store>,

    /// Login procedure over the store
    pub authenticator: Authenticator<Arc<Store>>,

    /// Access token signing and validation
    pub token_issuer: TokenIssuer,

    /// Client for the upstream account service
    pub remote: RemoteClient,

    /// Proxy liveness prober
    pub proxy_tester: Arc<ProxyTester>,

    /// Per-IP login attempt limiter
    pub login_limiter: Arc<LoginLimiter>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> anyhow::Result<Self> {
        let store = Arc::new(store);

        Ok(Self {
            authenticator: Authenticator::new(Arc::clone(&store)),
            token_issuer: TokenIssuer::new(&config.auth)?,
            remote: RemoteClient::new(&config.remote)?,
            proxy_tester: Arc::new(ProxyTester::new(config.proxy_check.clone())),
            login_limiter: Arc::new(LoginLimiter::new(
                config.security.max_login_attempts_per_minute,
            )),
            store,
            config: Arc::new(config),
        })
    }
}
