//! Signed-in GitHub session.
//!
//! [`GitHubService`] runs the authorization handshake, keeps the resulting
//! [`UserProfile`] in memory and in the profile store, and hands out an
//! authenticated [`GitHubClient`] for API calls.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{self, DialogHost};
use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::github::{GitHubClient, Organization, Session, Token, UserMetadata, UserOps};
use crate::store::{FileStore, KeyValueStore, Storage};

/// Storage namespace for profiles.
pub const PROFILE_NAMESPACE: &str = "Profile";

/// Storage namespace holding the login of the most recently used profile.
pub const CURRENT_NAMESPACE: &str = "CurrentProfile";

const CURRENT_KEY: &str = "login";

/// Who is signed in, where they belong, and the token to act as them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: UserMetadata,
    pub orgs: Vec<Organization>,
    pub token: Token,
}

/// Orchestrates login, profile persistence and authenticated API access.
pub struct GitHubService<H> {
    config: Config,
    client: GitHubClient,
    host: H,
    profile: Option<UserProfile>,
    storage: Storage<UserProfile>,
    current: Storage<String>,
}

impl<H: DialogHost> GitHubService<H> {
    /// Create a service storing profiles on disk under the configured storage dir.
    pub fn new(config: Config, host: H) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_dir()?));
        Ok(Self::with_store(config, host, backend))
    }

    /// Create a service on an explicit storage backend.
    pub fn with_store(config: Config, host: H, backend: Arc<dyn KeyValueStore>) -> Self {
        let client = GitHubClient::from_config(&config);
        Self {
            config,
            client,
            host,
            profile: None,
            storage: Storage::new(PROFILE_NAMESPACE, Arc::clone(&backend)),
            current: Storage::new(CURRENT_NAMESPACE, backend),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The OAuth authorize URL the login dialog opens.
    pub fn authorize_url(&self) -> Result<Url> {
        auth::authorize_url(&self.config)
    }

    /// Sign in through the host dialog.
    ///
    /// Fetches the user and then that user's organizations, stores the
    /// composed profile and returns it. Every failure ends the attempt and
    /// puts back the session the client had before; call again to retry.
    pub fn login(&mut self) -> Result<UserProfile> {
        if !self.host.in_host() {
            return Err(PublishError::NotInHost);
        }

        let url = self.authorize_url()?;
        info!("Opening GitHub authorization dialog");
        let dialog = self.host.open(&url, self.config.dialog)?;
        let message = dialog.receive()?;

        let payload = auth::parse_callback(&message).inspect_err(|e| {
            warn!(error = %e, "Authorization callback rejected");
        })?;

        let previous = self.client.session().cloned();
        let token = self
            .client
            .token(&payload)
            .ok_or(PublishError::UnableToParseToken)?;

        let result = self.fetch_profile(token).and_then(|profile| {
            self.set_profile(Some(profile.clone()))?;
            Ok(profile)
        });

        match result {
            Ok(profile) => {
                info!(
                    login = %profile.user.login,
                    orgs = profile.orgs.len(),
                    "Signed in to GitHub"
                );
                Ok(profile)
            }
            Err(e) => {
                warn!(error = %e, "Failed to sign in to GitHub");
                self.client.set_session(previous);
                Err(e)
            }
        }
    }

    fn fetch_profile(&self, token: Token) -> Result<UserProfile> {
        let user = self.client.user().send()?;
        debug!(login = %user.login, "Fetched user");
        let orgs = self.client.orgs(&user.login).send()?;
        Ok(UserProfile { user, orgs, token })
    }

    /// Forget every stored profile and drop the session.
    pub fn logout(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.current.clear()?;
        self.profile = None;
        self.client.clear_session();
        info!("Signed out of GitHub");
        Ok(())
    }

    /// The current profile, loading it from storage on first access.
    ///
    /// The most recently set profile wins; if it is gone, any stored one is
    /// used. Loading a stored profile also restores its token on the client.
    pub fn profile(&mut self) -> Result<Option<&UserProfile>> {
        if self.profile.is_none() {
            if let Some(stored) = self.stored_profile()? {
                debug!(login = %stored.user.login, "Restored profile from storage");
                self.client
                    .set_session(Some(Session::new(stored.token.clone())));
                self.profile = Some(stored);
            }
        }
        Ok(self.profile.as_ref())
    }

    fn stored_profile(&self) -> Result<Option<UserProfile>> {
        if let Some(login) = self.current.get(CURRENT_KEY)? {
            if let Some(profile) = self.storage.get(&login)? {
                return Ok(Some(profile));
            }
            debug!(%login, "Last used profile is no longer stored");
        }
        self.storage.first()
    }

    /// Replace the current profile and persist it under the user's login.
    ///
    /// The login is also recorded as the last used one, so a later
    /// [`profile`](Self::profile) on a fresh service restores it. `None` is
    /// ignored.
    pub fn set_profile(&mut self, value: Option<UserProfile>) -> Result<()> {
        let Some(profile) = value else {
            return Ok(());
        };
        self.storage.add(&profile.user.login, profile.clone())?;
        self.current.add(CURRENT_KEY, profile.user.login.clone())?;
        self.client
            .set_session(Some(Session::new(profile.token.clone())));
        self.profile = Some(profile);
        Ok(())
    }

    /// The API client, with the stored session restored if there is one.
    ///
    /// Calls made without a signed-in profile fail with
    /// [`PublishError::NotAuthenticated`].
    pub fn api(&mut self) -> Result<&GitHubClient> {
        self.profile()?;
        Ok(&self.client)
    }

    /// The API client as it is, without touching storage.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }
}
