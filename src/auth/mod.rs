//! OAuth authorization through a host dialog.
//!
//! The flow:
//! 1. Build the authorize URL from the configured client id, redirect URI and scope
//! 2. Open it in a modal dialog provided by the [`DialogHost`]
//! 3. Wait for the single callback message, closing the dialog as soon as it arrives
//! 4. Interpret the message with [`parse_callback`]
//!
//! Exchanging the token for a profile is done by
//! [`crate::session::GitHubService::login`].

mod console;
mod dialog;

pub use console::ConsoleDialog;
pub use dialog::{DialogEvent, DialogHandle, DialogHost};

use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{PublishError, Result};

/// Build the OAuth authorize URL.
pub fn authorize_url(config: &Config) -> Result<Url> {
    let mut url = Url::parse(&config.authorize_url)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scope);
    Ok(url)
}

/// Interpret a dialog callback message.
///
/// An empty message means no token was issued. A message without an
/// `access_token` is the provider's error object and is returned as
/// [`PublishError::Rejected`]. Anything else is parsed as JSON for token
/// extraction.
pub fn parse_callback(message: &str) -> Result<Value> {
    if message.is_empty() {
        return Err(PublishError::NoTokenReceived);
    }

    if !message.contains("access_token") {
        let error: Value = serde_json::from_str(message)?;
        return Err(PublishError::Rejected(error));
    }

    Ok(serde_json::from_str(message)?)
}
