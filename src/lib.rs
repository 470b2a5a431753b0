//! # GitHub Publish
//!
//! Sign in to GitHub from a host application and publish documents to
//! repositories.
//!
//! This crate provides:
//! - An OAuth authorization handshake through a host-provided dialog
//! - A persisted user profile (user, organizations, token)
//! - Lazy, inspectable calls for the repository, branch, contents and
//!   commit endpoints
//! - Starter templates for new documents
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use github_publish::prelude::*;
//!
//! let config = Config::load(None)?;
//! let mut service = GitHubService::new(config, ConsoleDialog::new())?;
//!
//! let profile = match service.profile()?.cloned() {
//!     Some(profile) => profile,
//!     None => service.login()?,
//! };
//! println!("Signed in as {}", profile.user.login);
//!
//! for repo in service.api()?.repos(1, "", true).send()? {
//!     println!("{}", repo.full_name);
//! }
//! # Ok::<(), github_publish::error::PublishError>(())
//! ```
//!
//! ## Publishing a file
//!
//! ```rust,no_run
//! use github_publish::prelude::*;
//!
//! # let mut service = GitHubService::new(Config::default(), ConsoleDialog::new())?;
//! let api = service.api()?;
//! let body = FileCommit::new("Add getting started guide", "# Getting started\n")
//!     .branch("main");
//! let update = api.create_file("my-org", "docs", "guides/getting-started.md", &body).send()?;
//! println!("Committed {}", update.commit.sha);
//! # Ok::<(), github_publish::error::PublishError>(())
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod session;
pub mod store;
pub mod templates;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::auth::{ConsoleDialog, DialogEvent, DialogHandle, DialogHost};
    pub use crate::config::{Config, DialogSize};
    pub use crate::error::{PublishError, Result};
    pub use crate::github::{
        ApiCall, Branch, Commit, ContentOps, ContentUpdate, Contents, FileCommit, GitHubClient,
        Organization, RepoOps, Repository, Session, Token, UserMetadata, UserOps,
    };
    pub use crate::session::{GitHubService, UserProfile};
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore, Storage};
    pub use crate::templates::Template;
}

pub use prelude::*;
