//! GitHub API integration for publishing documents.
//!
//! This module provides a client for the parts of the GitHub API a
//! publishing workflow needs:
//! - Identify the signed-in user and their organizations
//! - List repositories, branches, files and file history
//! - Create and update files, and upload images
//!
//! Every operation returns an [`ApiCall`] that is sent lazily, so the
//! request can be inspected before it goes out.
//!
//! # Example
//!
//! ```rust,no_run
//! use github_publish::github::{ContentOps, GitHubClient, RepoOps, Token};
//!
//! let token = Token::new("gho_your_token_here").unwrap();
//! let client = GitHubClient::new().with_token(token);
//!
//! for repo in client.repos(1, "", true).send()? {
//!     println!("{}", repo.full_name);
//! }
//!
//! let readme = client.file("my-org", "docs", "main", "README.md").send()?;
//! println!("{}", readme);
//! # Ok::<(), github_publish::error::PublishError>(())
//! ```

mod client;
mod contents;
mod endpoint;
mod models;
mod repos;

pub use client::{ApiCall, GitHubClient, MediaType, Session, Token};
pub use contents::ContentOps;
pub use endpoint::Endpoint;
pub use models::{
    Branch, BranchCommit, Commit, CommitAccount, CommitDetail, CommitRef, ContentKind,
    ContentUpdate, Contents, FileCommit, Organization, RepoOwner, Repository, Signature,
    UserMetadata,
};
pub use repos::{RepoOps, UserOps};
