//! User, organization, repository and branch lookups.

use crate::github::{ApiCall, Branch, Endpoint, GitHubClient, Organization, Repository, UserMetadata};

/// Identity operations.
pub trait UserOps {
    /// The authenticated user.
    fn user(&self) -> ApiCall<'_, UserMetadata>;

    /// Organizations `login` belongs to.
    fn orgs(&self, login: &str) -> ApiCall<'_, Vec<Organization>>;
}

/// Repository listing operations.
pub trait RepoOps {
    /// One page of repositories.
    ///
    /// With `personal` set, lists repositories the user owns or collaborates
    /// on, most recently updated first, and `org` is ignored. Otherwise lists
    /// the repositories of `org`.
    fn repos(&self, page: u32, org: &str, personal: bool) -> ApiCall<'_, Vec<Repository>>;

    /// Branches of a repository.
    fn branches(&self, owner: &str, repo: &str) -> ApiCall<'_, Vec<Branch>>;
}

impl UserOps for GitHubClient {
    fn user(&self) -> ApiCall<'_, UserMetadata> {
        self.get(Endpoint::new(["user"]))
    }

    fn orgs(&self, login: &str) -> ApiCall<'_, Vec<Organization>> {
        self.get(Endpoint::new(["users"]).segment(login).segment("orgs"))
    }
}

impl RepoOps for GitHubClient {
    fn repos(&self, page: u32, org: &str, personal: bool) -> ApiCall<'_, Vec<Repository>> {
        let endpoint = if personal {
            Endpoint::new(["user", "repos"])
                .query("page", page)
                .query_list("affiliation", ["owner", "collaborator"])
                .query("sort", "updated")
                .query("direction", "desc")
        } else {
            Endpoint::new(["orgs"])
                .segment(org)
                .segment("repos")
                .query("page", page)
        };
        self.get(endpoint)
    }

    fn branches(&self, owner: &str, repo: &str) -> ApiCall<'_, Vec<Branch>> {
        self.get(
            Endpoint::new(["repos"])
                .segment(owner)
                .segment(repo)
                .segment("branches"),
        )
    }
}
