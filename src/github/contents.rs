//! Repository contents and history.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::github::{ApiCall, Commit, ContentUpdate, Contents, Endpoint, GitHubClient};

/// File listing, reading, history and write operations.
pub trait ContentOps {
    /// Entries of a directory (the repository root when `path` is `None`) at `branch`.
    fn files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: Option<&str>,
    ) -> ApiCall<'_, Vec<Contents>>;

    /// Raw content of a file at `branch`.
    fn file(&self, owner: &str, repo: &str, branch: &str, path: &str) -> ApiCall<'_, String>;

    /// Commits on `branch` touching `path`, up to the moment the call is built.
    fn commits(&self, owner: &str, repo: &str, branch: &str, path: &str) -> ApiCall<'_, Vec<Commit>> {
        self.commits_until(owner, repo, branch, path, Utc::now())
    }

    /// Commits on `branch` touching `path`, up to `until`.
    fn commits_until(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
        until: DateTime<Utc>,
    ) -> ApiCall<'_, Vec<Commit>>;

    /// Metadata (including the blob sha) of a single entry at `branch`.
    fn get_sha(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: Option<&str>,
    ) -> ApiCall<'_, Contents>;

    /// Create a file. `body` is typically a [`crate::github::FileCommit`].
    fn create_file<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate>;

    /// Replace a file. The body must carry the sha of the blob being replaced.
    fn update_file<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate>;

    /// Upload an image referenced from a published document.
    fn upload_image<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        file_name: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate>;
}

fn contents_endpoint(owner: &str, repo: &str) -> Endpoint {
    Endpoint::new(["repos"])
        .segment(owner)
        .segment(repo)
        .segment("contents")
}

impl ContentOps for GitHubClient {
    fn files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: Option<&str>,
    ) -> ApiCall<'_, Vec<Contents>> {
        self.get(
            contents_endpoint(owner, repo)
                .optional_path(path)
                .query("ref", branch),
        )
    }

    fn file(&self, owner: &str, repo: &str, branch: &str, path: &str) -> ApiCall<'_, String> {
        self.get_raw(contents_endpoint(owner, repo).path(path).query("ref", branch))
    }

    fn commits_until(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
        until: DateTime<Utc>,
    ) -> ApiCall<'_, Vec<Commit>> {
        self.get(
            Endpoint::new(["repos"])
                .segment(owner)
                .segment(repo)
                .segment("commits")
                .query("path", path)
                .query("sha", branch)
                .query("until", until.to_rfc3339_opts(SecondsFormat::Millis, true)),
        )
    }

    fn get_sha(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: Option<&str>,
    ) -> ApiCall<'_, Contents> {
        self.get(
            contents_endpoint(owner, repo)
                .optional_path(path)
                .query("ref", branch),
        )
    }

    fn create_file<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate> {
        self.put(contents_endpoint(owner, repo).path(path), body)
    }

    fn update_file<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate> {
        self.put(contents_endpoint(owner, repo).path(path), body)
    }

    fn upload_image<B: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        file_name: &str,
        body: &B,
    ) -> ApiCall<'_, ContentUpdate> {
        self.put(contents_endpoint(owner, repo).path(file_name), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::FileCommit;
    use chrono::TimeZone;
    use reqwest::Method;

    #[test]
    fn test_files_without_path() {
        let client = GitHubClient::new();
        let url = client.files("acme", "docs", "main", None).url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/docs/contents?ref=main"
        );
    }

    #[test]
    fn test_files_with_nested_path() {
        let client = GitHubClient::new();
        let url = client
            .files("acme", "docs", "dev", Some("guides/setup"))
            .url()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/docs/contents/guides/setup?ref=dev"
        );
    }

    #[test]
    fn test_get_sha_matches_files_url() {
        let client = GitHubClient::new();
        let sha = client.get_sha("acme", "docs", "main", Some("README.md"));
        assert_eq!(
            sha.url().unwrap().as_str(),
            "https://api.github.com/repos/acme/docs/contents/README.md?ref=main"
        );
    }

    #[test]
    fn test_file_url() {
        let client = GitHubClient::new();
        assert_eq!(
            client
                .file("acme", "docs", "main", "README.md")
                .url()
                .unwrap()
                .as_str(),
            "https://api.github.com/repos/acme/docs/contents/README.md?ref=main"
        );
    }

    #[test]
    fn test_commits_until() {
        let client = GitHubClient::new();
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let url = client
            .commits_until("acme", "docs", "main", "README.md", until)
            .url()
            .unwrap();

        assert_eq!(url.path(), "/repos/acme/docs/commits");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("path".to_string(), "README.md".to_string()),
                ("sha".to_string(), "main".to_string()),
                ("until".to_string(), "2024-05-01T12:30:00.000Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_commits_uses_issue_time() {
        let client = GitHubClient::new();
        let before = Utc::now();
        let url = client.commits("acme", "docs", "main", "a.md").url().unwrap();
        let until = url
            .query_pairs()
            .find(|(k, _)| k == "until")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let until: DateTime<Utc> = until.parse().unwrap();

        assert!(until >= before - chrono::Duration::milliseconds(1));
        assert!(until <= Utc::now());
    }

    #[test]
    fn test_writes_are_puts_with_body() {
        let client = GitHubClient::new();
        let body = FileCommit::new("Publish", "# Title").branch("main");

        let create = client.create_file("acme", "docs", "docs/a.md", &body);
        assert_eq!(*create.method(), Method::PUT);
        assert_eq!(
            create.url().unwrap().as_str(),
            "https://api.github.com/repos/acme/docs/contents/docs/a.md"
        );
        assert_eq!(create.body().unwrap()["message"], "Publish");

        let update = client.update_file("acme", "docs", "docs/a.md", &body.clone().sha("abc"));
        assert_eq!(update.body().unwrap()["sha"], "abc");

        let image = client.upload_image("acme", "docs", "images/fig1.png", &body);
        assert_eq!(
            image.url().unwrap().path(),
            "/repos/acme/docs/contents/images/fig1.png"
        );
    }
}
