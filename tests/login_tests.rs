//! Login, profile persistence and logout against a mock GitHub API.

use github_publish::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A dialog host that answers with a fixed callback message.
#[derive(Clone, Default)]
struct ScriptedHost {
    reply: Option<String>,
    opened: Arc<Mutex<Vec<Url>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedHost {
    fn replying(message: &str) -> Self {
        Self {
            reply: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn closing() -> Self {
        Self::default()
    }
}

impl DialogHost for ScriptedHost {
    fn in_host(&self) -> bool {
        true
    }

    fn open(&self, url: &Url, size: DialogSize) -> Result<DialogHandle> {
        assert_eq!(size, DialogSize { height: 50, width: 35 });
        self.opened.lock().unwrap().push(url.clone());

        let closed = Arc::clone(&self.closed);
        let (tx, handle) = DialogHandle::channel(move || closed.store(true, Ordering::SeqCst));
        let event = match &self.reply {
            Some(message) => DialogEvent::Message(message.clone()),
            None => DialogEvent::Closed,
        };
        tx.send(event).unwrap();
        Ok(handle)
    }
}

/// A profile store that can be read but never written.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn read(&self, _namespace: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn write(&self, _namespace: &str, _data: &str) -> Result<()> {
        Err(PublishError::Storage {
            message: "disk full".into(),
        })
    }

    fn delete(&self, _namespace: &str) -> Result<()> {
        Ok(())
    }
}

fn config(server: &MockServer, dir: &TempDir) -> Config {
    Config::new()
        .with_client_id("test-client")
        .with_api_base_url(server.uri())
        .with_storage_dir(dir.path())
}

async fn mount_user_and_orgs(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "public_repos": 8
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/octocat/orgs"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "login": "github", "id": 1, "description": "How people build software." },
            { "login": "octo-org", "id": 2 }
        ])))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_builds_and_stores_profile() {
    let server = MockServer::start().await;
    mount_user_and_orgs(&server, "gho_abc").await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying(r#"{"access_token":"gho_abc","token_type":"bearer","scope":"repo"}"#);
    let observed = host.clone();

    let profile = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, host).unwrap();
        service.login().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(profile.token.as_str(), "gho_abc");
    assert_eq!(profile.user.login, "octocat");
    assert_eq!(profile.user.extra.get("public_repos"), Some(&json!(8)));
    let orgs: Vec<&str> = profile.orgs.iter().map(|o| o.login.as_str()).collect();
    assert_eq!(orgs, vec!["github", "octo-org"]);

    assert!(observed.closed.load(Ordering::SeqCst));
    let opened = observed.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].path(), "/login/oauth/authorize");
    assert!(opened[0].as_str().contains("client_id=test-client"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("Profile.json")).unwrap())
            .unwrap();
    assert_eq!(stored["octocat"]["token"], json!("gho_abc"));
    assert_eq!(stored["octocat"]["orgs"][1]["login"], json!("octo-org"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_callback_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying("");
    let observed = host.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, host).unwrap();
        service.login()
    })
    .await
    .unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, PublishError::NoTokenReceived));
    assert_eq!(err.to_string(), "No token received");
    assert!(observed.closed.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_callback_is_rejected_with_body() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying(r#"{"error":"access_denied"}"#);

    let result = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, host).unwrap();
        service.login()
    })
    .await
    .unwrap();

    match result {
        Err(PublishError::Rejected(body)) => assert_eq!(body, json!({"error": "access_denied"})),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unusable_token_is_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying(r#"{"access_token":""}"#);

    let result = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, host).unwrap();
        let result = service.login();
        (result, service.client().is_authenticated())
    })
    .await
    .unwrap();

    assert!(matches!(result.0, Err(PublishError::UnableToParseToken)));
    assert!(!result.1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closed_dialog_cancels_login() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);

    let result = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, ScriptedHost::closing()).unwrap();
        service.login()
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(PublishError::DialogClosed)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_user_fetch_leaves_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying(r#"{"access_token":"gho_revoked"}"#);

    let (result, authenticated, profile_exists) = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::new(config, host).unwrap();
        let result = service.login();
        let authenticated = service.client().is_authenticated();
        let profile_exists = service.profile().unwrap().is_some();
        (result, authenticated, profile_exists)
    })
    .await
    .unwrap();

    match result {
        Err(PublishError::GitHub { message }) => {
            assert!(message.contains("401"));
            assert!(message.contains("Bad credentials"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert!(!authenticated);
    assert!(!profile_exists);
    assert!(!dir.path().join("Profile.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_profile_write_leaves_no_session() {
    let server = MockServer::start().await;
    mount_user_and_orgs(&server, "gho_new").await;
    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let host = ScriptedHost::replying(r#"{"access_token":"gho_new"}"#);

    let (result, session, profile_exists) = tokio::task::spawn_blocking(move || {
        let mut service = GitHubService::with_store(config, host, Arc::new(ReadOnlyStore));
        let result = service.login();
        let session = service.client().session().cloned();
        let profile_exists = service.profile().unwrap().is_some();
        (result, session, profile_exists)
    })
    .await
    .unwrap();

    match result {
        Err(PublishError::Storage { message }) => assert_eq!(message, "disk full"),
        other => panic!("expected storage error, got {:?}", other),
    }
    assert!(session.is_none());
    assert!(!profile_exists);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stored_profile_is_reused_then_logout_clears_it() {
    let server = MockServer::start().await;
    mount_user_and_orgs(&server, "gho_abc").await;
    Mock::given(method("GET"))
        .and(path("/repos/octo-org/docs/branches"))
        .and(header("authorization", "Bearer gho_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main", "commit": { "sha": "c5b97d5" }, "protected": true }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let base = config(&server, &dir);

    let login_config = base.clone();
    tokio::task::spawn_blocking(move || {
        let host = ScriptedHost::replying(r#"{"access_token":"gho_abc"}"#);
        GitHubService::new(login_config, host).unwrap().login().unwrap();
    })
    .await
    .unwrap();

    let (branches, after_logout, restored_after_logout) = tokio::task::spawn_blocking(move || {
        // A new process: nothing in memory, profile comes from storage.
        let mut service = GitHubService::new(base.clone(), ScriptedHost::closing()).unwrap();
        let branches = service
            .api()
            .unwrap()
            .branches("octo-org", "docs")
            .send()
            .unwrap();

        service.logout().unwrap();
        let after_logout = service.api().unwrap().branches("octo-org", "docs").send();

        let mut fresh = GitHubService::new(base, ScriptedHost::closing()).unwrap();
        let restored = fresh.profile().unwrap().is_some();
        (branches, after_logout, restored)
    })
    .await
    .unwrap();

    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].name, "main");
    assert!(branches[0].protected);
    assert!(matches!(after_logout, Err(PublishError::NotAuthenticated)));
    assert!(!restored_after_logout);
}
