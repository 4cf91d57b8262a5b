use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use warden_api::app::{self, AppServices};
use warden_api::config::ApiConfig;
use warden_auth::{AuditEntry, AuditStore, Role, StoreError, TokenClaims, UserRecord, UserStatus};
use warden_infra::audit::{AuditMetricsSnapshot, AuditRecorder, InMemoryAuditStore};
use warden_infra::mail::{Invitation, LogMailer, MailError, Mailer};
use warden_infra::users::{InMemoryUserStore, UserDirectory};

const JWT_SECRET: &str = "test-secret";

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_invitation(&self, _invitation: &Invitation) -> Result<(), MailError> {
        Err(MailError::Delivery("smtp down".to_string()))
    }
}

struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append(&self, _entry: AuditEntry) -> Result<(), StoreError> {
        Err(StoreError::unavailable("audit table locked"))
    }
}

struct TestServer {
    base_url: String,
    users: Arc<InMemoryUserStore>,
    audit_log: Arc<InMemoryAuditStore>,
    recorder: AuditRecorder,
    services: AppServices,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(LogMailer), None).await
    }

    async fn spawn_with(mailer: Arc<dyn Mailer>, audit_store: Option<Arc<dyn AuditStore>>) -> Self {
        let config = ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..ApiConfig::default()
        };
        let users = Arc::new(InMemoryUserStore::new());
        let audit_log = Arc::new(InMemoryAuditStore::new());
        let audit_store = audit_store.unwrap_or_else(|| audit_log.clone() as Arc<dyn AuditStore>);

        let services = AppServices::new(&config, users.clone(), users.clone(), audit_store, mailer);
        let recorder = services.audit.clone();

        // Same router as prod, bound to an ephemeral port.
        let router = app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            base_url,
            users,
            audit_log,
            recorder,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seed an active user and return it with a freshly issued token.
    fn seed(&self, email: &str, role: Role) -> (UserRecord, String) {
        let mut record = UserRecord::invite(email, "Test", "User", role, Utc::now()).unwrap();
        record.status = UserStatus::Active;
        self.users.seed(record.clone());
        let token = self.services.verifier.issue(&record).unwrap();
        (record, token)
    }

    /// Wait until the audit worker has handled everything queued so far.
    async fn audit_drained(&self) -> AuditMetricsSnapshot {
        for _ in 0..100 {
            let snap = self.recorder.metrics();
            if snap.is_drained() {
                return snap;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("audit queue did not drain: {:?}", self.recorder.metrics());
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(record: &UserRecord, role_claim: &str, issued_at: chrono::DateTime<Utc>) -> String {
    let claims = TokenClaims {
        sub: record.id,
        email: record.email.clone(),
        role: role_claim.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + ChronoDuration::hours(24)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_token_reaches_handler_with_stored_identity() {
    let srv = TestServer::spawn().await;
    let (user, token) = srv.seed("val@example.com", Role::Validator);

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/me")).bearer_auth(&token).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["role"], "validator");
    assert!(body["permissions"].as_array().unwrap().iter().any(|p| p == "document.validate"));
}

#[tokio::test]
async fn missing_header_is_401_and_not_audited() {
    let srv = TestServer::spawn().await;
    let (target, _) = srv.seed("target@example.com", Role::Viewer);

    let client = reqwest::Client::new();
    let res = client
        .delete(srv.url(&format!("/users/{}", target.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let snap = srv.audit_drained().await;
    assert_eq!(snap.recorded, 0);
    assert!(srv.audit_log.is_empty());
}

#[tokio::test]
async fn expired_and_forged_tokens_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let (user, _) = srv.seed("admin@example.com", Role::Admin);

    let expired = mint_jwt(&user, "admin", Utc::now() - ChronoDuration::hours(48));
    let forged = {
        let claims = TokenClaims {
            sub: user.id,
            email: user.email.clone(),
            role: "admin".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + ChronoDuration::hours(1)).timestamp(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"not-the-secret"),
        )
        .unwrap()
    };

    let client = reqwest::Client::new();
    let mut bodies = Vec::new();
    for token in [expired, forged, "garbage".to_string()] {
        let res = client.get(srv.url("/me")).bearer_auth(token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        bodies.push(res.text().await.unwrap());
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn expired_token_never_reaches_an_audited_handler() {
    let srv = TestServer::spawn().await;
    let (admin, _) = srv.seed("admin@example.com", Role::Admin);
    let (target, _) = srv.seed("target@example.com", Role::Viewer);
    let expired = mint_jwt(&admin, "admin", Utc::now() - ChronoDuration::hours(48));

    let client = reqwest::Client::new();
    let res = client
        .delete(srv.url(&format!("/users/{}", target.id)))
        .bearer_auth(&expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let snap = srv.audit_drained().await;
    assert_eq!(snap.recorded, 0);
    assert!(srv.audit_log.is_empty());
    let stored = srv.users.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.status, UserStatus::Active);
    assert_eq!(stored.updated_at, target.updated_at);
}

#[tokio::test]
async fn suspended_user_with_fresh_token_is_401() {
    let srv = TestServer::spawn().await;
    let (user, token) = srv.seed("sus@example.com", Role::Admin);
    srv.users
        .update_status(user.id, UserStatus::Suspended, Utc::now())
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Same body as an unknown subject.
    let ghost = UserRecord::invite("ghost@example.com", "No", "One", Role::Admin, Utc::now()).unwrap();
    let ghost_token = srv.services.verifier.issue(&ghost).unwrap();
    let ghost_res = client.get(srv.url("/me")).bearer_auth(&ghost_token).send().await.unwrap();
    assert_eq!(ghost_res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), ghost_res.text().await.unwrap());
}

#[tokio::test]
async fn viewer_cannot_delete_and_denial_is_not_audited() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.seed("viewer@example.com", Role::Viewer);
    let (target, _) = srv.seed("target@example.com", Role::Viewer);

    let client = reqwest::Client::new();
    let res = client
        .delete(srv.url(&format!("/users/{}", target.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let snap = srv.audit_drained().await;
    assert_eq!(snap.recorded, 0);
    let stored = srv.users.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.status, UserStatus::Active);
}

#[tokio::test]
async fn stored_role_wins_over_token_claim() {
    let srv = TestServer::spawn().await;
    let (viewer, _) = srv.seed("viewer@example.com", Role::Viewer);
    let token = mint_jwt(&viewer, "admin", Utc::now());

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/users")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unrecognised_stored_role_is_denied_everything() {
    let srv = TestServer::spawn().await;
    let (mut user, _) = srv.seed("odd@example.com", Role::Admin);
    user.role = "superuser".to_string();
    srv.users.seed(user.clone());
    let token = srv.services.verifier.issue(&user).unwrap();

    let client = reqwest::Client::new();
    let me = client.get(srv.url("/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(me.status(), StatusCode::OK);

    let res = client.get(srv.url("/users")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_change_takes_effect_on_next_request() {
    let srv = TestServer::spawn().await;
    let (_, admin_token) = srv.seed("admin@example.com", Role::Admin);
    let (validator, validator_token) = srv.seed("val@example.com", Role::Validator);

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/users")).bearer_auth(&validator_token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(srv.url(&format!("/users/{}/role", validator.id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "role": "viewer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Same token, new authority.
    let res = client.get(srv.url("/users")).bearer_auth(&validator_token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_demote_self_but_can_demote_another_admin() {
    let srv = TestServer::spawn().await;
    let (me, token) = srv.seed("me@example.com", Role::Admin);
    let (other, _) = srv.seed("other@example.com", Role::Admin);

    let client = reqwest::Client::new();
    let res = client
        .patch(srv.url(&format!("/users/{}/role", me.id)))
        .bearer_auth(&token)
        .json(&json!({ "role": "viewer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "cannot_demote_self");
    assert_eq!(srv.users.get(me.id).await.unwrap().unwrap().role, "admin");

    let res = client
        .patch(srv.url(&format!("/users/{}/role", other.id)))
        .bearer_auth(&token)
        .json(&json!({ "role": "viewer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(srv.users.get(other.id).await.unwrap().unwrap().role, "viewer");

    // Both attempts passed the gate, so both are audited.
    srv.audit_drained().await;
    let actions: Vec<_> = srv.audit_log.entries().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["user.role_change", "user.role_change"]);
}

#[tokio::test]
async fn suspending_a_user_locks_them_out_and_self_delete_is_refused() {
    let srv = TestServer::spawn().await;
    let (admin, admin_token) = srv.seed("admin@example.com", Role::Admin);
    let (user, user_token) = srv.seed("user@example.com", Role::Validator);

    let client = reqwest::Client::new();
    let res = client
        .patch(srv.url(&format!("/users/{}/status", user.id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "status": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/me")).bearer_auth(&user_token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .delete(srv.url(&format!("/users/{}", admin.id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_soft_and_unknown_target_is_404() {
    let srv = TestServer::spawn().await;
    let (admin, token) = srv.seed("admin@example.com", Role::Admin);
    let (target, _) = srv.seed("target@example.com", Role::Viewer);

    let client = reqwest::Client::new();
    let res = client
        .delete(srv.url(&format!("/users/{}?reason=spam", target.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stored = srv.users.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.status, UserStatus::Deleted);

    // Path id and query parameters land in the audit entry.
    srv.audit_drained().await;
    let entries = srv.audit_log.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, "user.delete");
    assert_eq!(entry.actor_id, Some(admin.id));
    assert_eq!(entry.resource_id, Some(target.id.to_string()));
    assert_eq!(entry.details["method"], "DELETE");
    assert_eq!(entry.details["path"], format!("/users/{}", target.id));
    assert_eq!(entry.details["query"]["reason"], "spam");
    assert_eq!(entry.details["body"], serde_json::Value::Null);

    let res = client
        .delete(srv.url(&format!("/users/{}", warden_core::UserId::new())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invite_creates_pending_user_and_audits_the_request() {
    let srv = TestServer::spawn().await;
    let (admin, token) = srv.seed("admin@example.com", Role::Admin);

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/users/invite"))
        .bearer_auth(&token)
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("user-agent", "black-box")
        .json(&json!({
            "email": "New@Example.com",
            "first_name": "New",
            "last_name": "Hire",
            "role": "validator",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["email"], "new@example.com");
    assert_eq!(body["status"], "pending");

    srv.audit_drained().await;
    let entries = srv.audit_log.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, "user.invite");
    assert_eq!(entry.resource_type, "user");
    assert_eq!(entry.actor_id, Some(admin.id));
    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(entry.user_agent.as_deref(), Some("black-box"));
    assert_eq!(entry.details["method"], "POST");
    assert_eq!(entry.details["path"], "/users/invite");
    assert_eq!(entry.details["body"]["role"], "validator");
    assert_eq!(entry.details["status"], 201);
}

#[tokio::test]
async fn failed_invitation_mail_removes_the_pending_user() {
    let srv = TestServer::spawn_with(Arc::new(FailingMailer), None).await;
    let (_, token) = srv.seed("admin@example.com", Role::Admin);

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/users/invite"))
        .bearer_auth(&token)
        .json(&json!({
            "email": "orphan@example.com",
            "first_name": "Or",
            "last_name": "Phan",
            "role": "viewer",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let users = srv.users.list().await.unwrap();
    assert!(users.iter().all(|u| u.email != "orphan@example.com"));

    // Failed invocations are still audited.
    srv.audit_drained().await;
    assert_eq!(srv.audit_log.len(), 1);
    assert_eq!(srv.audit_log.entries()[0].details["status"], 500);
}

#[tokio::test]
async fn audit_store_failure_does_not_affect_the_response() {
    let srv = TestServer::spawn_with(Arc::new(LogMailer), Some(Arc::new(FailingAuditStore))).await;
    let (_, token) = srv.seed("admin@example.com", Role::Admin);
    let (target, _) = srv.seed("target@example.com", Role::Viewer);

    let client = reqwest::Client::new();
    let res = client
        .delete(srv.url(&format!("/users/{}", target.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let snap = srv.audit_drained().await;
    assert_eq!(snap.recorded, 1);
    assert_eq!(snap.failed, 1);
    assert_eq!(snap.persisted, 0);
}

#[tokio::test]
async fn role_matrix_is_readable_with_user_read() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.seed("val@example.com", Role::Validator);

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/rbac/roles")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let roles = body["roles"].as_array().unwrap();
    let names: Vec<_> = roles.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["admin", "validator", "viewer"]);
}
