//! Service wiring: stores, verifier, resolver, mailer, and the audit recorder.

use std::sync::Arc;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use warden_auth::{AuditStore, CredentialVerifier, IdentityResolver, IdentityStore, Role, StoreError, UserRecord, UserStatus};
use warden_infra::{
    audit::{AuditRecorder, InMemoryAuditStore, PostgresAuditStore},
    mail::{LogMailer, Mailer},
    users::{InMemoryUserStore, PostgresUserStore, UserDirectory},
};

use crate::audit::AuditAction;
use crate::config::ApiConfig;

/// Everything a request handler or pipeline step needs.
#[derive(Clone)]
pub struct AppServices {
    pub verifier: CredentialVerifier,
    pub resolver: IdentityResolver,
    pub users: Arc<dyn UserDirectory>,
    pub mailer: Arc<dyn Mailer>,
    pub audit: AuditRecorder,
    pub audit_body_limit: usize,
}

impl AppServices {
    /// Wire services around the given ports. Spawns the audit worker, so
    /// this must run inside a Tokio runtime.
    pub fn new(
        config: &ApiConfig,
        users: Arc<dyn UserDirectory>,
        identity: Arc<dyn IdentityStore>,
        audit_store: Arc<dyn AuditStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let (audit, _worker) = AuditRecorder::spawn(audit_store, config.audit_queue_capacity);
        Self {
            verifier: CredentialVerifier::new(config.jwt_secret.as_bytes()),
            resolver: IdentityResolver::new(identity),
            users,
            mailer,
            audit,
            audit_body_limit: config.audit_body_limit,
        }
    }

    /// Audit step configuration for one route.
    pub fn audited(&self, action: &'static str, resource_type: &'static str) -> AuditAction {
        AuditAction::new(self.audit.clone(), action, resource_type, self.audit_body_limit)
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory stores otherwise.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let services = match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            tracing::info!("using postgres stores");
            let users = Arc::new(PostgresUserStore::new(pool.clone()));
            AppServices::new(
                config,
                users.clone(),
                users,
                Arc::new(PostgresAuditStore::new(pool)),
                Arc::new(LogMailer),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            let users = Arc::new(InMemoryUserStore::new());
            AppServices::new(
                config,
                users.clone(),
                users,
                Arc::new(InMemoryAuditStore::new()),
                Arc::new(LogMailer),
            )
        }
    };

    if let Some(email) = config.bootstrap_admin_email.as_deref() {
        bootstrap_admin(&services, email).await?;
    }

    Ok(services)
}

/// Ensure an active admin exists and log a token for it.
async fn bootstrap_admin(services: &AppServices, email: &str) -> anyhow::Result<()> {
    let mut record = UserRecord::invite(email, "Bootstrap", "Admin", Role::Admin, Utc::now())?;
    record.status = UserStatus::Active;

    match services.users.insert(record.clone()).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            tracing::info!(%email, "bootstrap admin already exists");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let token = services.verifier.issue(&record)?;
    tracing::info!(%email, user_id = %record.id, %token, "bootstrap admin created");
    Ok(())
}
