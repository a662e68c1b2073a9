//! Backend selection and owner sign-in.

use std::sync::Arc;

use folio_core::types::DbId;
use folio_db::auth::{AuthContext, AuthUser};
use folio_db::backend::{Backend, BackendError};
use folio_db::memory::MemoryBackend;
use folio_db::pg::PgBackend;
use folio_db::rest::{RestBackend, RestConfig};
use folio_query::QueryClient;

use crate::config::{BackendSettings, SiteConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Build the configured backend, sign in the owner if credentials are set,
/// and wrap both in a [`QueryClient`].
pub async fn connect(config: &SiteConfig) -> Result<QueryClient, ConnectError> {
    let auth = AuthContext::anonymous();

    let backend: Arc<dyn Backend> = match &config.backend {
        BackendSettings::Rest { api_url, anon_key } => {
            let rest = RestBackend::new(
                RestConfig {
                    api_url: api_url.clone(),
                    anon_key: anon_key.clone(),
                    timeout: config.query.fetch_timeout,
                },
                auth.clone(),
            )?;
            if let Some(owner) = &config.owner {
                rest.sign_in_with_password(&owner.email, &owner.password)
                    .await?;
            }
            tracing::info!(api_url = %api_url, "Using REST backend");
            Arc::new(rest)
        }
        BackendSettings::Postgres { database_url } => {
            let pool = folio_db::create_pool(database_url).await?;
            folio_db::health_check(&pool).await?;
            folio_db::run_migrations(&pool).await?;
            tracing::info!("Using Postgres backend, migrations applied");
            sign_in_locally(&auth, config);
            Arc::new(PgBackend::new(pool))
        }
        BackendSettings::Memory { seed_path } => {
            let memory = match seed_path {
                Some(path) => MemoryBackend::from_seed_file(path)?,
                None => MemoryBackend::new().with_portfolio_constraints(),
            };
            tracing::info!(seed = ?seed_path, "Using in-memory backend");
            sign_in_locally(&auth, config);
            Arc::new(memory)
        }
    };

    Ok(QueryClient::new(backend, auth, config.query))
}

/// Direct database access has no auth server: configured owner credentials
/// mark the session as the owner without verification.
fn sign_in_locally(auth: &AuthContext, config: &SiteConfig) {
    if let Some(owner) = &config.owner {
        auth.set_session(
            AuthUser {
                id: DbId::nil(),
                email: Some(owner.email.clone()),
            },
            None,
        );
        tracing::info!(email = %owner.email, "Acting as owner");
    }
}
