//! PostgreSQL implementation of CredentialStore.
//!
//! One row per identity. `secret` carries a unique index, so the hot-path
//! lookup is a single index probe and two identities can never share a
//! secret.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{AccessToken, ClientSecret, IdentityId, Timestamp};
use crate::ports::{CredentialStore, CredentialStoreError};

/// PostgreSQL implementation of the CredentialStore port.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Creates a new PostgresCredentialStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), CredentialStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CredentialStoreError::Unavailable(format!("migration failed: {}", e)))
    }

    async fn find_secret(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<ClientSecret>, CredentialStoreError> {
        let secret: Option<String> =
            sqlx::query_scalar("SELECT secret FROM credentials WHERE identity = $1")
                .bind(identity.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| unavailable("find credential", e))?;

        Ok(secret.map(ClientSecret::from_presented))
    }
}

fn unavailable(action: &str, err: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::Unavailable(format!("Failed to {}: {}", action, err))
}

fn to_identity(raw: String) -> Result<IdentityId, CredentialStoreError> {
    IdentityId::new(raw).map_err(|e| CredentialStoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn issue(&self, identity: &IdentityId) -> Result<ClientSecret, CredentialStoreError> {
        let secret = ClientSecret::generate();
        let now = Timestamp::now();

        sqlx::query(
            r#"
            INSERT INTO credentials (identity, secret, issued_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (identity) DO UPDATE SET
                secret = EXCLUDED.secret,
                issued_at = EXCLUDED.issued_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(identity.as_str())
        .bind(secret.expose())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| unavailable("issue credential", e))?;

        Ok(secret)
    }

    async fn lookup_by_secret(
        &self,
        secret: &ClientSecret,
    ) -> Result<Option<IdentityId>, CredentialStoreError> {
        let identity: Option<String> =
            sqlx::query_scalar("SELECT identity FROM credentials WHERE secret = $1")
                .bind(secret.expose())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| unavailable("look up secret", e))?;

        identity.map(to_identity).transpose()
    }

    async fn get_or_create(
        &self,
        identity: &IdentityId,
    ) -> Result<ClientSecret, CredentialStoreError> {
        if let Some(existing) = self.find_secret(identity).await? {
            return Ok(existing);
        }

        let candidate = ClientSecret::generate();
        let now = Timestamp::now();

        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO credentials (identity, secret, issued_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (identity) DO NOTHING
            RETURNING secret
            "#,
        )
        .bind(identity.as_str())
        .bind(candidate.expose())
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unavailable("create credential", e))?;

        if inserted.is_some() {
            return Ok(candidate);
        }

        // Lost the insert race; the winner's row is committed by now.
        self.find_secret(identity)
            .await?
            .ok_or_else(|| CredentialStoreError::NotFound(identity.clone()))
    }

    async fn record_access_token(
        &self,
        identity: &IdentityId,
        token: &AccessToken,
    ) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE credentials SET
                external_access_token = $2,
                updated_at = $3
            WHERE identity = $1
            "#,
        )
        .bind(identity.as_str())
        .bind(token.expose())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| unavailable("record access token", e))?;

        if result.rows_affected() == 0 {
            return Err(CredentialStoreError::NotFound(identity.clone()));
        }

        Ok(())
    }

    async fn access_token(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<AccessToken>, CredentialStoreError> {
        let token: Option<Option<String>> = sqlx::query_scalar(
            "SELECT external_access_token FROM credentials WHERE identity = $1",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unavailable("read access token", e))?;

        Ok(token.flatten().map(AccessToken::new))
    }
}
