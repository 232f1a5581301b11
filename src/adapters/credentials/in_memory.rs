//! In-memory implementation of CredentialStore.
//!
//! Keeps two hash indexes (identity → credential, secret → identity) behind
//! one lock so they can never disagree. Suitable for tests and single-process
//! development; credentials are lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::credential::Credential;
use crate::domain::foundation::{AccessToken, ClientSecret, IdentityId};
use crate::ports::{CredentialStore, CredentialStoreError};

#[derive(Debug, Default)]
struct Tables {
    by_identity: HashMap<IdentityId, Credential>,
    by_secret: HashMap<ClientSecret, IdentityId>,
}

impl Tables {
    /// Replace (or create) the identity's credential with a fresh secret.
    fn rotate(&mut self, identity: &IdentityId) -> ClientSecret {
        match self.by_identity.get_mut(identity) {
            Some(credential) => {
                let old = credential.rotate();
                self.by_secret.remove(&old);
                let secret = credential.secret.clone();
                self.by_secret.insert(secret.clone(), identity.clone());
                secret
            }
            None => self.insert_new(identity),
        }
    }

    fn insert_new(&mut self, identity: &IdentityId) -> ClientSecret {
        let credential = Credential::issue(identity.clone());
        let secret = credential.secret.clone();
        self.by_secret.insert(secret.clone(), identity.clone());
        self.by_identity.insert(identity.clone(), credential);
        secret
    }
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tables: RwLock<Tables>,
    lookups: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `lookup_by_secret` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of identities holding a credential.
    pub async fn len(&self) -> usize {
        self.tables.read().await.by_identity.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn issue(&self, identity: &IdentityId) -> Result<ClientSecret, CredentialStoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.rotate(identity))
    }

    async fn lookup_by_secret(
        &self,
        secret: &ClientSecret,
    ) -> Result<Option<IdentityId>, CredentialStoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read().await;
        Ok(tables.by_secret.get(secret).cloned())
    }

    async fn get_or_create(
        &self,
        identity: &IdentityId,
    ) -> Result<ClientSecret, CredentialStoreError> {
        let mut tables = self.tables.write().await;
        if let Some(credential) = tables.by_identity.get(identity) {
            return Ok(credential.secret.clone());
        }
        Ok(tables.insert_new(identity))
    }

    async fn record_access_token(
        &self,
        identity: &IdentityId,
        token: &AccessToken,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let credential = tables
            .by_identity
            .get_mut(identity)
            .ok_or_else(|| CredentialStoreError::NotFound(identity.clone()))?;
        credential.external_access_token = Some(token.clone());
        Ok(())
    }

    async fn access_token(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<AccessToken>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_identity
            .get(identity)
            .and_then(|c| c.external_access_token.clone()))
    }
}
