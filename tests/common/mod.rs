//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use medassist::identity::{IdentityError, IdentityProvider};
use medassist::models::AuthUser;
use medassist::store::MemoryDocumentStore;
use medassist::{Gateway, PreferenceStore};
use parking_lot::Mutex;

/// Identity provider that accepts one configured token.
pub struct MockIdentity {
    accepted_token: String,
    user: AuthUser,
    failure: Mutex<Option<IdentityError>>,
    current: Mutex<Option<AuthUser>>,
    pub exchanges: Mutex<Vec<String>>,
}

impl MockIdentity {
    pub fn accepting(token: &str, user: AuthUser) -> Self {
        MockIdentity {
            accepted_token: token.to_string(),
            user,
            failure: Mutex::new(None),
            current: Mutex::new(None),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, err: IdentityError) {
        *self.failure.lock() = Some(err);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, IdentityError> {
        self.exchanges.lock().push(id_token.to_string());
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        if id_token != self.accepted_token {
            return Err(IdentityError::Rejected { code: 400, message: "INVALID_IDP_RESPONSE".to_string() });
        }
        *self.current.lock() = Some(self.user.clone());
        Ok(self.user.clone())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().clone()
    }

    fn sign_out(&self) {
        *self.current.lock() = None;
    }
}

pub fn alice() -> AuthUser {
    AuthUser {
        uid: "uid-alice".to_string(),
        display_name: Some("Alice Mokoena".to_string()),
        email: Some("alice@example.com".to_string()),
        photo_url: None,
    }
}

pub struct Harness {
    pub store: Arc<MemoryDocumentStore>,
    pub identity: Arc<MockIdentity>,
    pub gateway: Arc<Gateway>,
    pub prefs: Arc<PreferenceStore>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    let identity = Arc::new(MockIdentity::accepting("good-token", alice()));
    let gateway = Arc::new(Gateway::new(store.clone(), identity.clone()));
    Harness { store, identity, gateway, prefs: Arc::new(PreferenceStore::in_memory()) }
}
