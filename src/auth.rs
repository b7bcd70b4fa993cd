//! Sign-in coordination: federated sign-in, guest access and sign-out.
//!
//! ```text
//! SignedOut --begin_sign_in--> SigningIn --complete_sign_in(ok)--> SignedIn
//!     ^                            |
//!     +----- cancelled / failed ---+
//! ```

use std::sync::Arc;

use log::{info, warn};

use crate::gateway::{Gateway, GatewayError};
use crate::identity::IdentityError;
use crate::models::{AuthUser, Session};
use crate::prefs::{PreferenceStore, PrefsError};

pub const GUEST_NAME: &str = "Guest User";
pub const GUEST_EMAIL: &str = "guest@medassist.com";
pub const DEFAULT_GOOGLE_NAME: &str = "Google User";

/// Status codes reported by the platform sign-in sheet.
pub const STATUS_NETWORK_ERROR: i32 = 7;
pub const STATUS_DEVELOPER_ERROR: i32 = 10;
pub const STATUS_SIGN_IN_CANCELLED: i32 = 12501;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Sign-in configuration error. Please check the identity provider settings.")]
    Configuration,
    #[error("Network error. Please check your internet connection.")]
    Network,
    #[error("Sign-in cancelled by user.")]
    Cancelled,
    #[error("Sign-in failed: {0}")]
    Failed(String),
    #[error("cannot {action} while {state}")]
    InvalidState { action: &'static str, state: &'static str },
    #[error(transparent)]
    Preferences(#[from] PrefsError),
}

impl AuthError {
    pub fn from_status_code(status_code: i32, message: &str) -> Self {
        match status_code {
            STATUS_DEVELOPER_ERROR => AuthError::Configuration,
            STATUS_NETWORK_ERROR => AuthError::Network,
            STATUS_SIGN_IN_CANCELLED => AuthError::Cancelled,
            _ => AuthError::Failed(message.to_string()),
        }
    }
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Identity(IdentityError::Configuration(_)) => AuthError::Configuration,
            GatewayError::Identity(IdentityError::Network(_)) => AuthError::Network,
            other => AuthError::Failed(other.to_string()),
        }
    }
}

/// The account handed back by the platform sign-in sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleAccount {
    pub id_token: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignInOutcome {
    Account(GoogleAccount),
    Cancelled,
    Failed { status_code: i32, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Federated(AuthUser),
    Guest,
    /// Restored from preferences without a live provider session.
    Stored { name: String, email: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    SignedOut,
    SigningIn,
    SignedIn(Principal),
}

impl AuthState {
    fn label(&self) -> &'static str {
        match self {
            AuthState::SignedOut => "signed out",
            AuthState::SigningIn => "signing in",
            AuthState::SignedIn(_) => "signed in",
        }
    }
}

pub struct AuthCoordinator {
    gateway: Arc<Gateway>,
    prefs: Arc<PreferenceStore>,
    state: AuthState,
}

impl AuthCoordinator {
    /// Starts from whatever session the preference store holds.
    pub fn restore(gateway: Arc<Gateway>, prefs: Arc<PreferenceStore>) -> Self {
        let state = if prefs.is_user_logged_in() {
            match gateway.current_user() {
                Some(user) => AuthState::SignedIn(Principal::Federated(user)),
                None if prefs.user_email() == GUEST_EMAIL => AuthState::SignedIn(Principal::Guest),
                None => AuthState::SignedIn(Principal::Stored {
                    name: prefs.user_name(),
                    email: prefs.user_email(),
                }),
            }
        } else {
            AuthState::SignedOut
        };
        AuthCoordinator { gateway, prefs, state }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Session {
        self.prefs.session()
    }

    pub fn begin_sign_in(&mut self) -> Result<(), AuthError> {
        match self.state {
            AuthState::SignedOut => {
                self.state = AuthState::SigningIn;
                Ok(())
            }
            _ => Err(AuthError::InvalidState { action: "start sign-in", state: self.state.label() }),
        }
    }

    /// Finishes a sign-in started with `begin_sign_in`.
    ///
    /// Any failure returns the coordinator to `SignedOut` and leaves the
    /// stored session untouched.
    pub async fn complete_sign_in(&mut self, outcome: SignInOutcome) -> Result<Session, AuthError> {
        if self.state != AuthState::SigningIn {
            return Err(AuthError::InvalidState { action: "complete sign-in", state: self.state.label() });
        }

        let result = self.exchange(outcome).await;
        match result {
            Ok(user) => {
                let session = Session {
                    is_logged_in: true,
                    user_name: user.display_name.clone().unwrap_or_else(|| DEFAULT_GOOGLE_NAME.to_string()),
                    user_email: user.email.clone().unwrap_or_default(),
                };
                if let Err(e) = self.prefs.save_session(&session) {
                    warn!("Could not store the session, signing out: {}", e);
                    self.gateway.sign_out();
                    self.state = AuthState::SignedOut;
                    return Err(e.into());
                }
                self.gateway.save_user_profile(&user).await;
                info!("Signed in as {}", session.user_name);
                self.state = AuthState::SignedIn(Principal::Federated(user));
                Ok(session)
            }
            Err(e) => {
                warn!("Sign-in did not complete: {}", e);
                self.state = AuthState::SignedOut;
                Err(e)
            }
        }
    }

    async fn exchange(&self, outcome: SignInOutcome) -> Result<AuthUser, AuthError> {
        match outcome {
            SignInOutcome::Cancelled => Err(AuthError::Cancelled),
            SignInOutcome::Failed { status_code, message } => {
                Err(AuthError::from_status_code(status_code, &message))
            }
            SignInOutcome::Account(account) => {
                let token = account
                    .id_token
                    .ok_or_else(|| AuthError::Failed("No ID token returned".to_string()))?;
                Ok(self.gateway.sign_in_with_google(&token).await?)
            }
        }
    }

    pub fn sign_in_as_guest(&mut self) -> Result<Session, AuthError> {
        if self.state == AuthState::SigningIn {
            return Err(AuthError::InvalidState { action: "continue as guest", state: self.state.label() });
        }
        let session = Session {
            is_logged_in: true,
            user_name: GUEST_NAME.to_string(),
            user_email: GUEST_EMAIL.to_string(),
        };
        self.prefs.save_session(&session)?;
        info!("Continuing as guest");
        self.state = AuthState::SignedIn(Principal::Guest);
        Ok(session)
    }

    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.gateway.sign_out();
        self.prefs.logout()?;
        self.state = AuthState::SignedOut;
        Ok(())
    }
}
