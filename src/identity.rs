//! Federated sign-in against the hosted identity provider.

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::models::AuthUser;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum IdentityError {
    #[error("identity provider is not configured: {0}")]
    Configuration(String),
    #[error("could not reach identity provider: {0}")]
    Network(String),
    #[error("identity provider rejected the credential ({code}): {message}")]
    Rejected { code: u16, message: String },
    #[error("no user returned")]
    NoUser,
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            IdentityError::Network(err.to_string())
        } else {
            IdentityError::Rejected {
                code: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

/// The hosted identity provider. Keeps track of the signed-in user the way
/// the vendor SDK does, so callers can ask for it without a round trip.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges a third-party identity token for an application session.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, IdentityError>;

    fn current_user(&self) -> Option<AuthUser>;

    fn sign_out(&self);
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

/// REST client for the Identity Toolkit `accounts:signInWithIdp` endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    current: RwLock<Option<AuthUser>>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        HttpIdentityProvider {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            current: RwLock::new(None),
        }
    }

    fn endpoint(&self) -> Result<Url, IdentityError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| IdentityError::Configuration("IDENTITY_API_KEY is not set".to_string()))?;
        let mut url = self
            .base_url
            .join("v1/accounts:signInWithIdp")
            .map_err(|e| IdentityError::Configuration(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", key);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, IdentityError> {
        let endpoint = self.endpoint()?;
        let body = json!({
            "postBody": format!("id_token={id_token}&providerId=google.com"),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });

        debug!("exchanging identity token with {}", self.base_url);
        let response = self.client.post(endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => IdentityError::Rejected {
                    code: envelope.error.code,
                    message: envelope.error.message,
                },
                Err(_) => IdentityError::Rejected {
                    code: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("unknown error").to_string(),
                },
            });
        }

        let payload: SignInResponse = response.json().await?;
        let uid = payload.local_id.ok_or(IdentityError::NoUser)?;
        let user = AuthUser {
            uid,
            display_name: payload.display_name,
            email: payload.email,
            photo_url: payload.photo_url,
        };
        info!("identity provider accepted credential for {}", user.uid);
        *self.current.write() = Some(user.clone());
        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.read().clone()
    }

    fn sign_out(&self) {
        *self.current.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one request with `status` and `body`, handing back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (base, handle)
    }

    fn provider(base: Url) -> HttpIdentityProvider {
        HttpIdentityProvider {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            base_url: base,
            api_key: Some("test-key".to_string()),
            current: RwLock::new(None),
        }
    }

    #[tokio::test]
    async fn accepted_token_becomes_the_current_user() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"localId":"uid-42","email":"ann@example.com","displayName":"Ann","idToken":"x"}"#,
        )
        .await;
        let provider = provider(base);

        let user = provider.sign_in_with_google("tok-1").await.unwrap();
        assert_eq!(
            user,
            AuthUser {
                uid: "uid-42".to_string(),
                display_name: Some("Ann".to_string()),
                email: Some("ann@example.com".to_string()),
                photo_url: None,
            }
        );
        assert_eq!(provider.current_user(), Some(user));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/accounts:signInWithIdp?key=test-key HTTP/1.1"));
        assert!(request.contains("id_token=tok-1&providerId=google.com"));

        provider.sign_out();
        assert_eq!(provider.current_user(), None);
    }

    #[tokio::test]
    async fn error_envelope_is_a_rejection() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"error":{"code":400,"message":"INVALID_IDP_RESPONSE"}}"#,
        )
        .await;
        let provider = provider(base);

        let err = provider.sign_in_with_google("forged").await.unwrap_err();
        assert_eq!(err, IdentityError::Rejected { code: 400, message: "INVALID_IDP_RESPONSE".to_string() });
        assert_eq!(provider.current_user(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_without_envelope_uses_the_status() {
        let (base, server) = serve_once("503 Service Unavailable", "upstream down").await;
        let err = provider(base).sign_in_with_google("tok").await.unwrap_err();
        assert_eq!(err, IdentityError::Rejected { code: 503, message: "Service Unavailable".to_string() });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn response_without_local_id_has_no_user() {
        let (base, server) = serve_once("200 OK", r#"{"email":"ann@example.com"}"#).await;
        let provider = provider(base);
        let err = provider.sign_in_with_google("tok").await.unwrap_err();
        assert_eq!(err, IdentityError::NoUser);
        assert_eq!(provider.current_user(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_rejection() {
        let (base, server) = serve_once("200 OK", "not json").await;
        let err = provider(base).sign_in_with_google("tok").await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected { code: 0, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let err = provider(base).sign_in_with_google("tok").await.unwrap_err();
        assert!(matches!(err, IdentityError::Network(_)));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let provider = HttpIdentityProvider::new(
            Url::parse("https://identitytoolkit.googleapis.com").unwrap(),
            None,
        );
        let err = provider.sign_in_with_google("token").await.unwrap_err();
        assert!(matches!(err, IdentityError::Configuration(_)));
        assert!(provider.current_user().is_none());
    }

    #[test]
    fn endpoint_carries_the_key() {
        let provider = HttpIdentityProvider::new(
            Url::parse("https://id.example.com/").unwrap(),
            Some("abc".to_string()),
        );
        let url = provider.endpoint().unwrap();
        assert_eq!(url.as_str(), "https://id.example.com/v1/accounts:signInWithIdp?key=abc");
    }
}
