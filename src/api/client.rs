//! REST client for the signal backend and the response normalization it applies.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::types::ApiResponse;
use super::ApiError;
use crate::session::{CredentialStore, Session};

/// Backend client. Attaches the session's bearer token to every request.
pub struct ApiClient<S> {
    http: Client,
    base_url: String,
    session: Arc<Session<S>>,
}

impl<S: CredentialStore> ApiClient<S> {
    pub fn new(base_url: impl Into<String>, timeout: Duration, session: Arc<Session<S>>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session<S>> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    pub(crate) async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    /// POST carrying its parameters in the query string and no body.
    pub(crate) async fn post_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.http.post(self.url(path)).query(query)).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    pub(crate) async fn delete_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.http.delete(self.url(path)).query(query)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status().as_u16();
        debug!(url = %response.url(), status, "Backend response");

        // The body of a 401 is never consulted, so a failed read must not
        // stand in the way of the sign-out.
        if status == 401 {
            return normalize(&self.session, status, &[]).await;
        }

        let body = response.bytes().await.map_err(ApiError::transport)?;
        normalize(&self.session, status, &body).await
    }
}

/// Turn a raw response into data or a typed error.
///
/// A 401 signs the session out and yields `SessionExpired` before the body
/// is looked at.
pub async fn normalize<T, S>(session: &Session<S>, status: u16, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    S: CredentialStore,
{
    if status == 401 {
        if let Err(e) = session.sign_out().await {
            warn!(error = %e, "Failed to clear credentials after 401");
        }
        return Err(ApiError::session_expired());
    }

    classify(status, body)
}

/// Classification of every non-401 response.
pub fn classify<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    let success_status = (200..300).contains(&status);

    let envelope: ApiResponse<T> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if status == 403 => return Err(ApiError::access_denied(None)),
        Err(_) if !success_status => return Err(ApiError::from_detail(status, None)),
        Err(e) => return Err(ApiError::invalid_response(status, e)),
    };

    if status == 403 {
        return Err(ApiError::access_denied(envelope.error));
    }

    if !success_status || !envelope.success {
        return Err(ApiError::from_detail(status, envelope.error));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::new(status, "No data returned from server"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::session::{MemoryStore, TOKEN_KEY, USER_KEY};
    use async_trait::async_trait;
    use serde_json::json;
    use crate::models::{LoginResponse, User};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Memory store that counts token removals.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        token_clears: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for CountingStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            if key == TOKEN_KEY {
                self.token_clears.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.remove(key).await
        }
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_401_clears_credentials_once_before_parsing() {
        let store = CountingStore::default();
        store.set(TOKEN_KEY, "stale").await.unwrap();
        store.set(USER_KEY, "{}").await.unwrap();
        let session = Session::load(store).await.unwrap();
        // load() itself cleared the undecodable token
        let before = session.store().token_clears.load(Ordering::SeqCst);

        // Body that would classify as a validation error if it were read
        let payload = body(json!({
            "success": false,
            "data": null,
            "error": {"code": "VALIDATION_ERROR", "message": "bad"},
            "timestamp": "2024-05-01T08:00:00"
        }));
        let err = normalize::<u32, _>(&session, 401, &payload).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(err.status, 401);
        assert_eq!(session.store().token_clears.load(Ordering::SeqCst), before + 1);

        let err = normalize::<u32, _>(&session, 401, b"<html>").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(session.store().token_clears.load(Ordering::SeqCst), before + 2);
    }

    #[tokio::test]
    async fn test_non_401_leaves_session_alone() {
        let session = Session::load(CountingStore::default()).await.unwrap();

        let payload = body(json!({
            "success": false,
            "data": null,
            "error": {"code": "SYMBOL_NOT_FOUND", "message": "Unknown symbol XYZUSDT"},
            "timestamp": "2024-05-01T08:00:00"
        }));
        let err = normalize::<u32, _>(&session, 200, &payload).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
        assert!(!err.is_retryable());
        assert_eq!(session.store().token_clears.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_success_envelope() {
        let payload = body(json!({"success": true, "data": 42, "error": null, "timestamp": "t"}));
        assert_eq!(classify::<u32>(200, &payload).unwrap(), 42);
    }

    #[test]
    fn test_null_data() {
        let payload = body(json!({"success": true, "data": null, "error": null, "timestamp": "t"}));
        let err = classify::<u32>(200, &payload).unwrap_err();
        assert_eq!(err.message, "No data returned from server");
    }

    #[test]
    fn test_403_uses_backend_message_or_fallback() {
        let payload = body(json!({
            "success": false,
            "data": null,
            "error": {"code": "FORBIDDEN", "message": "Admins only"},
            "timestamp": "t"
        }));
        let err = classify::<u32>(403, &payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(err.message, "Admins only");

        let err = classify::<u32>(403, b"").unwrap_err();
        assert_eq!(err.message, "Access denied.");
        assert_eq!(err.code.as_deref(), Some("ACCESS_DENIED"));
    }

    #[test]
    fn test_error_status_with_success_flag() {
        let payload = body(json!({"success": true, "data": 1, "error": null, "timestamp": "t"}));
        let err = classify::<u32>(500, &payload).unwrap_err();
        assert_eq!(err.message, "Request failed with status 500");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unexpected_bodies() {
        let err = classify::<u32>(502, b"Bad Gateway").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.message, "Request failed with status 502");

        let err = classify::<u32>(200, b"Bad Gateway").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let payload = body(json!({"success": true, "data": "seven", "error": null, "timestamp": "t"}));
        let err = classify::<u32>(200, &payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let payload = body(json!({"success": true, "data": 7, "error": null, "extra": 1}));
        let err = classify::<u32>(200, &payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    fn profile() -> User {
        User {
            id: 7,
            username: "desk".to_string(),
            email: "desk@example.com".to_string(),
            full_name: None,
            roles: vec!["ROLE_USER".to_string()],
            status: "ACTIVE".to_string(),
        }
    }

    async fn signed_in(token: &str) -> Arc<Session<MemoryStore>> {
        let session = Session::load(MemoryStore::new()).await.unwrap();
        session
            .sign_in(&LoginResponse {
                token: token.to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 3_600_000,
                user: profile(),
            })
            .await
            .unwrap();
        Arc::new(session)
    }

    fn client(base_url: &str, session: Arc<Session<MemoryStore>>) -> ApiClient<MemoryStore> {
        ApiClient::new(base_url, Duration::from_secs(5), session).unwrap()
    }

    fn http_response(status: &str, body: &serde_json::Value) -> String {
        let body = body.to_string();
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Read one request: the head, then as many body bytes as it announces.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Backend stub answering a single request with `response` verbatim.
    /// The handle yields the raw request it received.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            request
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            &json!({"success": true, "data": 5, "error": null, "timestamp": "t"}),
        ))
        .await;

        let api = client(&base_url, signed_in("tok-123").await);
        let value: u32 = api.get("/api/signals/5").await.unwrap();
        assert_eq!(value, 5);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/signals/5 "));
        assert!(request.contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn test_no_token_no_authorization_header() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            &json!({"success": true, "data": 1, "error": null, "timestamp": "t"}),
        ))
        .await;

        let session = Arc::new(Session::load(MemoryStore::new()).await.unwrap());
        let _: u32 = client(&base_url, session).get("/api/signals/1").await.unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_401_with_truncated_body_still_signs_out() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"succ"
                .to_string(),
        )
        .await;

        let session = signed_in("tok").await;
        let api = client(&base_url, session.clone());
        let err = api.get::<u32>("/api/positions/1").await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(err.status, 401);
        assert_eq!(session.token().await, None);
        assert_eq!(session.store().get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(session.store().get(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_adopts_token() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            &json!({
                "success": true,
                "data": {
                    "token": "fresh-token",
                    "tokenType": "Bearer",
                    "expiresIn": 3600000,
                    "user": {
                        "id": 7,
                        "username": "desk",
                        "email": "desk@example.com",
                        "roles": ["ROLE_USER"],
                        "status": "ACTIVE"
                    }
                },
                "error": null,
                "timestamp": "t"
            }),
        ))
        .await;

        let session = Arc::new(Session::load(MemoryStore::new()).await.unwrap());
        let api = client(&base_url, session.clone());
        let login = api.login(" desk ", "Abc12345").await.unwrap();
        assert_eq!(login.user.username, "desk");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login "));
        assert!(request.contains(r#""username":"desk""#));

        assert_eq!(session.token().await.as_deref(), Some("fresh-token"));
        assert_eq!(session.current_user().await, Some(profile()));
        assert_eq!(
            session.store().get(TOKEN_KEY).await.unwrap().as_deref(),
            Some("fresh-token")
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let session = signed_in("tok").await;
        let api = client(&base_url, session.clone());
        let err = api.get::<u32>("/api/signals/1").await.unwrap_err();

        assert_eq!(err.status, 0);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.is_retryable());
        assert_eq!(session.token().await.as_deref(), Some("tok"));
    }
}
