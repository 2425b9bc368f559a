//! Sessions against a Geo Engine server.
//!
//! A [`Session`] is immutable once created and cheap to clone; every other
//! operation in this crate takes one by reference. [`SessionManager`] keeps
//! the current session for callers that want a single place to hold it.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use geoengine_common::{GeoEngineError, GeoEngineResult, RoleId, SessionToken, UserId};
use geoengine_protocol::{LoginRequest, UserSession};

use crate::config::{ClientConfig, Credentials};
use crate::http::{
    build_client, check_status, decode_json, join_url, normalize_base_url, transport_error,
};

/// An authenticated connection to one server.
#[derive(Clone)]
pub struct Session {
    server_url: String,
    token: SessionToken,
    user_id: Option<UserId>,
    created: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    roles: Vec<RoleId>,
    page_size: usize,
    client: Client,
}

impl Session {
    /// Create a session with the given credentials.
    ///
    /// Rejected credentials surface as `Authentication`, unreachable servers
    /// as `Connection`.
    #[instrument(skip(credentials, config), fields(url = %server_url))]
    pub async fn connect(
        server_url: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> GeoEngineResult<Self> {
        let server_url = normalize_base_url(server_url)?;
        let client = build_client(config)?;

        let request = match &credentials {
            Credentials::Anonymous => client.post(join_url(&server_url, "anonymous")),
            Credentials::Login { email, password } => client
                .post(join_url(&server_url, "login"))
                .json(&LoginRequest {
                    email: email.clone(),
                    password: password.clone(),
                }),
            Credentials::Token(token) => client
                .get(join_url(&server_url, "session"))
                .bearer_auth(token),
        };

        let authenticating = !matches!(credentials, Credentials::Anonymous);
        let to_auth_error = |err: GeoEngineError| {
            let rejected = matches!(
                &err,
                GeoEngineError::Server { status, .. }
                    if status.map_or(true, |s| (400..500).contains(&s))
            );
            if authenticating && rejected {
                GeoEngineError::Authentication(err.to_string())
            } else {
                err
            }
        };

        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response).await.map_err(to_auth_error)?;
        let body = response.bytes().await.map_err(transport_error)?;
        let user_session: UserSession = decode_json(&body).map_err(to_auth_error)?;

        let session = Self::from_user_session(server_url, client, user_session, config.page_size);

        info!(
            user = ?session.user_id,
            valid_until = ?session.valid_until,
            "Session created"
        );

        Ok(session)
    }

    /// Shorthand for [`Session::connect`] with anonymous credentials.
    pub async fn anonymous(server_url: &str, config: &ClientConfig) -> GeoEngineResult<Self> {
        Self::connect(server_url, Credentials::Anonymous, config).await
    }

    pub(crate) fn from_user_session(
        server_url: String,
        client: Client,
        session: UserSession,
        page_size: usize,
    ) -> Self {
        Self {
            server_url,
            token: session.id,
            user_id: session.user.map(|u| u.id),
            created: session.created,
            valid_until: session.valid_until,
            roles: session.roles,
            page_size,
            client,
        }
    }

    /// Base URL without a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// The logged-in user; anonymous sessions may not have one.
    pub fn user_id(&self) -> GeoEngineResult<UserId> {
        self.user_id.ok_or_else(|| {
            GeoEngineError::InvalidInput("session has no user id (anonymous session?)".to_string())
        })
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_expired(&self) -> bool {
        self.valid_until.map_or(false, |until| Utc::now() >= until)
    }

    /// End the session on the server. The value itself stays usable for
    /// inspection, but further requests will be rejected.
    #[instrument(skip(self), fields(url = %self.server_url))]
    pub async fn logout(&self) -> GeoEngineResult<()> {
        let request = self.request(Method::POST, "logout")?;
        self.send(request).await?;
        info!("Logged out");
        Ok(())
    }

    /// Start an authenticated request, refusing to build one for an expired session.
    pub(crate) fn request(&self, method: Method, path: &str) -> GeoEngineResult<RequestBuilder> {
        if self.is_expired() {
            return Err(GeoEngineError::SessionExpired(format!(
                "session was valid until {}",
                self.valid_until
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
            )));
        }

        let url = join_url(&self.server_url, path);
        debug!(method = %method, url = %url, "Request");

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(self.token.to_string()))
    }

    /// Send a request and check its status. A 401 means the server no
    /// longer accepts this session.
    pub(crate) async fn send(&self, request: RequestBuilder) -> GeoEngineResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await.map_err(|err| match err {
            GeoEngineError::Server {
                status: Some(401),
                message,
                ..
            } => GeoEngineError::SessionExpired(message),
            other => other,
        })
    }

    pub(crate) async fn send_bytes(&self, request: RequestBuilder) -> GeoEngineResult<Bytes> {
        let response = self.send(request).await?;
        response.bytes().await.map_err(transport_error)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> GeoEngineResult<T> {
        let body = self.send_bytes(request).await?;
        decode_json(&body)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GeoEngineResult<T> {
        let request = self.request(Method::GET, path)?;
        self.send_json(request).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server_url", &self.server_url)
            .field("user_id", &self.user_id)
            .field("valid_until", &self.valid_until)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Server:              {}", self.server_url)?;
        match self.user_id {
            Some(user) => writeln!(f, "User Id:             {}", user)?,
            None => writeln!(f, "User Id:             (anonymous)")?,
        }
        writeln!(f, "Session Id:          {}", self.token)?;
        if let Some(valid_until) = self.valid_until {
            writeln!(f, "Session valid until: {}", valid_until.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Holds the current session.
///
/// Mutation needs `&mut self`, so a manager can't be reset while a session
/// borrowed from it is still in use.
#[derive(Debug, Default)]
pub struct SessionManager {
    config: ClientConfig,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Connect and store the session, replacing any previous one.
    /// Without credentials an anonymous session is requested.
    pub async fn initialize(
        &mut self,
        server_url: &str,
        credentials: Option<Credentials>,
    ) -> GeoEngineResult<&Session> {
        let credentials = credentials.unwrap_or(Credentials::Anonymous);
        let session = Session::connect(server_url, credentials, &self.config).await?;
        Ok(self.session.insert(session))
    }

    pub fn get_session(&self) -> GeoEngineResult<&Session> {
        self.session.as_ref().ok_or(GeoEngineError::NotInitialized)
    }

    /// Forget the current session, optionally logging it out first.
    ///
    /// The session is cleared even if the logout request fails.
    pub async fn reset(&mut self, logout: bool) -> GeoEngineResult<()> {
        match self.session.take() {
            Some(session) if logout => session.logout().await,
            _ => Ok(()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn session(valid_until: Option<DateTime<Utc>>, user: Option<UserId>) -> Session {
        let user_session = UserSession {
            id: SessionToken(Uuid::new_v4()),
            user: user.map(|id| geoengine_protocol::session::SessionUser {
                id,
                email: None,
                real_name: None,
            }),
            created: None,
            valid_until,
            project: None,
            view: None,
            roles: vec![],
        };
        Session::from_user_session(
            // nothing listens here; requests must never get that far
            "http://127.0.0.1:9".to_string(),
            Client::new(),
            user_session,
            20,
        )
    }

    #[test]
    fn test_expired_session_refuses_requests() {
        let stale = session(Some(Utc::now() - Duration::minutes(1)), None);
        assert!(stale.is_expired());
        assert!(matches!(
            stale.request(Method::GET, "workflow"),
            Err(GeoEngineError::SessionExpired(_))
        ));
    }

    #[test]
    fn test_session_without_expiry_never_expires() {
        let session = session(None, None);
        assert!(!session.is_expired());
        assert!(session.request(Method::GET, "workflow").is_ok());
    }

    #[test]
    fn test_user_id() {
        let user = UserId(Uuid::new_v4());
        assert_eq!(session(None, Some(user)).user_id().unwrap(), user);
        assert!(matches!(
            session(None, None).user_id(),
            Err(GeoEngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_session_before_initialize() {
        let manager = SessionManager::default();
        assert!(matches!(
            manager.get_session(),
            Err(GeoEngineError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_reset_without_session() {
        let mut manager = SessionManager::default();
        manager.reset(true).await.unwrap();
        assert!(manager.get_session().is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let session = session(None, None);
        let token = session.token().to_string();
        assert!(!format!("{:?}", session).contains(&token));
    }
}
