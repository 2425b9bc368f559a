//! Client configuration and credentials.
//!
//! Both can be read from the environment; a `.env` file in the working
//! directory is loaded first if present.

use std::env;
use std::time::Duration;

/// Transport settings shared by every request of a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout, including reading the body
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Page size for paged listings like `GET /datasets`
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(3600),
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("geoengine-client/{}", env!("CARGO_PKG_VERSION")),
            page_size: 20,
        }
    }
}

impl ClientConfig {
    /// Defaults, with `GEOENGINE_TIMEOUT_SECS` overriding the request timeout.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(secs) = env::var("GEOENGINE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// How to obtain a session.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `POST /anonymous`
    Anonymous,
    /// `POST /login`
    Login { email: String, password: String },
    /// Reuse an existing session id via `GET /session`
    Token(String),
}

impl Credentials {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Login {
            email: email.into(),
            password: password.into(),
        }
    }

    /// `GEOENGINE_EMAIL` + `GEOENGINE_PASSWORD`, else `GEOENGINE_TOKEN`, else anonymous.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        match (var("GEOENGINE_EMAIL"), var("GEOENGINE_PASSWORD")) {
            (Some(email), Some(password)) => Credentials::Login { email, password },
            _ => match var("GEOENGINE_TOKEN") {
                Some(token) => Credentials::Token(token),
                None => Credentials::Anonymous,
            },
        }
    }
}

impl std::fmt::Debug for Credentials {
    // Never print secrets
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Login { email, .. } => f
                .debug_struct("Login")
                .field("email", email)
                .field("password", &"***")
                .finish(),
            Credentials::Token(_) => f.write_str("Token(***)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 20);
        assert!(config.user_agent.starts_with("geoengine-client/"));
    }

    #[test]
    fn test_page_size_at_least_one() {
        let config = ClientConfig::default().with_page_size(0);
        assert_eq!(config.page_size, 1);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let login = format!("{:?}", Credentials::login("foo@example.com", "hunter2"));
        assert!(login.contains("foo@example.com"));
        assert!(!login.contains("hunter2"));

        let token = format!("{:?}", Credentials::Token("secret".into()));
        assert!(!token.contains("secret"));
    }
}
