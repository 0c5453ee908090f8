//! Session middleware configuration.
//!
//! Sets up signed-cookie sessions using tower-sessions. The session holds the
//! signed-in user and the serialized cart snapshot.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "agar_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-process store.
#[must_use]
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config))
}

/// Derive the 64-byte cookie signing key from the configured secret.
fn signing_key(config: &StorefrontConfig) -> Key {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::config::ShopApiConfig;

    fn config(secret: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from(secret.to_owned()),
            api: ShopApiConfig {
                base_url: Url::parse("http://localhost:4000/api/").unwrap(),
                token: None,
                timeout: Duration::from_secs(10),
            },
            order_submission_timeout: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_signing_key_follows_secret() {
        let first = signing_key(&config(&"a".repeat(32)));
        let again = signing_key(&config(&"a".repeat(32)));
        let other = signing_key(&config(&"b".repeat(32)));

        assert_eq!(first.master(), again.master());
        assert_ne!(first.master(), other.master());
    }

    #[test]
    fn test_layer_uses_signed_cookies() {
        let _layer: SessionManagerLayer<MemoryStore, SignedCookie> =
            create_session_layer(&config(&"a".repeat(32)));
    }
}
