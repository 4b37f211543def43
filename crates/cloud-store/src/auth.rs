//! Bearer credential handling.
//!
//! The client holds a persisted credential envelope: an access token and
//! an absolute expiry instant. There is no refresh flow — an expired or
//! missing credential ends the session and forces the user back to the
//! login screen.

use std::sync::Arc;

use chrono::Utc;
use log::warn;
use notewell_core::{Result, StoreError};

/// Persisted credential envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub access_token: String,
    /// Absolute expiry instant, epoch milliseconds.
    pub expires_at_ms: i64,
}

/// Persistence for the credential envelope (keychain/async-storage in
/// the app).
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<StoredCredential>;

    fn clear(&self);
}

/// Receives the forced sign-out signal so the app can reset navigation
/// to the unauthenticated state.
pub trait SessionSink: Send + Sync {
    fn session_expired(&self);
}

/// Produces bearer tokens for outbound calls, ending the session when
/// the stored credential is unusable.
#[derive(Clone)]
pub struct AuthGuard {
    credentials: Arc<dyn CredentialStore>,
    sink: Arc<dyn SessionSink>,
}

impl AuthGuard {
    pub fn new(credentials: Arc<dyn CredentialStore>, sink: Arc<dyn SessionSink>) -> Self {
        Self { credentials, sink }
    }

    /// The current access token, or an auth error after invalidating the
    /// session. Never attempts a silent refresh.
    pub fn bearer_token(&self) -> Result<String> {
        let Some(credential) = self.credentials.load() else {
            return Err(self.sign_out("missing stored credential"));
        };
        if credential.access_token.is_empty() {
            return Err(self.sign_out("empty access token"));
        }
        if Utc::now().timestamp_millis() >= credential.expires_at_ms {
            return Err(self.sign_out("access token expired"));
        }
        Ok(credential.access_token)
    }

    fn sign_out(&self, reason: &str) -> StoreError {
        warn!("ending session: {reason}");
        self.credentials.clear();
        self.sink.session_expired();
        StoreError::auth(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedCredentials(Mutex<Option<StoredCredential>>);

    impl CredentialStore for FixedCredentials {
        fn load(&self) -> Option<StoredCredential> {
            self.0.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.0.lock().unwrap().take();
        }
    }

    #[derive(Default)]
    struct CountingSink(AtomicUsize);

    impl SessionSink for CountingSink {
        fn session_expired(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn guard(
        credential: Option<StoredCredential>,
    ) -> (AuthGuard, Arc<FixedCredentials>, Arc<CountingSink>) {
        let credentials = Arc::new(FixedCredentials(Mutex::new(credential)));
        let sink = Arc::new(CountingSink::default());
        (
            AuthGuard::new(credentials.clone(), sink.clone()),
            credentials,
            sink,
        )
    }

    #[test]
    fn valid_credential_yields_token() {
        let (auth, _, sink) = guard(Some(StoredCredential {
            access_token: "tok".to_string(),
            expires_at_ms: Utc::now().timestamp_millis() + 60_000,
        }));

        assert_eq!(auth.bearer_token().unwrap(), "tok");
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn expired_credential_clears_store_and_signals_sign_out() {
        let (auth, credentials, sink) = guard(Some(StoredCredential {
            access_token: "tok".to_string(),
            expires_at_ms: Utc::now().timestamp_millis() - 1,
        }));

        let err = auth.bearer_token().unwrap_err();
        assert!(err.is_auth());
        assert!(credentials.load().is_none());
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_credential_signals_sign_out() {
        let (auth, _, sink) = guard(None);
        assert!(auth.bearer_token().unwrap_err().is_auth());
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }
}
