//! One signed-in user's shared session state.

use crate::error::Result;
use crate::jar::{CookieJar, CookieStore};
use crate::once::OnceLedger;
use crate::persistence::SessionPersistence;
use agora_core::{SessionConfig, SessionId};
use std::sync::Arc;
use tracing::{debug, info};

/// The cookie jar and once-token history for one logical session.
///
/// Cloning is cheap and every clone refers to the same state; concurrent
/// requests for the session share it instead of copying cookies around.
#[derive(Debug, Clone)]
pub struct UserSession {
    id: SessionId,
    cookies: Arc<CookieJar>,
    once: Arc<OnceLedger>,
    persist_cookies: bool,
}

impl UserSession {
    /// Start a fresh session with a random id.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_id(SessionId::generate(), config)
    }

    /// Start an empty session under a known id.
    #[must_use]
    pub fn with_id(id: SessionId, config: &SessionConfig) -> Self {
        debug!(session = %id, cap = config.once_history_cap, "created session");
        Self {
            id,
            cookies: Arc::new(CookieJar::new()),
            once: Arc::new(OnceLedger::new(config.once_history_cap)),
            persist_cookies: config.persist_cookies,
        }
    }

    /// Session identifier, also the persistence key.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The session's cookie store.
    #[must_use]
    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    /// The session's once-token history.
    #[must_use]
    pub fn once_ledger(&self) -> &Arc<OnceLedger> {
        &self.once
    }

    /// Write the cookies to `store`, unless persistence is disabled.
    ///
    /// Returns whether anything was written.
    pub async fn persist(&self, store: &dyn SessionPersistence) -> Result<bool> {
        if !self.persist_cookies {
            return Ok(false);
        }
        let blob = self.cookies.export()?;
        store.store(self.id.as_str(), &blob).await?;
        debug!(session = %self.id, "persisted session cookies");
        Ok(true)
    }

    /// Load cookies previously written by [`UserSession::persist`].
    ///
    /// Returns how many cookies were restored.
    pub async fn restore(&self, store: &dyn SessionPersistence) -> Result<usize> {
        if !self.persist_cookies {
            return Ok(0);
        }
        match store.load(self.id.as_str()).await? {
            Some(blob) => self.cookies.import(&blob),
            None => Ok(0),
        }
    }

    /// Drop all cookies, in memory and in `store`.
    ///
    /// The once history is kept: a token spent before signing out stays spent.
    pub async fn sign_out(&self, store: &dyn SessionPersistence) -> Result<()> {
        self.cookies.clear();
        store.remove(self.id.as_str()).await?;
        info!(session = %self.id, "signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jar::ResponseHead;
    use crate::persistence::FilePersistence;
    use tempfile::TempDir;
    use url::Url;

    const TOKEN: &str = "0123456789abcdefXYZ";

    fn signed_in(config: &SessionConfig) -> (UserSession, Url) {
        let session = UserSession::new(config);
        let origin = Url::parse("https://www.v2ex.com/").expect("valid url");
        session.cookies().record_cookies(
            &ResponseHead::new(origin.clone(), 302)
                .with_set_cookie("A2=token; Domain=v2ex.com; Path=/; Max-Age=3600"),
        );
        (session, origin)
    }

    #[test]
    fn test_clones_share_state() {
        let (session, origin) = signed_in(&SessionConfig::default());
        let other = session.clone();
        other.once_ledger().mark_used(TOKEN);

        assert!(session.once_ledger().is_used(TOKEN));
        assert_eq!(
            other.cookies().cookie_header(&origin).as_deref(),
            Some("A2=token")
        );
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let temp = TempDir::new().expect("create temp dir");
        let store = FilePersistence::new(temp.path());
        let config = SessionConfig::default();
        let (session, origin) = signed_in(&config);

        assert!(session.persist(&store).await.expect("persist"));

        let resumed = UserSession::with_id(session.id().clone(), &config);
        assert_eq!(resumed.restore(&store).await.expect("restore"), 1);
        assert_eq!(
            resumed.cookies().cookie_header(&origin).as_deref(),
            Some("A2=token")
        );

        resumed.sign_out(&store).await.expect("sign out");
        assert!(resumed.cookies().is_empty());
        let fresh = UserSession::with_id(session.id().clone(), &config);
        assert_eq!(fresh.restore(&store).await.expect("restore"), 0);
    }

    #[tokio::test]
    async fn test_persistence_can_be_disabled() {
        let temp = TempDir::new().expect("create temp dir");
        let store = FilePersistence::new(temp.path());
        let config = SessionConfig {
            persist_cookies: false,
            ..SessionConfig::default()
        };
        let (session, _) = signed_in(&config);
        assert!(!session.persist(&store).await.expect("persist"));
        assert_eq!(store.load(session.id().as_str()).await.expect("load"), None);
    }
}
