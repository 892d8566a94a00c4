//! Discord transport adapter (stub).
//!
//! Implements the MessagingTransport trait for the Discord Bot API.
//! In production, this would use `serenity` for the REST calls; currently a
//! stub that generates anchor handles locally and logs every operation.

use std::sync::atomic::{AtomicU64, Ordering};

use anchorstream_config::TransportConfig;
use anchorstream_core::error::TransportError;
use anchorstream_core::transport::{AnchorHandle, MessagingTransport, RequestHandle};
use async_trait::async_trait;
use tracing::info;

/// Discord transport configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from the Discord Developer Portal.
    pub bot_token: String,
    /// Allowed user IDs. Empty = deny all, ["*"] = allow all.
    pub allowed_users: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

impl From<&TransportConfig> for DiscordConfig {
    fn from(cfg: &TransportConfig) -> Self {
        Self {
            bot_token: cfg.token.clone().unwrap_or_default(),
            allowed_users: cfg.allowed_users.clone(),
        }
    }
}

/// Discord transport adapter.
pub struct DiscordTransport {
    config: DiscordConfig,
    next_id: AtomicU64,
}

impl DiscordTransport {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// Check if a sender is allowed (allowlist check).
    pub fn is_allowed(&self, sender_id: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return false;
        }
        if self.config.allowed_users.iter().any(|u| u == "*") {
            return true;
        }
        self.config.allowed_users.iter().any(|u| u == sender_id)
    }

    fn ensure_token(&self) -> Result<(), TransportError> {
        if self.config.bot_token.is_empty() {
            return Err(TransportError::Unauthorized("missing bot token".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingTransport for DiscordTransport {
    fn name(&self) -> &str {
        "discord"
    }

    async fn reply(
        &self,
        origin: &RequestHandle,
        content: &str,
    ) -> Result<AnchorHandle, TransportError> {
        self.ensure_token()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let anchor = AnchorHandle(format!("discord-msg-{id}"));
        info!(
            origin = %origin,
            anchor = %anchor,
            content_len = content.len(),
            "Discord reply (stub)"
        );
        Ok(anchor)
    }

    async fn edit_throttled(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> Result<(), TransportError> {
        self.ensure_token()?;
        info!(
            anchor = %anchor,
            content_len = content.len(),
            "Discord throttled edit (stub)"
        );
        Ok(())
    }

    async fn edit_immediate(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> Result<(), TransportError> {
        self.ensure_token()?;
        info!(
            anchor = %anchor,
            content_len = content.len(),
            "Discord immediate edit (stub)"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        Ok(!self.config.bot_token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DiscordConfig {
        DiscordConfig {
            bot_token: "test-discord-token".into(),
            allowed_users: vec!["*".into()],
        }
    }

    #[test]
    fn transport_name() {
        let t = DiscordTransport::new(test_config());
        assert_eq!(t.name(), "discord");
    }

    #[test]
    fn allowlist_checks() {
        let t = DiscordTransport::new(test_config());
        assert!(t.is_allowed("anyone"));

        let specific = DiscordTransport::new(DiscordConfig {
            allowed_users: vec!["user1".into()],
            ..test_config()
        });
        assert!(specific.is_allowed("user1"));
        assert!(!specific.is_allowed("user2"));

        let deny_all = DiscordTransport::new(DiscordConfig {
            allowed_users: vec![],
            ..test_config()
        });
        assert!(!deny_all.is_allowed("anyone"));
    }

    #[test]
    fn config_from_transport_section() {
        let section = TransportConfig {
            token: Some("tok".into()),
            allowed_users: vec!["*".into()],
        };
        let cfg = DiscordConfig::from(&section);
        assert_eq!(cfg.bot_token, "tok");
        assert_eq!(cfg.allowed_users, vec!["*".to_string()]);
    }

    #[test]
    fn token_redacted_in_debug() {
        let cfg = test_config();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("test-discord-token"));
    }

    #[tokio::test]
    async fn reply_and_edits_succeed_with_token() {
        let t = DiscordTransport::new(test_config());
        let anchor = t
            .reply(&RequestHandle("chan#42".into()), "…")
            .await
            .unwrap();
        assert!(t.edit_throttled(&anchor, "Hello").await.is_ok());
        assert!(t.edit_immediate(&anchor, "Hello world").await.is_ok());
        assert!(t.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let t = DiscordTransport::new(DiscordConfig {
            bot_token: String::new(),
            allowed_users: vec!["*".into()],
        });
        let err = t
            .reply(&RequestHandle("chan#42".into()), "…")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unauthorized(_)));
        assert!(!t.health_check().await.unwrap());
    }
}
