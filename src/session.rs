//! Pending quotes awaiting a "confirm swap", keyed by conversation.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DexError, Result};
use crate::tools::normalize::QuoteResult;
use crate::tools::operation::SwapRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSession {
    pub params: SwapRequest,
    pub result: QuoteResult,
    pub created_at: DateTime<Utc>,
}

impl PendingSession {
    pub fn new(params: SwapRequest, result: QuoteResult) -> Self {
        PendingSession {
            params,
            result,
            created_at: Utc::now(),
        }
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, PendingSession>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// `ttl_secs <= 0` keeps quotes until they are confirmed or replaced.
    pub fn new(ttl_secs: i64) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl: (ttl_secs > 0).then(|| Duration::seconds(ttl_secs)),
        }
    }

    /// Replaces whatever quote the conversation had pending.
    pub async fn store(&self, session_id: &str, pending: PendingSession) {
        debug!("Storing pending quote for session {}", session_id);
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), pending);
    }

    /// The pending quote, if one exists and has not expired. Expired quotes are dropped.
    pub async fn pending(&self, session_id: &str) -> Result<PendingSession> {
        let mut sessions = self.sessions.write().await;
        let pending = sessions
            .get(session_id)
            .cloned()
            .ok_or(DexError::NoPendingQuote)?;

        if let Some(ttl) = self.ttl {
            if Utc::now() - pending.created_at > ttl {
                sessions.remove(session_id);
                return Err(DexError::QuoteExpired(ttl.num_seconds()));
            }
        }

        Ok(pending)
    }

    /// Removes and returns the pending quote under one write lock, so a quote is
    /// handed to at most one confirmation.
    pub async fn take(&self, session_id: &str) -> Result<PendingSession> {
        let mut sessions = self.sessions.write().await;
        let pending = sessions
            .remove(session_id)
            .ok_or(DexError::NoPendingQuote)?;

        if let Some(ttl) = self.ttl {
            if Utc::now() - pending.created_at > ttl {
                return Err(DexError::QuoteExpired(ttl.num_seconds()));
            }
        }

        Ok(pending)
    }

    /// Puts back a quote whose swap failed, unless a newer quote arrived meanwhile.
    pub async fn restore(&self, session_id: &str, pending: PendingSession) {
        debug!("Restoring pending quote for session {}", session_id);
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_insert(pending);
    }

    pub async fn clear(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(0)
    }
}
