//! Session management
//!
//! Keeps one transcript per session id for the lifetime of the process.
//! Each transcript sits behind its own async mutex so a turn holds it for
//! its whole duration while other sessions proceed.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::agent::conversation::Transcript;
use crate::core::Message;

/// Shared, lockable transcript of one session
pub type SessionHandle = Arc<Mutex<Transcript>>;

/// In-memory registry of session transcripts
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    system_prompt: Option<String>,
}

impl SessionManager {
    /// Create a manager whose new sessions open with `system_prompt`
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            system_prompt,
        }
    }

    fn fresh_transcript(&self) -> Transcript {
        match &self.system_prompt {
            Some(prompt) => Transcript::with_system_prompt(prompt.clone()),
            None => Transcript::new(),
        }
    }

    fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Get the session's transcript, creating it if absent
    pub fn start_or_resume(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.get(session_id) {
            return handle;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = session_id, "Starting session");
                Arc::new(Mutex::new(self.fresh_transcript()))
            })
            .clone()
    }

    /// Append a message to the session's transcript
    pub async fn append(&self, session_id: &str, message: Message) {
        self.start_or_resume(session_id).lock().await.push(message);
    }

    /// Copy of the session's transcript
    pub async fn snapshot(&self, session_id: &str) -> Option<Transcript> {
        let handle = self.get(session_id)?;
        let transcript = handle.lock().await;
        Some(transcript.clone())
    }

    /// Clear a session's history, keeping the system prompt.
    ///
    /// Returns false if the session does not exist.
    pub async fn clear(&self, session_id: &str) -> bool {
        match self.get(session_id) {
            Some(handle) => {
                handle.lock().await.clear();
                true
            }
            None => false,
        }
    }

    /// Forget a session entirely
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    /// Known session ids, sorted
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_or_resume_reuses_transcript() {
        let manager = SessionManager::new(Some("sys".into()));
        let first = manager.start_or_resume("alice");
        first.lock().await.add_user("hi");

        let again = manager.start_or_resume("alice");
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.lock().await.len(), 2);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new(None);
        manager.append("alice", Message::user("Nvidia?")).await;
        manager.append("bob", Message::user("Apple?")).await;

        let alice = manager.snapshot("alice").await.unwrap();
        let bob = manager.snapshot("bob").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice.last_user_message().unwrap().text(), "Nvidia?");
        assert_eq!(bob.last_user_message().unwrap().text(), "Apple?");
        assert_eq!(manager.session_ids(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_clear_and_remove() {
        let manager = SessionManager::new(Some("sys".into()));
        manager.append("s", Message::user("hello")).await;

        assert!(manager.clear("s").await);
        assert_eq!(manager.snapshot("s").await.unwrap().len(), 1);
        assert!(!manager.clear("missing").await);

        assert!(manager.remove("s"));
        assert!(manager.snapshot("s").await.is_none());
        assert!(manager.is_empty());
    }
}
