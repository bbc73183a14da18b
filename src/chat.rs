//! Conversation driver
//!
//! Each submission appends a user message and a pending bot placeholder,
//! then answers the message on a background task. Background tasks report
//! back over a channel; `next_resolved` applies those results to the
//! transcript. Turns are independent: a second submission does not wait
//! for the first, and completion order follows handler latency.
//!
//! # Error Handling
//!
//! Channel sends use `let _ =`: if the conversation was dropped nobody is
//! waiting for the answer. A panicking turn still resolves its placeholder.

use crate::assistant::{self, Reply, ViewFileAction};
use crate::cache::ContentFetcher;
use crate::repo::RepositoryContext;
use crate::session::Session;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Placeholder content while a turn is pending
pub const THINKING_TEXT: &str = "Thinking...";

/// Replaces answers computed against a repository that has since been replaced
pub const STALE_REPLY: &str =
    "The repository changed while I was answering. Please ask again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub pending: bool,
    pub action: Option<ViewFileAction>,
    /// When `content` was last set; a resolved reply carries its answer time
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            content: content.to_string(),
            pending: false,
            action: None,
            sent_at: Utc::now(),
        }
    }

    fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            content: THINKING_TEXT.to_string(),
            pending: true,
            action: None,
            sent_at: Utc::now(),
        }
    }
}

/// Messages from turn tasks back to the conversation
pub enum ChatEvent {
    Resolved {
        id: Uuid,
        /// Generation of the session the turn ran against
        generation: Option<u64>,
        reply: Reply,
    },
    Crashed {
        id: Uuid,
        detail: String,
    },
}

pub struct Conversation {
    messages: Vec<ChatMessage>,
    session: Option<Arc<Session>>,
    generation: u64,
    thinking_delay: Duration,
    tx: mpsc::UnboundedSender<ChatEvent>,
    rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl Conversation {
    /// `thinking_delay` is the minimum time a placeholder stays visible.
    pub fn new(thinking_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            messages: Vec::new(),
            session: None,
            generation: 0,
            thinking_delay,
            tx,
            rx,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Replace the active repository. The previous session and its cache
    /// are dropped once in-flight turns release them.
    pub fn load(&mut self, context: RepositoryContext, fetcher: Arc<dyn ContentFetcher>) -> u64 {
        self.generation += 1;
        info!(
            generation = self.generation,
            repo = %context.metadata().name,
            files = context.files().len(),
            "repository session started"
        );
        self.session = Some(Arc::new(Session::new(self.generation, context, fetcher)));
        self.generation
    }

    /// Submit a user message. Blank input is ignored and returns `None`;
    /// otherwise returns the id of the pending bot placeholder.
    pub fn submit(&mut self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(text));
        let placeholder = ChatMessage::placeholder();
        let id = placeholder.id;
        self.messages.push(placeholder);

        let session = self.session.clone();
        let generation = session.as_ref().map(|s| s.generation());
        let delay = self.thinking_delay;
        let message = text.to_string();
        debug!(%id, "turn submitted");

        spawn_turn(self.tx.clone(), id, async move {
            let started = Instant::now();
            let reply = assistant::respond(session.as_deref(), &message).await;
            let elapsed = started.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
            ChatEvent::Resolved {
                id,
                generation,
                reply,
            }
        });
        Some(id)
    }

    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.pending).count()
    }

    /// Wait for the next turn to resolve and return its placeholder id.
    /// Returns `None` when nothing is pending.
    pub async fn next_resolved(&mut self) -> Option<Uuid> {
        if self.pending_count() == 0 {
            return None;
        }
        let event = self.rx.recv().await?;
        Some(self.apply(event))
    }

    /// Wait until every pending turn has resolved.
    pub async fn settle(&mut self) {
        while self.next_resolved().await.is_some() {}
    }

    /// Most recent resolved "view file" affordance
    pub fn last_action(&self) -> Option<&ViewFileAction> {
        self.messages
            .iter()
            .rev()
            .filter(|m| !m.pending)
            .find_map(|m| m.action.as_ref())
    }

    /// Resolve a "view file" affordance through the active session's cache.
    pub async fn open(&self, action: &ViewFileAction) -> Result<Arc<str>> {
        let session = self
            .session
            .as_ref()
            .context("No repository has been analyzed")?;
        let known = session
            .context()
            .files()
            .iter()
            .any(|f| f.locator == action.locator);
        if !known {
            anyhow::bail!("`{}` is not part of the current repository", action.path);
        }
        session
            .cache()
            .get(&action.locator)
            .await
            .with_context(|| format!("Failed to fetch {}", action.path))
    }

    fn apply(&mut self, event: ChatEvent) -> Uuid {
        let (id, content, action) = match event {
            ChatEvent::Resolved {
                id,
                generation,
                reply,
            } => match generation {
                Some(g) if g != self.generation => {
                    debug!(%id, stale = g, current = self.generation, "discarding stale reply");
                    (id, STALE_REPLY.to_string(), None)
                }
                _ => (id, reply.text, reply.action),
            },
            ChatEvent::Crashed { id, detail } => {
                (id, format!("Something went wrong while answering: {}", detail), None)
            }
        };

        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.content = content;
                message.action = action;
                message.pending = false;
                message.sent_at = Utc::now();
            }
            None => warn!(%id, "resolved turn has no placeholder"),
        }
        id
    }
}

fn spawn_turn<F>(tx: mpsc::UnboundedSender<ChatEvent>, id: Uuid, fut: F)
where
    F: Future<Output = ChatEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let event = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(event) => event,
            Err(panic) => {
                let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                warn!(%id, %detail, "turn crashed");
                ChatEvent::Crashed { id, detail }
            }
        };
        let _ = tx.send(event);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::NO_CONTEXT_REPLY;
    use crate::cache::testing::StubFetcher;
    use crate::repo::fixtures;

    fn conversation_with(paths: &[&str], fetcher: StubFetcher) -> (Conversation, Arc<StubFetcher>) {
        let fetcher = Arc::new(fetcher);
        let mut chat = Conversation::new(Duration::ZERO);
        chat.load(fixtures::context_with_paths("demo", paths), fetcher.clone());
        (chat, fetcher)
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let mut chat = Conversation::new(Duration::ZERO);
        assert!(chat.submit("").is_none());
        assert!(chat.submit("   \n\t").is_none());
        assert!(chat.messages().is_empty());
        assert_eq!(chat.pending_count(), 0);
        assert!(chat.next_resolved().await.is_none());
    }

    #[tokio::test]
    async fn test_submission_adds_user_message_and_placeholder() {
        let mut chat = Conversation::new(Duration::ZERO);
        let id = chat.submit("  help  ").unwrap();

        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].sender, Sender::User);
        assert_eq!(chat.messages()[0].content, "help");
        let placeholder = chat.message(id).unwrap();
        assert_eq!(placeholder.sender, Sender::Bot);
        assert!(placeholder.pending);
        assert_eq!(placeholder.content, THINKING_TEXT);

        assert_eq!(chat.next_resolved().await, Some(id));
        let resolved = chat.message(id).unwrap();
        assert!(!resolved.pending);
        assert_eq!(resolved.content, NO_CONTEXT_REPLY);
    }

    #[tokio::test]
    async fn test_thinking_delay_is_minimum_visible_time() {
        let mut chat = Conversation::new(Duration::from_millis(60));
        let started = Instant::now();
        chat.submit("hi");
        chat.settle().await;
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(chat.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_all_resolve() {
        let (mut chat, _) = conversation_with(&["src/app.js"], StubFetcher::new());
        let first = chat.submit("hi").unwrap();
        let second = chat.submit("how many stars?").unwrap();
        assert_eq!(chat.pending_count(), 2);

        chat.settle().await;
        assert_eq!(chat.pending_count(), 0);
        assert!(chat.message(first).unwrap().content.contains("**demo**"));
        assert!(chat.message(second).unwrap().content.contains("42 stars"));
    }

    #[tokio::test]
    async fn test_reply_from_replaced_session_is_discarded() {
        let (mut chat, fetcher) = conversation_with(&["src/app.js"], StubFetcher::new());
        let id = chat.submit("hi").unwrap();
        chat.load(fixtures::context_with_paths("other", &["main.go"]), fetcher);

        chat.settle().await;
        assert_eq!(chat.message(id).unwrap().content, STALE_REPLY);

        let fresh = chat.submit("hi").unwrap();
        chat.settle().await;
        assert!(chat.message(fresh).unwrap().content.contains("**other**"));
    }

    #[tokio::test]
    async fn test_resolution_updates_timestamp() {
        let mut chat = Conversation::new(Duration::from_millis(20));
        let id = chat.submit("hi").unwrap();
        let queued_at = chat.message(id).unwrap().sent_at;
        chat.settle().await;
        let resolved = chat.message(id).unwrap();
        assert!(!resolved.pending);
        assert!(resolved.sent_at > queued_at);
    }

    #[tokio::test]
    async fn test_open_action_uses_session_cache() {
        let fetcher = StubFetcher::new().with_file("blob:package.json", "{}");
        let (mut chat, fetcher) = conversation_with(&["package.json"], fetcher);
        chat.submit("find package.json");
        chat.settle().await;

        let action = chat.last_action().cloned().unwrap();
        assert_eq!(action.path, "package.json");
        assert_eq!(action.locator, "blob:package.json");

        assert_eq!(&*chat.open(&action).await.unwrap(), "{}");
        assert_eq!(&*chat.open(&action).await.unwrap(), "{}");
        assert_eq!(fetcher.calls_for("blob:package.json"), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_action_from_other_repository() {
        let (chat, _) = conversation_with(&["package.json"], StubFetcher::new());
        let foreign = ViewFileAction {
            locator: "blob:elsewhere.js".to_string(),
            path: "elsewhere.js".to_string(),
        };
        assert!(chat.open(&foreign).await.is_err());

        let empty = Conversation::new(Duration::ZERO);
        assert!(empty.open(&foreign).await.is_err());
    }
}
