//! Conversational assistant over the analyzed repository
//!
//! `respond` is the single entry point: it guards against a missing
//! session, classifies the message with the static rule table and awaits
//! the selected handler. Synchronous and fetching handlers share the same
//! async contract, so callers suspend uniformly.

pub mod handlers;
pub mod intent;


use crate::repo::FileEntry;
use crate::session::Session;
use intent::IntentMatcher;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reply used for every message while no repository has been analyzed
pub const NO_CONTEXT_REPLY: &str = "Please analyze a repository first.";

/// Reply used when no rule matches
pub const FALLBACK_REPLY: &str =
    "I'm not sure how to help with that. Type `help` to see what I can do.";

/// "View file" affordance attached to a reply.
///
/// The host renders it as a control that fetches `locator` and shows the
/// body under `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFileAction {
    pub locator: String,
    pub path: String,
}

impl ViewFileAction {
    pub fn for_entry(entry: &FileEntry) -> Self {
        Self {
            locator: entry.locator.clone(),
            path: entry.path.clone(),
        }
    }
}

/// Formatted answer for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub action: Option<ViewFileAction>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: ViewFileAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Answer `message` against `session`.
pub async fn respond(session: Option<&Session>, message: &str) -> Reply {
    let Some(session) = session else {
        return Reply::text(NO_CONTEXT_REPLY);
    };

    match IntentMatcher::shared().classify(message) {
        Some(matched) => {
            debug!(intent = %matched.intent, argument = ?matched.argument, "intent matched");
            handlers::handle(session, &matched, message).await
        }
        None => {
            debug!("no intent matched");
            Reply::text(FALLBACK_REPLY)
        }
    }
}
