//! One analysis session: the repository context plus its content cache
//!
//! Sessions are immutable handles shared with in-flight turns through an
//! `Arc`. Analyzing another repository builds a new session with a fresh
//! cache and a higher generation; turns started against an older session
//! are recognized by their generation when they resolve.

use crate::cache::{ContentCache, ContentFetcher};
use crate::repo::RepositoryContext;
use std::sync::Arc;

pub struct Session {
    generation: u64,
    context: RepositoryContext,
    cache: ContentCache,
}

impl Session {
    pub fn new(
        generation: u64,
        context: RepositoryContext,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            generation,
            context,
            cache: ContentCache::new(fetcher),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn context(&self) -> &RepositoryContext {
        &self.context
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }
}
