//! Search-as-you-type title suggestions
//!
//! Each keystroke restarts a debounce timer; only the input that survives the
//! delay queries the source, and a newer keystroke cancels an older query
//! even if it is already in flight. Results are published on a watch channel.

use common::debounce::Debouncer;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{model::TitleMatch, source::ListingSource};

/// Delay between the last keystroke and the query
pub const SUGGESTION_DELAY: Duration = Duration::from_millis(300);

/// Shorter terms clear the suggestions instead of querying
pub const MIN_SUGGESTION_CHARS: usize = 3;

/// Suggestions returned per query
pub const MAX_SUGGESTIONS: usize = 5;

/// Debounced title search bound to one input field
pub struct SuggestionSearch<S> {
    source: Arc<S>,
    debouncer: Debouncer,
    results: Arc<watch::Sender<Vec<TitleMatch>>>,
}

impl<S> SuggestionSearch<S>
where
    S: ListingSource + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Self::with_delay(source, SUGGESTION_DELAY)
    }

    pub fn with_delay(source: Arc<S>, delay: Duration) -> Self {
        let (results, _) = watch::channel(Vec::new());
        Self {
            source,
            debouncer: Debouncer::new(delay),
            results: Arc::new(results),
        }
    }

    /// Receiver observing the latest suggestions
    pub fn subscribe(&self) -> watch::Receiver<Vec<TitleMatch>> {
        self.results.subscribe()
    }

    /// Current suggestions
    pub fn current(&self) -> Vec<TitleMatch> {
        self.results.borrow().clone()
    }

    /// Record the field's new contents; must run inside a tokio runtime
    pub fn input(&self, text: &str) {
        let term = text.trim().to_string();
        let source = self.source.clone();
        let results = self.results.clone();

        self.debouncer.call(async move {
            if term.chars().count() < MIN_SUGGESTION_CHARS {
                results.send_replace(Vec::new());
                return;
            }

            match source.search_titles(&term, MAX_SUGGESTIONS).await {
                Ok(matches) => {
                    debug!("{} suggestions for '{}'", matches.len(), term);
                    results.send_replace(matches);
                }
                Err(e) => warn!("Suggestion search for '{}' failed: {}", term, e),
            }
        });
    }

    /// Abandon any pending query, e.g. when the field loses focus
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}
