//! One open document and its parse lifecycle.
//!
//! Edits never parse inline. Each [`Document::request_parse`] bumps a
//! generation counter and spawns a task that sleeps out the debounce window,
//! then parses only if it is still the newest request. A superseded task
//! discards its work silently: no tree update and no notification, so a burst
//! of keystrokes collapses to a single parse of the final text.
//!
//! The exposed tree is always a *completed* parse. The generation is
//! re-checked under the write lock right before commit, so a stale parse can
//! never overwrite a newer one even if the tasks race.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::trace;

use tomlit_parser::{parse_document, SyntaxTree};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Document {
    name: String,
    debounce: Duration,
    generation: AtomicU64,
    parsing: AtomicBool,
    tree: RwLock<Option<Arc<SyntaxTree>>>,
    parsed: broadcast::Sender<()>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_debounce(name, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(name: impl Into<String>, debounce: Duration) -> Arc<Self> {
        let (parsed, _) = broadcast::channel(16);
        Arc::new(Self {
            name: name.into(),
            debounce,
            generation: AtomicU64::new(0),
            parsing: AtomicBool::new(false),
            tree: RwLock::new(None),
            parsed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schedule a parse of `text`. Supersedes any parse still in flight.
    ///
    /// Syntax errors are not failures: they come back as diagnostics on the
    /// committed tree.
    pub fn request_parse(self: &Arc<Self>, text: Arc<str>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.parsing.store(true, Ordering::SeqCst);
        let document = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(document.debounce).await;
            if document.generation.load(Ordering::SeqCst) != generation {
                trace!(name = %document.name, generation, "parse superseded before start");
                return;
            }
            let tree = Arc::new(parse_document(&text));
            {
                let mut slot = document
                    .tree
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                if document.generation.load(Ordering::SeqCst) != generation {
                    trace!(name = %document.name, generation, "parse superseded before commit");
                    return;
                }
                *slot = Some(tree);
                document.parsing.store(false, Ordering::SeqCst);
            }
            // Receivers may come and go; no receiver is not an error.
            let _ = document.parsed.send(());
        });
    }

    /// The most recently completed parse, or `None` before the first one.
    pub fn tree(&self) -> Option<Arc<SyntaxTree>> {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True from the moment an edit is requested until its parse (or a
    /// superseding one) commits.
    pub fn is_parsing(&self) -> bool {
        self.parsing.load(Ordering::SeqCst)
    }

    /// Subscribe to parse completions. The notification carries no payload;
    /// subscribers re-read [`Document::tree`]. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.parsed.subscribe()
    }
}
