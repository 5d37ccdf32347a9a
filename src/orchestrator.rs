use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{IndexerError, Result};
use crate::events::{IndexingEvent, Notifier};
use crate::index::{aggregate, Divider, KeywordIndex};
use crate::keywords::KeywordExtractor;
use crate::llm::DEFAULT_PROMPT;
use crate::pdf::{extract_page_texts, PageText, PdfParser};
use crate::session::{ExtractionSession, SessionRegistry, SessionState};

/// Runs keyword extraction over `pages` one page at a time and aggregates
/// the result.
///
/// `on_page(done, total)` fires after each page's keywords are in, so
/// progress only ever moves forward.
pub async fn index_pages<F>(
    extractor: &KeywordExtractor,
    pages: &[PageText],
    prompt: &str,
    divider: Option<Divider>,
    mut on_page: F,
) -> KeywordIndex
where
    F: FnMut(usize, usize),
{
    let total = pages.len();
    let mut found: Vec<(usize, BTreeSet<String>)> = Vec::with_capacity(total);

    for (i, page) in pages.iter().enumerate() {
        let keywords = extractor.extract_keywords(&page.text, prompt).await;
        tracing::debug!(page = page.number, count = keywords.len(), "page keywords extracted");
        found.push((page.number, keywords));
        on_page(i + 1, total);
    }

    aggregate(found, divider)
}

/// End-to-end driver for one document: PDF pages → keywords → index, with
/// lifecycle tracking and session notifications.
pub struct Orchestrator {
    parser: Arc<dyn PdfParser>,
    extractor: KeywordExtractor,
    notifier: Arc<Notifier>,
    sessions: Arc<SessionRegistry>,
}

impl Orchestrator {
    pub fn new(parser: Arc<dyn PdfParser>, extractor: KeywordExtractor, notifier: Arc<Notifier>) -> Self {
        Self {
            parser,
            extractor,
            notifier,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Processes the session's document and publishes `progress` events
    /// followed by exactly one `completed` or `failed`.
    ///
    /// Does not touch the source file; see [`Orchestrator::handle`].
    pub async fn run(&self, session: &mut ExtractionSession) -> Result<KeywordIndex> {
        self.transition(session, SessionState::Processing);
        tracing::info!(session_id = %session.id, file_path = %session.source.display(), "starting PDF keyword extraction");

        match self.process(session).await {
            Ok(index) => {
                self.transition(session, SessionState::Completed);
                tracing::info!(session_id = %session.id, keyword_count = index.len(), "PDF keyword extraction completed");
                self.notifier
                    .publish(session.id, IndexingEvent::completed(index.clone()));
                Ok(index)
            }
            Err(e) => {
                self.transition(session, SessionState::Failed);
                tracing::error!(session_id = %session.id, error = %e, "PDF keyword extraction failed");
                self.notifier
                    .publish(session.id, IndexingEvent::failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Job handler: [`run`](Orchestrator::run), then remove the source file
    /// and close the session's topic, whatever the outcome.
    pub async fn handle(&self, mut session: ExtractionSession) -> (ExtractionSession, Result<KeywordIndex>) {
        let result = self.run(&mut session).await;

        remove_source(&session.source).await;
        self.notifier.close(session.id);

        (session, result)
    }

    async fn process(&self, session: &ExtractionSession) -> Result<KeywordIndex> {
        let parser = Arc::clone(&self.parser);
        let source = session.source.clone();
        let pages = tokio::task::spawn_blocking(move || extract_page_texts(parser.as_ref(), &source))
            .await
            .map_err(|e| IndexerError::Job(format!("page extraction task failed: {}", e)))??;

        if pages.is_empty() {
            return Err(IndexerError::NoContent(session.source.display().to_string()));
        }

        let prompt = session.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
        let id = session.id;
        let notifier = &self.notifier;

        let index = index_pages(&self.extractor, &pages, prompt, session.divider, |done, total| {
            notifier.publish(id, IndexingEvent::progress(done, total));
        })
        .await;

        Ok(index)
    }

    fn transition(&self, session: &mut ExtractionSession, next: SessionState) {
        if session.transition(next) {
            self.sessions.record(session.id, next);
        }
    }
}

async fn remove_source(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed source file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove source file"),
    }
}

/// A job accepted by the [`JobQueue`].
pub struct SubmittedJob {
    pub session_id: Uuid,
    /// Subscribed before the job starts, so no event is missed.
    pub events: broadcast::Receiver<IndexingEvent>,
    pub handle: JoinHandle<Result<KeywordIndex>>,
}

/// In-process job runner: each submitted session runs as its own tokio task.
#[derive(Clone)]
pub struct JobQueue {
    orchestrator: Arc<Orchestrator>,
}

impl JobQueue {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Queues a document for indexing. The job owns `source` and deletes it
    /// when done.
    pub fn submit(&self, source: impl Into<PathBuf>, prompt: Option<String>, divider: Option<Divider>) -> SubmittedJob {
        self.submit_session(ExtractionSession::new(source, prompt, divider))
    }

    pub fn submit_session(&self, session: ExtractionSession) -> SubmittedJob {
        let session_id = session.id;
        let events = self.orchestrator.notifier().subscribe(session_id);
        self.orchestrator.sessions().record(session_id, session.state());

        let orchestrator = Arc::clone(&self.orchestrator);
        let handle = tokio::spawn(async move {
            let (_, result) = orchestrator.handle(session).await;
            result
        });

        SubmittedJob {
            session_id,
            events,
            handle,
        }
    }

    pub fn state(&self, session_id: Uuid) -> Option<SessionState> {
        self.orchestrator.sessions().state(session_id)
    }

    /// Drops finished sessions from the registry. Their states are no longer
    /// reported by [`state`](JobQueue::state) afterwards.
    pub fn prune_finished(&self) -> usize {
        self.orchestrator.sessions().prune_finished()
    }
}
