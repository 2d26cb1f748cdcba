//! Concurrent import coordinator
//!
//! Drives one import: pulls records from the streaming parser, reconciles
//! sets inline in source order, and fans card reconciliation out to a bounded
//! task group.
//!
//! **Failure handling:**
//! - The first error (parser, mapper, set or card task) wins; later errors are
//!   logged and dropped.
//! - The first error cancels the parser token; the remaining channel is
//!   drained without dispatching.
//! - Running card tasks are never aborted, they finish and commit.
//!
//! **Result precedence:** first error → `Cancelled` (external token) →
//! `Collation` (incomplete multi-face cards) → report.

use super::reconciler::Reconciler;
use crate::collator::{expected_face_count, Collation, FaceCollator};
use crate::db;
use crate::error::{ImportError, ImportResult};
use crate::mapper;
use crate::models::{Card, ImportReport, ImportSession, ImportState, ImportStats};
use crate::parser::{spawn_parser, Record};
use cardvault_common::config::ImportSettings;
use sqlx::SqlitePool;
use std::io::Read;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Import coordinator
pub struct ImportCoordinator {
    pool: SqlitePool,
    settings: ImportSettings,
}

/// Mutable bookkeeping of one run
struct RunState {
    session: ImportSession,
    first_error: Option<ImportError>,
    parser_cancel: CancellationToken,
    sets_seen: usize,
    cards_dispatched: usize,
}

impl RunState {
    /// Record a failure; only the first one is kept
    fn fail(&mut self, err: ImportError) {
        if self.first_error.is_some() {
            warn!(
                session_id = %self.session.session_id,
                error = %err,
                "Additional import failure after first error"
            );
            return;
        }

        error!(session_id = %self.session.session_id, error = %err, "Import failed");
        self.first_error = Some(err);
        self.parser_cancel.cancel();
        self.session.transition_to(ImportState::Failed);
    }

    /// Whether new work may still be dispatched
    fn accepting(&self) -> bool {
        self.first_error.is_none() && !self.parser_cancel.is_cancelled()
    }

    fn joined(&mut self, joined: Result<ImportResult<()>, JoinError>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.fail(err),
            Err(join_err) => self.fail(ImportError::Internal(format!(
                "card reconciliation task failed: {}",
                join_err
            ))),
        }
    }
}

impl ImportCoordinator {
    pub fn new(pool: SqlitePool, settings: ImportSettings) -> Self {
        Self { pool, settings }
    }

    /// Import one catalog document
    ///
    /// `cancel` is the external cancellation signal; cancelling it stops the
    /// parser and dispatch, waits for running card tasks and returns
    /// [`ImportError::Cancelled`].
    pub async fn run<R>(&self, reader: R, cancel: CancellationToken) -> ImportResult<ImportReport>
    where
        R: Read + Send + 'static,
    {
        let workers = self.settings.workers.max(1);
        let stats = Arc::new(ImportStats::new());
        let reconciler = Reconciler::new(self.pool.clone(), stats.clone(), &self.settings);

        let mut state = RunState {
            session: ImportSession::new(),
            first_error: None,
            parser_cancel: cancel.child_token(),
            sets_seen: 0,
            cards_dispatched: 0,
        };

        info!(
            session_id = %state.session.session_id,
            workers,
            channel_capacity = self.settings.channel_capacity,
            "Starting catalog import"
        );

        let (mut records, parser) = spawn_parser(
            reader,
            self.settings.channel_capacity,
            state.parser_cancel.clone(),
        );
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks: JoinSet<ImportResult<()>> = JoinSet::new();
        let mut collator = FaceCollator::new();

        loop {
            let item = tokio::select! {
                biased;
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    state.joined(joined);
                    continue;
                }
                item = records.recv() => item,
            };

            let Some(item) = item else { break };

            if !state.accepting() {
                continue;
            }

            match item {
                Err(err) => state.fail(err),
                Ok(Record::Set(raw)) => {
                    let result = match mapper::map_set(raw) {
                        Ok(set) => reconciler.reconcile_set(&set).await.map(|_| ()),
                        Err(err) => Err(err),
                    };
                    match result {
                        Ok(()) => state.sets_seen += 1,
                        Err(err) => state.fail(err),
                    }
                }
                Ok(Record::Card(raw)) => {
                    let card = match mapper::map_card(raw) {
                        Ok(card) => card,
                        Err(err) => {
                            state.fail(err);
                            continue;
                        }
                    };

                    let expected = expected_face_count(&card.name, &card.layout);
                    let card = if expected > 1 {
                        match collator.push(expected, card) {
                            Collation::Incomplete => continue,
                            Collation::Complete(card) => card,
                        }
                    } else {
                        card
                    };

                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            state.fail(ImportError::Internal("worker pool closed".to_string()));
                            continue;
                        }
                    };

                    // A failed task releases its permit before it is joined
                    while let Some(joined) = tasks.try_join_next() {
                        state.joined(joined);
                    }
                    if !state.accepting() {
                        continue;
                    }

                    state.cards_dispatched += 1;
                    let reconciler = reconciler.clone();
                    tasks.spawn(async move {
                        let _permit = permit;
                        reconcile_card_task(reconciler, card).await
                    });
                }
            }
        }

        if state.first_error.is_none() {
            state.session.transition_to(ImportState::Draining);
        }

        debug!(
            session_id = %state.session.session_id,
            outstanding = tasks.len(),
            "Record stream ended, waiting for card tasks"
        );
        while let Some(joined) = tasks.join_next().await {
            state.joined(joined);
        }

        match parser.await {
            Ok(sent) => debug!(session_id = %state.session.session_id, records = sent, "Parser joined"),
            Err(join_err) => state.fail(ImportError::Internal(format!("parser task failed: {}", join_err))),
        }

        if let Some(err) = state.first_error.take() {
            state.session.transition_to(ImportState::Done);
            return Err(err);
        }

        if cancel.is_cancelled() {
            state.session.transition_to(ImportState::Failed);
            state.session.transition_to(ImportState::Done);
            warn!(
                session_id = %state.session.session_id,
                sets = state.sets_seen,
                cards = state.cards_dispatched,
                "Import cancelled"
            );
            return Err(ImportError::Cancelled);
        }

        let pending = collator.pending_keys();
        if !pending.is_empty() {
            state.session.transition_to(ImportState::Failed);
            state.session.transition_to(ImportState::Done);
            let err = ImportError::Collation(pending.iter().map(ToString::to_string).collect());
            error!(session_id = %state.session.session_id, error = %err, "Import failed");
            return Err(err);
        }

        let mut conn = self.pool.acquire().await?;
        let report = ImportReport {
            card_count: db::count_cards(&mut conn).await?,
            set_count: db::count_sets(&mut conn).await?,
            stats: stats.snapshot(),
        };

        state.session.transition_to(ImportState::Done);
        info!(
            session_id = %state.session.session_id,
            sets = state.sets_seen,
            cards = state.cards_dispatched,
            card_count = report.card_count,
            set_count = report.set_count,
            mutations = report.stats.total_mutations(),
            elapsed_ms = state.session.elapsed_ms(),
            "Catalog import completed"
        );

        Ok(report)
    }
}

async fn reconcile_card_task(reconciler: Reconciler, card: Card) -> ImportResult<()> {
    reconciler.reconcile_card(&card).await.map_err(|err| {
        debug!(
            set_code = %card.set_code,
            number = %card.number,
            error = %err,
            "Card reconciliation failed"
        );
        err
    })
}
