//! Streaming catalog parser
//!
//! Turns one large catalog document into a lazy, single-pass sequence of
//! [`Record`]s without materializing the document:
//!
//! ```text
//! {"data": {"<SET>": {"name": .., "cards": [ {card}, {card}, .. ], ..}, ..}}
//!                                           ^ each card emitted on its own
//!                                                                   ^ set emitted on close
//! ```
//!
//! Consumer pull drives progress. The cancellation token is checked between
//! tokens; once cancelled the sequence ends without emitting further records.
//! The first error terminates the sequence.

pub mod raw;
mod scanner;

pub use raw::{RawCard, RawForeignData, RawIdentifiers, RawSet, Scalar};

use crate::error::ImportResult;
use scanner::Scanner;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Read buffer used by [`spawn_parser`]
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// One parsed fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Set-level fields, emitted after all of the set's cards
    Set(RawSet),
    /// One card fragment
    Card(RawCard),
}

/// Where the parser currently is inside the document
enum Position {
    Document,
    Data { first: bool },
    Set { set: RawSet, first: bool },
    Cards { set: RawSet, first: bool },
    Finished,
}

/// Lazy record sequence over a buffered reader
pub struct RecordStream<R> {
    scanner: Scanner<R>,
    position: Position,
    cancel: CancellationToken,
    buffer: Vec<u8>,
}

/// Set codes are 3–10 ASCII alphanumerics; other `data` keys are metadata
pub fn is_set_code(key: &str) -> bool {
    (3..=10).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(reader: R, cancel: CancellationToken) -> Self {
        Self {
            scanner: Scanner::new(reader),
            position: Position::Document,
            cancel,
            buffer: Vec::new(),
        }
    }

    fn advance(&mut self) -> ImportResult<Option<Record>> {
        loop {
            if self.cancel.is_cancelled() {
                debug!(offset = self.scanner.offset(), "Parser cancelled");
                self.position = Position::Finished;
                return Ok(None);
            }

            // Any error leaves the stream Finished
            match std::mem::replace(&mut self.position, Position::Finished) {
                Position::Document => {
                    self.enter_data()?;
                    self.position = Position::Data { first: true };
                }

                Position::Data { mut first } => {
                    if !self.scanner.next_entry(b'}', &mut first)? {
                        self.finish_document()?;
                        return Ok(None);
                    }

                    let key = self.scanner.read_key()?;
                    if is_set_code(&key) {
                        self.scanner
                            .expect(b'{', &format!("set \"{}\" must be an object", key))?;
                        trace!(set = %key, "Entering set");
                        self.position = Position::Set {
                            set: RawSet::new(key),
                            first: true,
                        };
                    } else {
                        debug!(key = %key, "Skipping non-set entry in data");
                        self.scanner.skip_value()?;
                        self.position = Position::Data { first };
                    }
                }

                Position::Set { mut set, mut first } => {
                    if !self.scanner.next_entry(b'}', &mut first)? {
                        self.position = Position::Data { first: false };
                        return Ok(Some(Record::Set(set)));
                    }

                    let key = self.scanner.read_key()?;
                    match key.as_str() {
                        "cards" => {
                            self.scanner
                                .expect(b'[', &format!("\"cards\" of set {} must be an array", set.key))?;
                            self.position = Position::Cards { set, first: true };
                            continue;
                        }
                        "translations" => set.translations = self.read_translations(&set.key)?,
                        "code" => set.code = self.decode_field(&set.key, &key)?,
                        "name" => set.name = self.decode_field(&set.key, &key)?,
                        "block" => set.block = self.decode_field(&set.key, &key)?,
                        "type" => set.set_type = self.decode_field(&set.key, &key)?,
                        "totalSetSize" => set.total_set_size = self.decode_field(&set.key, &key)?,
                        "releaseDate" => set.release_date = self.decode_field(&set.key, &key)?,
                        _ => self.scanner.skip_value()?,
                    }
                    self.position = Position::Set { set, first };
                }

                Position::Cards { mut set, mut first } => {
                    if !self.scanner.next_entry(b']', &mut first)? {
                        self.position = Position::Set { set, first: false };
                        continue;
                    }

                    let card: RawCard = self.decode_value(|| {
                        format!("card #{} of set {}", set.card_count + 1, set.key)
                    })?;
                    set.card_count += 1;
                    self.position = Position::Cards { set, first };
                    return Ok(Some(Record::Card(card)));
                }

                Position::Finished => return Ok(None),
            }
        }
    }

    /// Consume the outer object up to and including the opening brace of `data`
    fn enter_data(&mut self) -> ImportResult<()> {
        self.scanner.expect(b'{', "document must be an object")?;

        let mut first = true;
        while self.scanner.next_entry(b'}', &mut first)? {
            let key = self.scanner.read_key()?;
            if key == "data" {
                return self.scanner.expect(b'{', "\"data\" must be an object");
            }
            debug!(key = %key, "Skipping top-level entry");
            self.scanner.skip_value()?;
        }

        Err(self.scanner.error("document has no \"data\" object"))
    }

    /// Skip whatever follows `data` in the outer object
    fn finish_document(&mut self) -> ImportResult<()> {
        let mut first = false;
        while self.scanner.next_entry(b'}', &mut first)? {
            let key = self.scanner.read_key()?;
            debug!(key = %key, "Skipping top-level entry");
            self.scanner.skip_value()?;
        }
        Ok(())
    }

    fn read_translations(&mut self, set_key: &str) -> ImportResult<Vec<(String, String)>> {
        let map: Option<BTreeMap<String, Option<String>>> =
            self.decode_field(set_key, "translations")?;

        Ok(map
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(language, name)| {
                let name = name?;
                if language.trim().is_empty() || name.trim().is_empty() {
                    return None;
                }
                Some((language, name))
            })
            .collect())
    }

    fn decode_field<T: DeserializeOwned>(&mut self, set_key: &str, field: &str) -> ImportResult<T> {
        self.decode_value(|| format!("field \"{}\" of set {}", field, set_key))
    }

    /// Capture the next value and decode it with serde
    fn decode_value<T, F>(&mut self, context: F) -> ImportResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> String,
    {
        self.buffer.clear();
        self.scanner.capture_value(&mut self.buffer)?;
        serde_json::from_slice(&self.buffer)
            .map_err(|e| self.scanner.error(format!("{}: {}", context(), e)))
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = ImportResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.position, Position::Finished) {
            return None;
        }

        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.position = Position::Finished;
                None
            }
            Err(e) => {
                self.position = Position::Finished;
                Some(Err(e))
            }
        }
    }
}

/// Drive a [`RecordStream`] on a blocking thread, feeding a bounded channel
///
/// The parser blocks while the channel is full. It stops when the stream ends,
/// the token is cancelled, or the receiver is dropped. The join handle yields
/// the number of items sent.
pub fn spawn_parser<R>(
    reader: R,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Receiver<ImportResult<Record>>, JoinHandle<usize>)
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::task::spawn_blocking(move || {
        let stream = RecordStream::new(BufReader::with_capacity(READ_BUFFER_BYTES, reader), cancel);
        let mut sent = 0usize;

        for item in stream {
            if tx.blocking_send(item).is_err() {
                debug!(sent, "Record receiver dropped, stopping parser");
                break;
            }
            sent += 1;
        }

        debug!(sent, "Parser finished");
        sent
    });

    (rx, handle)
}

/// Parse an in-memory document (small inputs and tests)
pub fn parse_slice(input: &[u8]) -> impl Iterator<Item = ImportResult<Record>> + '_ {
    RecordStream::new(input, CancellationToken::new())
}
