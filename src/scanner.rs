//! Streaming scanner: decode one record per call from an incremental byte source.
//!
//! The scanner keeps a buffer of live (unconsumed) bytes and the current state between
//! calls. Fields that match are committed: their bytes are dropped from the buffer and the
//! scanner resumes in the state they led to, so a record spread over many reads picks up
//! exactly where it stopped. When no transition matches:
//!
//! - **soft failure** (a test wanted more bytes): read more from the source and retry;
//! - **hard failure**: with `resync_skip_bytes > 0` and enough bytes buffered, drop that
//!   many leading bytes and retry the same state; otherwise read more, like a soft failure.
//!
//! While the source is open, a transition listed after one that asked for more bytes is
//! not taken yet; the scanner reads first. So records do not depend on how the input was
//! split into reads, as long as every test answers a prefix of its data either with
//! "need more" or the same way it answers the whole (true of every stock decoder except
//! the regex ones).
//!
//! Once the source reports end-of-input the buffer is still drained, and resync only
//! applies in the initial state: bytes of a record whose first fields were already
//! committed are never skipped away. Bytes that can no longer decode end the session with
//! [`ScanError::Truncated`]; an empty buffer ends it with [`ScanError::EndOfInput`], even if
//! the last record had started.
//!
//! ## Example
//!
//! ```ignore
//! let mut scanner = machine.scanner(std::io::stdin().lock());
//! while scanner.next_record() {
//!     println!("{:?}", scanner.record());
//! }
//! match scanner.last_error() {
//!     Some(e) if e.is_end_of_input() => {}
//!     Some(e) => eprintln!("scan failed: {}", e),
//!     None => {}
//! }
//! ```

use crate::diagnostics::{diag, Hex};
use crate::engine::{Halt, Run};
use crate::machine::{Machine, MachineError};
use std::io::{ErrorKind, Read};

/// Bytes requested from the source per read.
pub const DEFAULT_READ_CHUNK: usize = 128;

const INITIAL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    /// The source is exhausted and every buffered byte was consumed.
    #[error("end of input")]
    EndOfInput,
    /// The source is exhausted but buffered bytes never completed a record.
    #[error("state '{state}': end of input with {buffered} undecodable byte(s) buffered")]
    Truncated { state: String, buffered: usize },
}

impl ScanError {
    /// Clean end of the stream rather than a defect.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, ScanError::EndOfInput)
    }

    /// Copy of this error. An I/O error keeps its kind and message but not its source.
    fn duplicate(&self) -> ScanError {
        match self {
            ScanError::Machine(e) => ScanError::Machine(e.clone()),
            ScanError::Io(e) => ScanError::Io(std::io::Error::new(e.kind(), e.to_string())),
            ScanError::EndOfInput => ScanError::EndOfInput,
            ScanError::Truncated { state, buffered } => ScanError::Truncated {
                state: state.clone(),
                buffered: *buffered,
            },
        }
    }
}

pub struct Scanner<'m, O, R> {
    machine: &'m Machine<O>,
    reader: R,
    buf: Vec<u8>,
    read_chunk: usize,
    run: Run,
    record: O,
    /// The record holds a completed value that the next call must clear first.
    record_done: bool,
    /// Bytes consumed or skipped since the current record started.
    record_progress: usize,
    /// Consecutive records accepted without consuming a byte.
    empty_records: usize,
    source_done: bool,
    /// Stream offset of the first buffered byte.
    offset: u64,
    err: Option<ScanError>,
    finished: bool,
}

impl<'m, O: Default, R: Read> Scanner<'m, O, R> {
    pub fn new(machine: &'m Machine<O>, reader: R) -> Self {
        Scanner {
            machine,
            reader,
            buf: Vec::with_capacity(INITIAL_CAPACITY),
            read_chunk: DEFAULT_READ_CHUNK,
            run: Run::new(machine),
            record: O::default(),
            record_done: false,
            record_progress: 0,
            empty_records: 0,
            source_done: false,
            offset: 0,
            err: None,
            finished: false,
        }
    }

    /// Bytes requested per read (at least 1).
    pub fn with_read_chunk(mut self, n: usize) -> Self {
        self.read_chunk = n.max(1);
        self
    }

    /// Decode the next record. Blocks on the source as needed.
    ///
    /// Returns true when a record is available via [`record`](Self::record). On false,
    /// [`last_error`](Self::last_error) tells a clean end ([`ScanError::EndOfInput`]) from a
    /// failure; every later call returns false without touching the source.
    pub fn next_record(&mut self) -> bool {
        if self.finished || self.err.is_some() {
            return false;
        }
        match self.scan() {
            Ok(()) => true,
            Err(e) => {
                diag!(self.machine.diagnostics(), " - stopped: {} ({} bytes buffered)", e, self.buf.len());
                self.err = Some(e);
                false
            }
        }
    }

    fn scan(&mut self) -> Result<(), ScanError> {
        let machine = self.machine;
        let sink = machine.diagnostics();
        diag!(sink, "next()");
        if self.record_done {
            self.record = O::default();
            self.record_done = false;
        }
        self.record_progress = 0;
        if machine.state(machine.initial_state()).is_none() {
            return Err(MachineError::NoInitialState(machine.initial_state().to_string()).into());
        }
        let resync = machine.options().resync_skip_bytes;

        loop {
            if !self.buf.is_empty() {
                diag!(sink, " - trying state '{}' with {} bytes buffered", self.run.state(), self.buf.len());
                let (consumed, halt) = self.run.pass(machine, &self.buf, &mut self.record, !self.source_done)?;
                self.buf.drain(..consumed);
                self.record_progress += consumed;
                self.offset += consumed as u64;
                // At end of input a soft failure can never resolve, and only noise between
                // records is skipped.
                let skippable = if self.source_done {
                    self.run.state() == machine.initial_state()
                } else {
                    halt == Halt::Hard
                };
                match halt {
                    Halt::Accepted => {
                        if self.record_progress == 0 {
                            self.empty_records += 1;
                            if self.empty_records > machine.options().non_termination_bound {
                                return Err(MachineError::InfiniteLoop(self.run.state().to_string()).into());
                            }
                        } else {
                            self.empty_records = 0;
                        }
                        self.run.restart(machine);
                        self.record_done = true;
                        return Ok(());
                    }
                    Halt::Hard | Halt::Soft if skippable && resync > 0 && self.buf.len() >= resync => {
                        diag!(sink, "   - hard error, skipping {} byte(s) [{}]", resync, Hex(&self.buf[..resync]));
                        self.buf.drain(..resync);
                        self.record_progress += resync;
                        self.offset += resync as u64;
                        continue;
                    }
                    Halt::Hard | Halt::Soft if self.source_done => {
                        if self.buf.is_empty() {
                            continue;
                        }
                        return Err(ScanError::Truncated {
                            state: self.run.state().to_string(),
                            buffered: self.buf.len(),
                        });
                    }
                    Halt::Hard | Halt::Soft => {}
                }
            } else if self.source_done {
                return Err(ScanError::EndOfInput);
            }
            self.fill()?;
        }
    }

    /// Append one read's worth of bytes; marks the source done on end-of-input.
    fn fill(&mut self) -> Result<(), ScanError> {
        let start = self.buf.len();
        self.buf.resize(start + self.read_chunk, 0);
        let n = loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(start);
                    diag!(self.machine.diagnostics(), " - read error: {} (buffer still has {} bytes)", e, start);
                    return Err(ScanError::Io(e));
                }
            }
        };
        self.buf.truncate(start + n);
        if n == 0 {
            diag!(self.machine.diagnostics(), " - end of input ({} bytes buffered)", start);
            self.source_done = true;
        } else {
            diag!(self.machine.diagnostics(), " - read {} bytes", n);
        }
        Ok(())
    }

    /// The record decoded by the last successful [`next_record`](Self::next_record).
    pub fn record(&self) -> &O {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut O {
        &mut self.record
    }

    /// Move the decoded record out, leaving a default in its place.
    pub fn take_record(&mut self) -> O {
        self.record_done = false;
        std::mem::take(&mut self.record)
    }

    pub fn last_error(&self) -> Option<&ScanError> {
        self.err.as_ref()
    }

    /// Name of the state the next selection pass starts in.
    pub fn state(&self) -> &str {
        self.run.state()
    }

    /// Stream offset of the first unconsumed byte: everything before it was decoded or skipped.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unconsumed bytes currently buffered.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    pub fn machine(&self) -> &'m Machine<O> {
        self.machine
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Yields each record; a clean end of input ends iteration, any other error is yielded once.
/// The error stays available from [`Scanner::last_error`] afterwards.
impl<'m, O: Default, R: Read> Iterator for Scanner<'m, O, R> {
    type Item = Result<O, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_record() {
            return Some(Ok(self.take_record()));
        }
        if self.finished {
            return None;
        }
        self.finished = true;
        match &self.err {
            Some(ScanError::EndOfInput) | None => None,
            Some(e) => Some(Err(e.duplicate())),
        }
    }
}
