//! # bytefsm: data-driven byte-stream decoder
//!
//! A finite-state machine whose transitions are pluggable *transition tests*, tried in
//! priority order against the unconsumed input. Use it to tokenize and parse framed binary
//! or text protocols: STX/ETX-delimited records, length-prefixed fields, delimited strings,
//! fixed-width numbers, dates, regex matches.
//!
//! ## Pieces
//!
//! - **Transition test** ([`TransitionTest`]): looks at the whole unconsumed window and
//!   returns bytes consumed, [`TestFailure::Incomplete`] ("need more bytes") or
//!   [`TestFailure::NoMatch`]. Decoded values go into the caller's output record `O`.
//! - **Machine** ([`Machine`]): named [`State`]s, each an ordered list of (test, target)
//!   pairs; the target is another state or [`Target::Accept`]. Built once, shared read-only.
//! - **One-shot evaluator** ([`evaluate`]): runs the machine over a complete buffer.
//! - **Streaming scanner** ([`Scanner`]): pulls bytes from any [`std::io::Read`], yields one
//!   record per [`Scanner::next_record`] call, refills on partial data and optionally
//!   resynchronizes after corrupt bytes. A transition behind one that asked for more bytes
//!   waits for the next read, so records come out the same however the input is split,
//!   provided each test answers a prefix either with "need more" or as it answers the
//!   whole. Every stock field decoder does, except the regex ones in [`fields::pattern`].
//!
//! Field decoders for common field shapes live in [`fields`].
//!
//! ## Example
//!
//! ```ignore
//! use bytefsm::fields::{null_terminated, skip, stx};
//! use bytefsm::{Machine, State};
//!
//! #[derive(Default)]
//! struct Hello {
//!     text: String,
//! }
//!
//! let machine = Machine::builder("Start")
//!     .state("Start", State::new().on(stx(), "Text").on(skip(1), "Start"))
//!     .state("Text", State::new().accept(null_terminated(|r: &mut Hello, s| r.text = s)))
//!     .build();
//!
//! let mut out = Hello::default();
//! let n = machine.parse(&[0x02, b'H', b'e', b'l', b'l', b'o', 0x00], &mut out)?;
//! assert_eq!((n, out.text.as_str()), (7, "Hello"));
//! ```

pub mod diagnostics;
pub mod dump;
mod engine;
pub mod evaluate;
pub mod fields;
pub mod frame;
pub mod lint;
pub mod machine;
pub mod scanner;
pub mod source;
pub mod transition;
pub mod value;

pub use diagnostics::{DiagnosticsSink, Discard, MemorySink, TracingSink};
pub use evaluate::evaluate;
pub use frame::{decode_records, FrameDecodeResult};
pub use machine::{Machine, MachineBuilder, MachineError, Options, State, DEFAULT_NON_TERMINATION_BOUND};
pub use scanner::{ScanError, Scanner};
pub use source::ChunkedReader;
pub use transition::{Target, TestFailure, TestResult, Transition, TransitionTest};
pub use value::{Record, Value};
