//! Diagnostics sinks: purely observational trace lines emitted by the evaluator and scanner.
//!
//! A sink is fixed when the [`Machine`](crate::Machine) is built and is never swapped
//! afterwards, so a machine can be shared between threads without racing on it.

use std::fmt;
use std::sync::Mutex;

/// Receives one formatted line per notable event (state entry, transition attempt,
/// success/failure, resync, read). Never affects control flow.
pub trait DiagnosticsSink: Send + Sync {
    /// When false, callers skip building the line entirely.
    fn enabled(&self) -> bool {
        true
    }

    fn line(&self, args: fmt::Arguments<'_>);
}

/// Drops everything. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl DiagnosticsSink for Discard {
    fn enabled(&self) -> bool {
        false
    }

    fn line(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards every line to `tracing` at debug level under the `bytefsm` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn enabled(&self) -> bool {
        tracing::enabled!(target: "bytefsm", tracing::Level::DEBUG)
    }

    fn line(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "bytefsm", "{}", args);
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn line(&self, args: fmt::Arguments<'_>) {
        let text = args.to_string();
        match self.lines.lock() {
            Ok(mut lines) => lines.push(text),
            Err(poisoned) => poisoned.into_inner().push(text),
        }
    }
}

/// Hex preview of a byte slice, e.g. `02 48 65`.
pub(crate) struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 32;
        for (i, b) in self.0.iter().take(PREVIEW).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        if self.0.len() > PREVIEW {
            write!(f, " ..(+{})", self.0.len() - PREVIEW)?;
        }
        Ok(())
    }
}

macro_rules! diag {
    ($sink:expr, $($arg:tt)*) => {{
        let sink: &dyn $crate::diagnostics::DiagnosticsSink = $sink;
        if sink.enabled() {
            sink.line(format_args!($($arg)*));
        }
    }};
}

pub(crate) use diag;
