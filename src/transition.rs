//! Transition tests and targets: the contract between field decoders and the state machine.
//!
//! A transition test looks at the *whole* unconsumed window and either claims a number of
//! leading bytes, asks for more data, or declines. Decoded values never flow back through
//! the engine: a test writes them into the caller-owned output record `O`, so the engine
//! only ever deals in byte counts.

use std::borrow::Cow;
use std::fmt;

/// Why a transition test did not match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestFailure {
    /// Cannot decide with the bytes given; more input might match.
    #[error("insufficient data")]
    Incomplete,
    /// The transition does not apply to this data.
    #[error("no match: {0}")]
    NoMatch(Cow<'static, str>),
}

impl TestFailure {
    pub fn no_match(reason: impl Into<Cow<'static, str>>) -> Self {
        TestFailure::NoMatch(reason.into())
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, TestFailure::Incomplete)
    }
}

/// `Ok(n)`: the first `n` bytes of the window were accepted.
pub type TestResult = Result<usize, TestFailure>;

/// A transition test over the unconsumed window, writing any decoded value into `out`.
///
/// Implementations must never claim more bytes than `window.len()`.
/// Every `Fn(&[u8], &mut O) -> TestResult + Send + Sync` is a transition test.
pub trait TransitionTest<O>: Send + Sync {
    fn test(&self, window: &[u8], out: &mut O) -> TestResult;
}

impl<O, F> TransitionTest<O> for F
where
    F: Fn(&[u8], &mut O) -> TestResult + Send + Sync,
{
    fn test(&self, window: &[u8], out: &mut O) -> TestResult {
        self(window, out)
    }
}

/// Where a successful transition leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Record complete: stop and report the bytes consumed in this run.
    Accept,
    /// Continue in the named state.
    State(String),
}

impl Target {
    pub fn state(name: impl Into<String>) -> Self {
        Target::State(name.into())
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Target::Accept)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::State(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::State(name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Accept => f.write_str("<accept>"),
            Target::State(name) => write!(f, "'{}'", name),
        }
    }
}

/// An ordered (test, target) pair.
pub struct Transition<O> {
    test: Box<dyn TransitionTest<O>>,
    target: Target,
}

impl<O> Transition<O> {
    pub fn new<T>(test: T, target: impl Into<Target>) -> Self
    where
        T: TransitionTest<O> + 'static,
    {
        Transition {
            test: Box::new(test),
            target: target.into(),
        }
    }

    /// Transition whose success completes the record.
    pub fn accept<T>(test: T) -> Self
    where
        T: TransitionTest<O> + 'static,
    {
        Transition {
            test: Box::new(test),
            target: Target::Accept,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn test(&self, window: &[u8], out: &mut O) -> TestResult {
        self.test.test(window, out)
    }
}

impl<O> fmt::Debug for Transition<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
