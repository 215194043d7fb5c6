//! Machine definition: named states holding ordered transition lists, plus runtime options.
//!
//! A [`Machine`] is immutable once built and can be shared by reference between any
//! number of evaluations and scanners. Definitions are **not** validated when built:
//! a transition may name a state that does not exist, and the error surfaces only when
//! that transition is actually taken. Use [`lint`](crate::lint::lint) for an explicit check.

use crate::diagnostics::{DiagnosticsSink, Discard};
use crate::evaluate::evaluate;
use crate::scanner::Scanner;
use crate::transition::{Target, Transition, TransitionTest};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Default cap on state entries made without consuming input.
pub const DEFAULT_NON_TERMINATION_BOUND: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("no initial state '{0}' defined")]
    NoInitialState(String),
    #[error("state '{0}' has no transitions")]
    NoTransitions(String),
    #[error("no such state '{0}'")]
    NoSuchState(String),
    #[error("state '{0}': infinite loop detected")]
    InfiniteLoop(String),
    #[error("state '{0}': no matching transitions")]
    NoMatchingTransition(String),
    #[error("state '{state}': transition {index} claimed {claimed} bytes but only {available} were available")]
    Overrun {
        state: String,
        index: usize,
        claimed: usize,
        available: usize,
    },
}

/// Runtime options fixed at construction.
#[derive(Clone)]
pub struct Options {
    /// Bytes dropped after a hard failure before retrying the same state (0 = disabled).
    pub resync_skip_bytes: usize,
    /// Maximum state entries without consuming input before [`MachineError::InfiniteLoop`].
    pub non_termination_bound: usize,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Options {
    pub fn resync_skip_bytes(mut self, n: usize) -> Self {
        self.resync_skip_bytes = n;
        self
    }

    pub fn non_termination_bound(mut self, n: usize) -> Self {
        self.non_termination_bound = n;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            resync_skip_bytes: 0,
            non_termination_bound: DEFAULT_NON_TERMINATION_BOUND,
            diagnostics: Arc::new(Discard),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("resync_skip_bytes", &self.resync_skip_bytes)
            .field("non_termination_bound", &self.non_termination_bound)
            .field("diagnostics", &self.diagnostics.enabled())
            .finish()
    }
}

/// A named decoding context: transitions are tried strictly in order, first success wins.
pub struct State<O> {
    transitions: Vec<Transition<O>>,
}

impl<O> State<O> {
    pub fn new() -> Self {
        State {
            transitions: Vec::new(),
        }
    }

    pub fn from_transitions(transitions: Vec<Transition<O>>) -> Self {
        State { transitions }
    }

    /// Append a transition to `target`.
    pub fn on<T>(mut self, test: T, target: impl Into<Target>) -> Self
    where
        T: TransitionTest<O> + 'static,
    {
        self.transitions.push(Transition::new(test, target));
        self
    }

    /// Append a transition that completes the record.
    pub fn accept<T>(mut self, test: T) -> Self
    where
        T: TransitionTest<O> + 'static,
    {
        self.transitions.push(Transition::accept(test));
        self
    }

    pub fn push(&mut self, transition: Transition<O>) {
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[Transition<O>] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<O> Default for State<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for State<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.transitions.iter()).finish()
    }
}

/// Immutable state graph with one designated initial state.
pub struct Machine<O> {
    initial: String,
    states: HashMap<String, State<O>>,
    options: Options,
}

impl<O> Machine<O> {
    pub fn new<I, K>(initial: impl Into<String>, states: I, options: Options) -> Self
    where
        I: IntoIterator<Item = (K, State<O>)>,
        K: Into<String>,
    {
        Machine {
            initial: initial.into(),
            states: states.into_iter().map(|(k, s)| (k.into(), s)).collect(),
            options,
        }
    }

    pub fn builder(initial: impl Into<String>) -> MachineBuilder<O> {
        MachineBuilder::new(initial)
    }

    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    pub fn state(&self, name: &str) -> Option<&State<O>> {
        self.states.get(name)
    }

    /// All states, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &State<O>)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.options.diagnostics.as_ref()
    }

    /// One-shot evaluation of `bytes`; see [`evaluate`].
    pub fn parse(&self, bytes: &[u8], out: &mut O) -> Result<usize, MachineError> {
        evaluate(self, bytes, out)
    }

    /// Streaming scanner over `reader` with its own output record.
    pub fn scanner<R: Read>(&self, reader: R) -> Scanner<'_, O, R>
    where
        O: Default,
    {
        Scanner::new(self, reader)
    }
}

impl<O> fmt::Debug for Machine<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("initial", &self.initial)
            .field("states", &self.states)
            .field("options", &self.options)
            .finish()
    }
}

/// Fluent construction of a [`Machine`]. Like [`Machine::new`], performs no validation.
pub struct MachineBuilder<O> {
    initial: String,
    states: HashMap<String, State<O>>,
    options: Options,
}

impl<O> MachineBuilder<O> {
    pub fn new(initial: impl Into<String>) -> Self {
        MachineBuilder {
            initial: initial.into(),
            states: HashMap::new(),
            options: Options::default(),
        }
    }

    /// Add (or replace) a state.
    pub fn state(mut self, name: impl Into<String>, state: State<O>) -> Self {
        self.states.insert(name.into(), state);
        self
    }

    pub fn resync_skip_bytes(mut self, n: usize) -> Self {
        self.options.resync_skip_bytes = n;
        self
    }

    pub fn non_termination_bound(mut self, n: usize) -> Self {
        self.options.non_termination_bound = n;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.options.diagnostics = sink;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Machine<O> {
        Machine {
            initial: self.initial,
            states: self.states,
            options: self.options,
        }
    }
}
