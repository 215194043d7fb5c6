//! Transition selection shared by the one-shot evaluator and the streaming scanner.
//!
//! A [`Run`] carries the current state across selection passes. One pass walks states
//! against a window of already-available bytes: in each state the transitions are tried in
//! order, the first match advances the cursor and either completes the record or moves to
//! its target state, which is re-entered on the same window without reading anything new.
//! The pass ends at the terminal marker, when no transition matches, or on a fatal error.
//!
//! When more input may still arrive, a transition is only taken if every transition ahead of
//! it gave a definite answer: a lower-priority match behind one that asked for more bytes ends
//! the pass as a soft failure, so the choice never depends on where a read happened to stop.

use crate::diagnostics::{diag, Hex};
use crate::machine::{Machine, MachineError};
use crate::transition::{Target, TestFailure};

/// How a selection pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Halt {
    /// The terminal marker was reached.
    Accepted,
    /// No transition matched, but at least one needed more bytes.
    Soft,
    /// No transition matched and none would with more bytes.
    Hard,
}

/// Current state plus the non-termination counter.
#[derive(Debug, Clone)]
pub(crate) struct Run {
    state: String,
    /// State entries since input was last consumed in this pass.
    idle_entries: usize,
}

impl Run {
    pub(crate) fn new<O>(machine: &Machine<O>) -> Self {
        Run {
            state: machine.initial_state().to_string(),
            idle_entries: 0,
        }
    }

    pub(crate) fn state(&self) -> &str {
        &self.state
    }

    /// Back to the initial state for the next record.
    pub(crate) fn restart<O>(&mut self, machine: &Machine<O>) {
        self.state.clear();
        self.state.push_str(machine.initial_state());
    }

    /// Run one selection pass over `window`, starting in the current state.
    ///
    /// Returns the number of leading bytes consumed (committed fields) and how the pass
    /// ended. On `Soft`/`Hard` the run stays in the state that failed to match.
    /// `more_coming` says whether bytes may still be appended to `window`.
    pub(crate) fn pass<O>(
        &mut self,
        machine: &Machine<O>,
        window: &[u8],
        out: &mut O,
        more_coming: bool,
    ) -> Result<(usize, Halt), MachineError> {
        let sink = machine.diagnostics();
        let bound = machine.options().non_termination_bound;
        let mut pos = 0usize;
        self.idle_entries = 0;

        let mut state = match machine.state(&self.state) {
            Some(s) => s,
            None if self.state == machine.initial_state() => {
                return Err(MachineError::NoInitialState(self.state.clone()))
            }
            None => return Err(MachineError::NoSuchState(self.state.clone())),
        };

        loop {
            self.idle_entries += 1;
            if self.idle_entries > bound {
                return Err(MachineError::InfiniteLoop(self.state.clone()));
            }
            diag!(sink, " - entered state '{}' at position {}", self.state, pos);

            if state.is_empty() {
                return Err(MachineError::NoTransitions(self.state.clone()));
            }

            let rest = &window[pos..];
            let mut wants_more = false;
            let mut taken = None;
            for (i, t) in state.transitions().iter().enumerate() {
                match t.test(rest, out) {
                    Ok(n) if n > rest.len() => {
                        return Err(MachineError::Overrun {
                            state: self.state.clone(),
                            index: i,
                            claimed: n,
                            available: rest.len(),
                        });
                    }
                    Ok(_) if wants_more && more_coming => {
                        diag!(sink, "   - transition {} matched behind an incomplete one, waiting", i);
                        return Ok((pos, Halt::Soft));
                    }
                    Ok(n) => {
                        diag!(sink, "   - transition {} used {} bytes [{}]", i, n, Hex(&rest[..n]));
                        taken = Some((n, t.target()));
                        break;
                    }
                    Err(TestFailure::Incomplete) => {
                        wants_more = true;
                        diag!(sink, "   - transition {} error: {}", i, TestFailure::Incomplete);
                    }
                    Err(e) => {
                        diag!(sink, "   - transition {} error: {}", i, e);
                    }
                }
            }

            let Some((n, target)) = taken else {
                let halt = if wants_more { Halt::Soft } else { Halt::Hard };
                diag!(sink, " - state '{}': {:?} failure after {} bytes", self.state, halt, pos);
                return Ok((pos, halt));
            };

            pos += n;
            if n > 0 {
                self.idle_entries = 0;
            }
            match target {
                Target::Accept => {
                    diag!(sink, " - SUCCESS: used {} bytes", pos);
                    return Ok((pos, Halt::Accepted));
                }
                Target::State(next) => {
                    state = machine
                        .state(next)
                        .ok_or_else(|| MachineError::NoSuchState(next.clone()))?;
                    self.state.clone_from(next);
                }
            }
        }
    }
}
