//! Explicit checks of a machine definition.
//!
//! Machines are never validated when built; evaluation reports a bad target only when it
//! is taken. [`lint`] walks the whole graph up front instead.
//!
//! ## Rules
//!
//! - **Missing initial state** (error): the initial state name is not defined.
//! - **Empty state** (error): a state has no transitions.
//! - **Undefined target** (error): a transition names a state that is not defined.
//! - **Unreachable state** (warning): no path from the initial state leads to it.
//! - **No accept** (warning): no transition reachable from the initial state completes a record.

use crate::machine::Machine;
use crate::transition::Target;
use std::collections::{BTreeSet, VecDeque};

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Identifies which rule produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintRule {
    MissingInitialState,
    EmptyState,
    UndefinedTarget,
    UnreachableState,
    NoAccept,
}

/// A single lint message, located by state and (where relevant) transition index.
#[derive(Debug, Clone)]
pub struct LintMessage {
    pub state: String,
    pub transition: Option<usize>,
    pub rule: LintRule,
    pub severity: Severity,
    pub message: String,
}

/// Run all rules. Messages are ordered by state name, then transition index.
pub fn lint<O>(machine: &Machine<O>) -> Vec<LintMessage> {
    let mut out = Vec::new();
    let initial = machine.initial_state();

    if machine.state(initial).is_none() {
        out.push(LintMessage {
            state: initial.to_string(),
            transition: None,
            rule: LintRule::MissingInitialState,
            severity: Severity::Error,
            message: format!("initial state '{}' is not defined", initial),
        });
    }

    let mut names: Vec<&str> = machine.states().map(|(name, _)| name).collect();
    names.sort_unstable();

    for &name in &names {
        let Some(state) = machine.state(name) else { continue };
        if state.is_empty() {
            out.push(LintMessage {
                state: name.to_string(),
                transition: None,
                rule: LintRule::EmptyState,
                severity: Severity::Error,
                message: format!("state '{}' has no transitions", name),
            });
        }
        for (i, t) in state.transitions().iter().enumerate() {
            if let Target::State(next) = t.target() {
                if machine.state(next).is_none() {
                    out.push(LintMessage {
                        state: name.to_string(),
                        transition: Some(i),
                        rule: LintRule::UndefinedTarget,
                        severity: Severity::Error,
                        message: format!("transition {} targets undefined state '{}'", i, next),
                    });
                }
            }
        }
    }

    // Reachability from the initial state.
    let mut reachable = BTreeSet::new();
    let mut accepts = false;
    let mut queue = VecDeque::new();
    if machine.state(initial).is_some() {
        reachable.insert(initial);
        queue.push_back(initial);
    }
    while let Some(name) = queue.pop_front() {
        let Some(state) = machine.state(name) else { continue };
        for t in state.transitions() {
            match t.target() {
                Target::Accept => accepts = true,
                Target::State(next) => {
                    if machine.state(next).is_some() && reachable.insert(next.as_str()) {
                        queue.push_back(next.as_str());
                    }
                }
            }
        }
    }

    for &name in &names {
        if !reachable.contains(name) {
            out.push(LintMessage {
                state: name.to_string(),
                transition: None,
                rule: LintRule::UnreachableState,
                severity: Severity::Warning,
                message: format!("state '{}' is unreachable from '{}'", name, initial),
            });
        }
    }

    if !accepts && machine.state(initial).is_some() {
        out.push(LintMessage {
            state: initial.to_string(),
            transition: None,
            rule: LintRule::NoAccept,
            severity: Severity::Warning,
            message: "no reachable transition completes a record".to_string(),
        });
    }

    out.sort_by(|a, b| a.state.cmp(&b.state).then(a.transition.cmp(&b.transition)));
    out
}
