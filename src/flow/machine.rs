//! Transition tables for the guided flows
//!
//! A flow's steps only move through edges declared in its table, so every
//! jump (including the ticket flow's step 3 → step 1 edit) is a named,
//! reviewable transition.
//!
//! # Example
//!
//! ```rust
//! use museum_chat::flow::machine::{StateMachine, Transition};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Step { Ask, Done }
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Event { Answered, Back }
//!
//! let mut machine = StateMachine::new(
//!     "demo",
//!     Step::Ask,
//!     vec![
//!         Transition::new(Step::Ask, Event::Answered, Step::Done),
//!         Transition::new(Step::Done, Event::Back, Step::Ask),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(machine.fire(Event::Answered).unwrap(), Step::Done);
//! assert!(machine.fire(Event::Answered).is_err());
//! ```

use crate::error::{FlowError, FlowResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info};

/// One edge of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
}

impl<S, E> Transition<S, E> {
    pub const fn new(from: S, event: E, to: S) -> Self {
        Self { from, event, to }
    }
}

/// Current position in a transition table
#[derive(Debug, Clone)]
pub struct StateMachine<S, E> {
    name: &'static str,
    current: S,
    table: HashMap<(S, E), S>,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
{
    /// Build a machine, rejecting ambiguous edges and unreachable targets
    pub fn new(
        name: &'static str,
        initial: S,
        transitions: Vec<Transition<S, E>>,
    ) -> FlowResult<Self> {
        let mut table = HashMap::with_capacity(transitions.len());
        for t in &transitions {
            if table.insert((t.from, t.event), t.to).is_some() {
                return Err(FlowError::InvalidTransition {
                    state: format!("{:?}", t.from),
                    event: format!("{:?} (declared twice in {})", t.event, name),
                });
            }
        }

        // Every declared source state must be reachable from the initial one
        let mut reachable = HashSet::from([initial]);
        let mut queue = VecDeque::from([initial]);
        while let Some(state) = queue.pop_front() {
            for t in transitions.iter().filter(|t| t.from == state) {
                if reachable.insert(t.to) {
                    queue.push_back(t.to);
                }
            }
        }
        if let Some(orphan) = transitions.iter().find(|t| !reachable.contains(&t.from)) {
            return Err(FlowError::InvalidTransition {
                state: format!("{:?}", orphan.from),
                event: format!("{:?} (state unreachable in {})", orphan.event, name),
            });
        }

        Ok(Self {
            name,
            current: initial,
            table,
        })
    }

    pub fn current(&self) -> S {
        self.current
    }


    /// Follow the edge for `event`, or fail without moving
    pub fn fire(&mut self, event: E) -> FlowResult<S> {
        let next = *self.table.get(&(self.current, event)).ok_or_else(|| {
            debug!(flow = self.name, state = ?self.current, event = ?event, "No transition");
            FlowError::InvalidTransition {
                state: format!("{:?}", self.current),
                event: format!("{:?}", event),
            }
        })?;

        info!(
            flow = self.name,
            from = ?self.current,
            to = ?next,
            event = ?event,
            "Flow step transition"
        );

        self.current = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum S {
        A,
        B,
        C,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum E {
        Next,
        Back,
    }

    fn linear() -> StateMachine<S, E> {
        StateMachine::new(
            "test",
            S::A,
            vec![
                Transition::new(S::A, E::Next, S::B),
                Transition::new(S::B, E::Next, S::C),
                Transition::new(S::B, E::Back, S::A),
                Transition::new(S::C, E::Back, S::B),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fire_follows_table() {
        let mut machine = linear();
        assert_eq!(machine.fire(E::Next).unwrap(), S::B);
        assert_eq!(machine.fire(E::Next).unwrap(), S::C);
        assert_eq!(machine.fire(E::Back).unwrap(), S::B);
        assert_eq!(machine.current(), S::B);
    }

    #[test]
    fn test_missing_edge_does_not_move() {
        let mut machine = linear();
        let err = machine.fire(E::Back).unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
        assert_eq!(machine.current(), S::A);
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let result = StateMachine::new(
            "dup",
            S::A,
            vec![
                Transition::new(S::A, E::Next, S::B),
                Transition::new(S::A, E::Next, S::C),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unreachable_source_rejected() {
        let result = StateMachine::new(
            "orphan",
            S::A,
            vec![
                Transition::new(S::A, E::Next, S::B),
                Transition::new(S::C, E::Back, S::A),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_cycles_return_to_start() {
        let mut machine = linear();
        for _ in 0..1_000 {
            machine.fire(E::Next).unwrap();
            machine.fire(E::Back).unwrap();
        }
        assert_eq!(machine.current(), S::A);
        assert_eq!(machine.table.len(), 4);
    }
}
