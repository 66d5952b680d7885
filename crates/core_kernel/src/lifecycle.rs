//! Status state machines
//!
//! Every lifecycle-bearing entity (plan, claim, payment, repair order) has a
//! status enum implementing [`StatusMachine`]. The transition table is the
//! single source of truth: `successors()` lists the allowed next states and
//! everything else, including staying in the same state, is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A rejected status change
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Invalid {entity} status transition from {from} to {to}")]
pub struct TransitionError {
    pub entity: String,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    pub fn new(entity: impl Into<String>, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self {
            entity: entity.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Allow/deny decisions for one entity's status enum
pub trait StatusMachine: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// Entity name used in errors and logs
    const ENTITY: &'static str;

    /// Every status, in declaration order
    fn all() -> &'static [Self];

    /// Statuses reachable in one step from `self`
    fn successors(&self) -> &'static [Self];

    /// Statuses that are final for the entity's lifecycle
    ///
    /// A terminal status never has successors. The converse does not hold:
    /// some statuses are parked without being final.
    fn is_terminal(&self) -> bool;

    fn can_transition_to(&self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    fn ensure_transition(&self, next: Self) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError::new(Self::ENTITY, self, next))
        }
    }
}

/// Checks `from -> to` against the table for `S`
pub fn ensure_transition<S: StatusMachine>(from: S, to: S) -> Result<(), TransitionError> {
    from.ensure_transition(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        Amber,
        Red,
        Broken,
    }

    impl fmt::Display for Light {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Light::Green => "GREEN",
                Light::Amber => "AMBER",
                Light::Red => "RED",
                Light::Broken => "BROKEN",
            };
            f.write_str(name)
        }
    }

    impl StatusMachine for Light {
        const ENTITY: &'static str = "Light";

        fn all() -> &'static [Self] {
            &[Light::Green, Light::Amber, Light::Red, Light::Broken]
        }

        fn successors(&self) -> &'static [Self] {
            match self {
                Light::Green => &[Light::Amber, Light::Broken],
                Light::Amber => &[Light::Red, Light::Broken],
                Light::Red => &[Light::Green, Light::Broken],
                Light::Broken => &[],
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self, Light::Broken)
        }
    }

    #[test]
    fn test_table_drives_decisions() {
        assert!(Light::Green.can_transition_to(Light::Amber));
        assert!(!Light::Green.can_transition_to(Light::Red));
        assert!(!Light::Green.can_transition_to(Light::Green));
    }

    #[test]
    fn test_error_carries_wire_names() {
        let err = ensure_transition(Light::Broken, Light::Green).unwrap_err();
        assert_eq!(err.entity, "Light");
        assert_eq!(err.from, "BROKEN");
        assert_eq!(err.to, "GREEN");
    }

    #[test]
    fn test_terminal_has_no_successors() {
        for status in Light::all() {
            if status.is_terminal() {
                assert!(status.successors().is_empty());
            }
        }
    }
}
