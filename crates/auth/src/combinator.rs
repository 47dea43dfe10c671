//! The single any/all combinator shared by role, permission and ability checks.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

/// Policy for a list of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// At least one check must pass.
    #[default]
    Any,
    /// Every check must pass.
    All,
}

impl From<bool> for Requirement {
    /// `true` means "require all".
    fn from(require_all: bool) -> Self {
        if require_all { Self::All } else { Self::Any }
    }
}

impl Requirement {
    pub fn is_all(self) -> bool {
        self == Self::All
    }

    /// Evaluate `check` over `items` in order, stopping at the first decisive
    /// outcome (a pass under `Any`, a failure under `All`).
    ///
    /// If nothing is decisive the result is `self.is_all()`: an empty list is
    /// vacuously true under `All` and false under `Any`.
    pub fn short_circuit<T, E, F>(self, items: impl IntoIterator<Item = T>, mut check: F) -> Result<bool, E>
    where
        F: FnMut(T) -> Result<bool, E>,
    {
        for item in items {
            let passed = check(item)?;
            match (self, passed) {
                (Self::Any, true) => return Ok(true),
                (Self::All, false) => return Ok(false),
                _ => {}
            }
        }
        Ok(self.is_all())
    }

    /// Infallible form of [`Requirement::short_circuit`].
    pub fn evaluate<T, F>(self, items: impl IntoIterator<Item = T>, mut check: F) -> bool
    where
        F: FnMut(T) -> bool,
    {
        match self.short_circuit(items, |item| Ok::<_, Infallible>(check(item))) {
            Ok(decision) => decision,
            Err(never) => match never {},
        }
    }

    /// Collapse already-evaluated outcomes into one boolean.
    pub fn collapse(self, outcomes: impl IntoIterator<Item = bool>) -> bool {
        let mut outcomes = outcomes.into_iter();
        match self {
            Self::Any => outcomes.any(|b| b),
            Self::All => outcomes.all(|b| b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ok(b: &bool) -> Result<bool, ()> {
        Ok(*b)
    }

    #[test]
    fn any_stops_at_first_pass() {
        let mut seen = Vec::new();
        let result = Requirement::Any.short_circuit([false, true, false], |b| {
            seen.push(b);
            Ok::<_, ()>(b)
        });
        assert_eq!(result, Ok(true));
        assert_eq!(seen, vec![false, true]);
    }

    #[test]
    fn all_stops_at_first_failure() {
        let mut seen = Vec::new();
        let result = Requirement::All.short_circuit([true, false, true], |b| {
            seen.push(b);
            Ok::<_, ()>(b)
        });
        assert_eq!(result, Ok(false));
        assert_eq!(seen, vec![true, false]);
    }

    #[test]
    fn empty_input_returns_policy_flag() {
        let none: [bool; 0] = [];
        assert_eq!(Requirement::All.short_circuit(none.iter(), ok), Ok(true));
        assert_eq!(Requirement::Any.short_circuit(none.iter(), ok), Ok(false));
        assert!(Requirement::All.collapse(none));
        assert!(!Requirement::Any.collapse(none));
    }

    #[test]
    fn errors_propagate_immediately() {
        let mut calls = 0;
        let result = Requirement::Any.short_circuit([1, 2, 3], |n| {
            calls += 1;
            if n == 2 { Err("boom") } else { Ok(false) }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn short_circuit_agrees_with_collapse(outcomes in prop::collection::vec(any::<bool>(), 0..16), all in any::<bool>()) {
            let requirement = Requirement::from(all);
            let short = requirement.short_circuit(outcomes.iter(), ok).unwrap();
            prop_assert_eq!(short, requirement.collapse(outcomes.iter().copied()));
            prop_assert_eq!(short, requirement.evaluate(outcomes.iter(), |b| *b));
        }
    }
}
