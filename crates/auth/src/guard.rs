//! Guard selection: which authentication context's principal a check runs against.

use std::sync::Arc;

use entrust_core::EntrustResult;

use crate::Principal;
use crate::names::DELIMITER;

/// Source of the authenticated principal for a named guard (`"web"`, `"api"`, ...).
pub trait GuardProvider: Send + Sync {
    fn current_principal(&self, guard: &str) -> Option<Principal>;

    fn is_guest(&self, guard: &str) -> bool {
        self.current_principal(guard).is_none()
    }
}

/// The guard(s) a caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuardSelection {
    /// Use the configured default guard.
    #[default]
    Default,
    Single(String),
    /// Evaluated in order; the first guard to authorize wins.
    Many(Vec<String>),
}

impl GuardSelection {
    /// `None` or a blank string selects the default guard; `"api|web"` selects several.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Default,
            Some(raw) if raw.contains(DELIMITER) => Self::Many(
                raw.split(DELIMITER)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Some(raw) => Self::Single(raw.to_string()),
        }
    }
}

impl From<&str> for GuardSelection {
    fn from(value: &str) -> Self {
        Self::parse(Some(value))
    }
}

impl From<Option<&str>> for GuardSelection {
    fn from(value: Option<&str>) -> Self {
        Self::parse(value)
    }
}

impl From<Vec<String>> for GuardSelection {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl From<Vec<&str>> for GuardSelection {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(str::to_string).collect())
    }
}

/// Outcome of guard selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardResolution {
    /// The guard that decided the outcome (the last one evaluated on failure).
    pub guard: Option<String>,
    pub principal: Option<Principal>,
    pub authorized: bool,
}

impl GuardResolution {
    fn unresolved() -> Self {
        Self {
            guard: None,
            principal: None,
            authorized: false,
        }
    }
}

pub struct GuardSelector<G> {
    provider: Arc<G>,
    default_guard: String,
}

impl<G: GuardProvider> GuardSelector<G> {
    pub fn new(provider: Arc<G>, default_guard: impl Into<String>) -> Self {
        Self {
            provider,
            default_guard: default_guard.into(),
        }
    }

    pub fn default_guard(&self) -> &str {
        &self.default_guard
    }

    /// The signed-in principal of `guard` (or of the default guard).
    pub fn current(&self, guard: Option<&str>) -> Option<Principal> {
        let guard = guard.unwrap_or(&self.default_guard);
        if self.provider.is_guest(guard) {
            return None;
        }
        self.provider.current_principal(guard)
    }

    /// Pick the identity to evaluate and run `authorize` against it.
    ///
    /// With several guards, guests are skipped and a guard whose principal is
    /// refused does not end the search; the first guard whose principal is
    /// authorized wins. Errors from `authorize` end the search immediately.
    pub fn resolve<F>(&self, selection: &GuardSelection, mut authorize: F) -> EntrustResult<GuardResolution>
    where
        F: FnMut(&Principal) -> EntrustResult<bool>,
    {
        match selection {
            GuardSelection::Default => self.evaluate(&self.default_guard, &mut authorize),
            GuardSelection::Single(guard) => self.evaluate(guard, &mut authorize),
            GuardSelection::Many(guards) => {
                let mut last = GuardResolution::unresolved();
                for guard in guards {
                    let resolution = self.evaluate(guard, &mut authorize)?;
                    if resolution.authorized {
                        return Ok(resolution);
                    }
                    last = resolution;
                }
                tracing::debug!(guards = ?guards, "no guard authorized the request");
                Ok(last)
            }
        }
    }

    fn evaluate<F>(&self, guard: &str, authorize: &mut F) -> EntrustResult<GuardResolution>
    where
        F: FnMut(&Principal) -> EntrustResult<bool>,
    {
        let principal = self.current(Some(guard));
        let authorized = match &principal {
            Some(p) => authorize(p)?,
            None => false,
        };
        tracing::debug!(guard, guest = principal.is_none(), authorized, "evaluated guard");
        Ok(GuardResolution {
            guard: Some(guard.to_string()),
            principal,
            authorized,
        })
    }
}
