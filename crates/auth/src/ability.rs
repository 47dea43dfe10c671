//! Options and result shapes of the joint role + permission check.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value as JsonValue;

use entrust_core::{EntrustError, EntrustResult};

use crate::combinator::Requirement;

/// Shape of the value returned by `ability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// The collapsed decision only.
    #[default]
    Boolean,
    /// The per-name outcomes only.
    Array,
    /// Both.
    Both,
}

impl FromStr for ReturnType {
    type Err = EntrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "both" => Ok(Self::Both),
            other => Err(EntrustError::invalid_configuration(format!(
                "return_type must be one of boolean, array, both (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbilityOptions {
    /// Require every role and permission (`true`) or any one of them (`false`).
    pub validate_all: bool,
    pub return_type: ReturnType,
}

impl AbilityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_all(mut self, validate_all: bool) -> Self {
        self.validate_all = validate_all;
        self
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn requirement(&self) -> Requirement {
        Requirement::from(self.validate_all)
    }

    /// Validate loosely-typed options such as `{"validate_all": true, "return_type": "both"}`.
    ///
    /// `validate_all` must be a JSON boolean and `return_type` one of the
    /// three names; absent or `null` fields take their defaults.
    pub fn from_value(value: &JsonValue) -> EntrustResult<Self> {
        let map = match value {
            JsonValue::Null => return Ok(Self::default()),
            JsonValue::Object(map) => map,
            other => {
                return Err(EntrustError::invalid_configuration(format!(
                    "ability options must be an object (got {other})"
                )));
            }
        };

        let validate_all = match map.get("validate_all") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                return Err(EntrustError::invalid_configuration(format!(
                    "validate_all must be a boolean (got {other})"
                )));
            }
        };

        let return_type = match map.get("return_type") {
            None | Some(JsonValue::Null) => ReturnType::default(),
            Some(JsonValue::String(s)) => s.parse()?,
            Some(other) => {
                return Err(EntrustError::invalid_configuration(format!(
                    "return_type must be a string (got {other})"
                )));
            }
        };

        Ok(Self {
            validate_all,
            return_type,
        })
    }
}

/// Per-name outcome of every requested role and permission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AbilityReport {
    pub roles: BTreeMap<String, bool>,
    pub permissions: BTreeMap<String, bool>,
}

impl AbilityReport {
    fn outcomes(&self) -> impl Iterator<Item = bool> + '_ {
        self.roles.values().chain(self.permissions.values()).copied()
    }

    pub fn any_true(&self) -> bool {
        Requirement::Any.collapse(self.outcomes())
    }

    /// Vacuously true for an empty report.
    pub fn all_true(&self) -> bool {
        Requirement::All.collapse(self.outcomes())
    }

    pub fn collapse(&self, requirement: Requirement) -> bool {
        requirement.collapse(self.outcomes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AbilityOutcome {
    Boolean(bool),
    Array(AbilityReport),
    Both(bool, AbilityReport),
}

impl AbilityOutcome {
    pub(crate) fn shape(report: AbilityReport, options: &AbilityOptions) -> Self {
        let decision = report.collapse(options.requirement());
        match options.return_type {
            ReturnType::Boolean => Self::Boolean(decision),
            ReturnType::Array => Self::Array(report),
            ReturnType::Both => Self::Both(decision, report),
        }
    }

    /// The collapsed decision, unless only the report was requested.
    pub fn granted(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) | Self::Both(b, _) => Some(*b),
            Self::Array(_) => None,
        }
    }

    pub fn report(&self) -> Option<&AbilityReport> {
        match self {
            Self::Boolean(_) => None,
            Self::Array(report) | Self::Both(_, report) => Some(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_when_absent() {
        assert_eq!(AbilityOptions::from_value(&JsonValue::Null).unwrap(), AbilityOptions::default());
        assert_eq!(AbilityOptions::from_value(&json!({})).unwrap(), AbilityOptions::default());
    }

    #[test]
    fn options_parse_valid_values() {
        let options = AbilityOptions::from_value(&json!({ "validate_all": true, "return_type": "both" })).unwrap();
        assert!(options.validate_all);
        assert_eq!(options.return_type, ReturnType::Both);
    }

    #[test]
    fn non_boolean_validate_all_is_rejected() {
        for bad in [json!("true"), json!(1), json!([true])] {
            let err = AbilityOptions::from_value(&json!({ "validate_all": bad })).unwrap_err();
            assert!(matches!(err, EntrustError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn unknown_return_type_is_rejected() {
        let err = AbilityOptions::from_value(&json!({ "return_type": "string" })).unwrap_err();
        assert!(matches!(err, EntrustError::InvalidConfiguration(msg) if msg.contains("string")));

        let err = AbilityOptions::from_value(&json!({ "return_type": 3 })).unwrap_err();
        assert!(matches!(err, EntrustError::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_report_edges() {
        let report = AbilityReport::default();
        assert!(report.all_true());
        assert!(!report.any_true());
    }

    #[test]
    fn outcome_shapes() {
        let mut report = AbilityReport::default();
        report.roles.insert("admin".to_string(), false);
        report.permissions.insert("post-edit".to_string(), true);

        let any = AbilityOptions::new();
        assert_eq!(AbilityOutcome::shape(report.clone(), &any), AbilityOutcome::Boolean(true));

        let all_both = AbilityOptions::new().validate_all(true).return_type(ReturnType::Both);
        let outcome = AbilityOutcome::shape(report.clone(), &all_both);
        assert_eq!(outcome.granted(), Some(false));
        assert_eq!(outcome.report(), Some(&report));

        let array = AbilityOptions::new().return_type(ReturnType::Array);
        let outcome = AbilityOutcome::shape(report.clone(), &array);
        assert_eq!(outcome.granted(), None);
    }

    #[test]
    fn report_serializes_as_two_maps() {
        let mut report = AbilityReport::default();
        report.roles.insert("admin".to_string(), true);
        let value = serde_json::to_value(AbilityOutcome::Array(report)).unwrap();
        assert_eq!(value, json!({ "roles": { "admin": true }, "permissions": {} }));
    }
}
