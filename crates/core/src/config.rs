//! Configuration surface consumed by the resolver, gate and facade.
//!
//! Every field has a default so a partial JSON document is enough.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EntrustError, EntrustResult};

pub const DEFAULT_DENIAL_MESSAGE: &str = "User does not have any of the necessary access rights.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrustConfig {
    /// Guard used when the caller does not name one.
    pub default_guard: String,

    /// Time-to-live of cached role/permission lookups.
    pub cache_ttl_seconds: u64,

    /// Policy used by the gate and facade when a list of names is checked.
    pub require_all_default: bool,

    pub tables: Tables,
    pub foreign_keys: ForeignKeys,
    pub middleware: MiddlewareConfig,
}

impl Default for EntrustConfig {
    fn default() -> Self {
        Self {
            default_guard: "web".to_string(),
            cache_ttl_seconds: 60,
            require_all_default: false,
            tables: Tables::default(),
            foreign_keys: ForeignKeys::default(),
            middleware: MiddlewareConfig::default(),
        }
    }
}

/// Relation names. The link-table names double as cache invalidation scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub roles: String,
    pub permissions: String,
    pub role_user: String,
    pub permission_role: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            roles: "roles".to_string(),
            permissions: "permissions".to_string(),
            role_user: "role_user".to_string(),
            permission_role: "permission_role".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeys {
    pub user: String,
    pub role: String,
    pub permission: String,
}

impl Default for ForeignKeys {
    fn default() -> Self {
        Self {
            user: "user_id".to_string(),
            role: "role_id".to_string(),
            permission: "permission_id".to_string(),
        }
    }
}

/// How a denied request is answered by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Key into `handlers`: `abort` or `redirect`.
    pub handling: String,
    pub handlers: Handlers,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            handling: "abort".to_string(),
            handlers: Handlers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Handlers {
    pub abort: AbortHandler,
    pub redirect: RedirectHandler,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            abort: AbortHandler {
                code: 403,
                message: Some("You don't have permission to access this page.".to_string()),
            },
            redirect: RedirectHandler {
                url: "/".to_string(),
                flash: Some(FlashMessage {
                    key: "error".to_string(),
                    content: "You don't have permission to access this page".to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortHandler {
    pub code: u16,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHandler {
    pub url: String,
    pub flash: Option<FlashMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub key: String,
    pub content: String,
}

/// The handler selected by `middleware.handling`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnauthorizedHandler {
    Abort { code: u16, message: String },
    Redirect { url: String, flash: Option<FlashMessage> },
}

impl MiddlewareConfig {
    pub fn handler(&self) -> EntrustResult<UnauthorizedHandler> {
        match self.handling.as_str() {
            "abort" => Ok(UnauthorizedHandler::Abort {
                code: self.handlers.abort.code,
                message: self
                    .handlers
                    .abort
                    .message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DENIAL_MESSAGE.to_string()),
            }),
            "redirect" => Ok(UnauthorizedHandler::Redirect {
                url: self.handlers.redirect.url.clone(),
                // An empty flash content means "don't flash anything".
                flash: self
                    .handlers
                    .redirect
                    .flash
                    .clone()
                    .filter(|f| !f.content.is_empty()),
            }),
            other => Err(EntrustError::invalid_configuration(format!(
                "unknown middleware handling '{other}'"
            ))),
        }
    }
}

impl EntrustConfig {
    /// Parse a JSON document, then validate it.
    pub fn from_json_str(raw: &str) -> EntrustResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| EntrustError::invalid_configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read entrust config at {}", path.display()))?;
        let config = Self::from_json_str(&raw)
            .with_context(|| format!("invalid entrust config at {}", path.display()))?;
        tracing::debug!(path = %path.display(), guard = %config.default_guard, "loaded entrust config");
        Ok(config)
    }

    pub fn validate(&self) -> EntrustResult<()> {
        if self.default_guard.trim().is_empty() {
            return Err(EntrustError::invalid_configuration("default_guard must not be empty"));
        }
        if self.tables.role_user.is_empty() || self.tables.permission_role.is_empty() {
            return Err(EntrustError::invalid_configuration("link table names must not be empty"));
        }
        if self.foreign_keys.user.is_empty() {
            return Err(EntrustError::invalid_configuration("foreign_keys.user must not be empty"));
        }
        self.middleware.handler()?;
        Ok(())
    }
}
