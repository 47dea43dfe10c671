//! `entrust-core`: identifiers, error model and configuration shared by the
//! authorization crates.
//!
//! This crate contains no decision logic and no infrastructure.

pub mod config;
pub mod error;
pub mod id;

pub use config::{
    AbortHandler, EntrustConfig, FlashMessage, ForeignKeys, Handlers, MiddlewareConfig, RedirectHandler,
    Tables, UnauthorizedHandler,
};
pub use error::{CacheError, EntrustError, EntrustResult, RepositoryError};
pub use id::{PermissionId, PrincipalId, RoleId};
