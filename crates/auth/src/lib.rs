//! `entrust-auth`: role/permission authorization decisions.
//!
//! Decoupled from HTTP and storage: principals, roles and permissions reach
//! the [`Resolver`] through the [`RbacRepository`] and [`CacheBackend`]
//! traits, and authenticated identities through [`GuardProvider`].

pub mod ability;
pub mod authorize;
pub mod cache;
pub mod combinator;
pub mod facade;
pub mod gate;
pub mod guard;
pub mod manager;
pub mod names;
pub mod ownership;
pub mod permissions;
pub mod principal;
pub mod repository;
pub mod roles;
pub mod wildcard;

#[cfg(test)]
mod testing;

pub use ability::{AbilityOptions, AbilityOutcome, AbilityReport, ReturnType};
pub use authorize::Resolver;
pub use cache::{CacheBackend, CacheScope, RbacCache, Relation};
pub use combinator::Requirement;
pub use facade::Entrust;
pub use gate::{Denial, Gate, GateDecision, coerce_bool};
pub use guard::{GuardProvider, GuardResolution, GuardSelection, GuardSelector};
pub use manager::RbacManager;
pub use names::Names;
pub use ownership::{Ownable, OwnsOptions};
pub use permissions::Permission;
pub use principal::Principal;
pub use repository::{DeleteMode, RbacRepository};
pub use roles::Role;
pub use wildcard::PermissionPattern;
