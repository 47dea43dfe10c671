//! In-memory adapters for the `entrust-auth` traits: repository, cache
//! backends and guard provider.

pub mod cache;
pub mod guards;
pub mod repository;


pub use cache::{InMemoryTaggedCache, UntaggedCache};
pub use guards::StaticGuardProvider;
pub use repository::InMemoryRbacRepository;
