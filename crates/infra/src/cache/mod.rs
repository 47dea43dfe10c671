//! Cache backends for `RbacCache`.

mod tagged;
mod untagged;

pub use tagged::InMemoryTaggedCache;
pub use untagged::UntaggedCache;
