//! Internal implementation details.

pub(crate) mod frames;

pub(crate) use frames::{BuildGuard, WithGuard};
