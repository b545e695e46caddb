//! Binding lifetime definitions.

/// Lifetimes controlling instance caching behavior
///
/// A binding record only stores a `shared` flag; the scoped-instance set
/// refines shared bindings into the ones cleared by
/// `forget_scoped_instances`. `Lifetime` is the combined view reported
/// through [`BindingDescriptor`](crate::BindingDescriptor).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifetime};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.bind("clock", |_, _| Ok(Arc::new(0u64) as _)).unwrap();
/// container.singleton("db", |_, _| Ok(Arc::new("postgres") as _)).unwrap();
/// container.scoped("request", |_, _| Ok(Arc::new(1u32) as _)).unwrap();
///
/// assert_eq!(container.lifetime("clock"), Some(Lifetime::Transient));
/// assert_eq!(container.lifetime("db"), Some(Lifetime::Singleton));
/// assert_eq!(container.lifetime("request"), Some(Lifetime::Scoped));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Cached on first resolution until forgotten or flushed
    Singleton,
    /// Cached like a singleton, cleared by `forget_scoped_instances`
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    pub(crate) fn from_flags(shared: bool, scoped: bool) -> Self {
        match (shared, scoped) {
            (true, true) => Lifetime::Scoped,
            (true, false) => Lifetime::Singleton,
            (false, _) => Lifetime::Transient,
        }
    }

    pub fn is_shared(self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}
