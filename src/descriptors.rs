//! Binding descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Snapshot of one registered abstract
///
/// Produced by [`Container::binding_descriptors`](crate::Container::binding_descriptors)
/// for debugging and startup health checks. Instances registered without a
/// binding are reported as resolved singletons.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{share, Container, Lifetime};
///
/// let container = Container::new();
/// container.singleton("db", |_, _| Ok(share("postgres"))).unwrap();
/// container.bind("clock", |_, _| Ok(share(0u64))).unwrap();
/// container.instance("config.path", "/etc/app").unwrap();
/// container.make("db").unwrap();
///
/// let descriptors = container.binding_descriptors();
/// let db = descriptors.iter().find(|d| d.name() == "db").unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(db.resolved && db.has_instance);
///
/// let clock = descriptors.iter().find(|d| d.name() == "clock").unwrap();
/// assert!(!clock.resolved);
///
/// let singletons = descriptors
///     .iter()
///     .filter(|d| d.lifetime == Lifetime::Singleton)
///     .count();
/// assert_eq!(singletons, 2);
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    /// The abstract
    pub key: Key,
    pub lifetime: Lifetime,
    /// Class concrete, when the binding was registered with one
    pub concrete: Option<Key>,
    /// Resolved at least once since registration
    pub resolved: bool,
    /// A shared instance is currently cached
    pub has_instance: bool,
}

impl BindingDescriptor {
    /// Display name of the abstract.
    pub fn name(&self) -> String {
        self.key.display_name()
    }

    pub fn is_type(&self) -> bool {
        self.key.is_type()
    }

    /// Display name of the class concrete, if any.
    pub fn concrete_name(&self) -> Option<String> {
        self.concrete.as_ref().map(Key::display_name)
    }
}
