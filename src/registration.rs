//! Binding records and the mutable registry behind a container.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::container::Container;
use crate::contextual::Implementation;
use crate::error::DiResult;
use crate::events::Events;
use crate::key::{key_of_type, Key};
use crate::parameters::{AnyArc, Parameters};

/// Closure producing an instance from the container and the active overrides.
pub type FactoryFn = Arc<dyn Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync>;

/// Post-processing applied to a freshly resolved instance.
pub type ExtenderFn = Arc<dyn Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync>;

/// Override invoked by `call` in place of the method body.
pub type MethodBindingFn = Arc<dyn Fn(&Receiver, &Container) -> DiResult<AnyArc> + Send + Sync>;

/// How an abstract is produced.
#[derive(Clone)]
pub enum Concrete {
    /// Closure resolver
    Factory(FactoryFn),
    /// Class or abstract to build or resolve in its place
    Class(Key),
}

impl Concrete {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(factory))
    }

    pub fn class<T: 'static>() -> Self {
        Concrete::Class(key_of_type::<T>())
    }
}

impl From<Key> for Concrete {
    fn from(key: Key) -> Self {
        Concrete::Class(key)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Factory(_) => f.write_str("Factory"),
            Concrete::Class(key) => write!(f, "Class({})", key),
        }
    }
}

/// Receiver handed to a method binding.
#[derive(Clone)]
pub enum Receiver {
    /// Resolved instance for an instance method
    Instance(AnyArc),
    /// The class itself for a static method
    Static(Key),
}

impl Receiver {
    pub fn instance(&self) -> Option<&AnyArc> {
        match self {
            Receiver::Instance(instance) => Some(instance),
            Receiver::Static(_) => None,
        }
    }
}

/// A registered binding
#[derive(Clone)]
pub struct Binding {
    pub(crate) concrete: FactoryFn,
    pub(crate) shared: bool,
    /// Class concrete, kept for diagnostics
    pub(crate) class: Option<Key>,
}

impl Binding {
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Class the binding builds, when it was registered with one.
    pub fn class(&self) -> Option<&Key> {
        self.class.as_ref()
    }

    /// Invokes the concrete directly, bypassing caching and events.
    pub fn produce(&self, container: &Container, parameters: &Parameters) -> DiResult<AnyArc> {
        (self.concrete)(container, parameters)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("shared", &self.shared)
            .field("class", &self.class)
            .finish()
    }
}

/// Mutable container state, guarded by the container's lock.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) bindings: IndexMap<Key, Binding>,
    pub(crate) aliases: HashMap<Key, Key>,
    /// Reverse alias index in registration order, used by contextual lookups
    pub(crate) abstract_aliases: HashMap<Key, Vec<Key>>,
    pub(crate) resolved: HashSet<Key>,
    pub(crate) instances: HashMap<Key, AnyArc>,
    pub(crate) scoped: HashSet<Key>,
    pub(crate) extenders: HashMap<Key, Vec<ExtenderFn>>,
    pub(crate) tags: IndexMap<String, Vec<Key>>,
    /// consumer class -> need -> implementation
    pub(crate) contextual: HashMap<Key, HashMap<Key, Implementation>>,
    pub(crate) method_bindings: HashMap<(Key, String, bool), MethodBindingFn>,
    pub(crate) events: Events,
}

impl Registry {
    pub(crate) fn alias_of(&self, abstract_: &Key) -> Key {
        let mut current = abstract_;
        while let Some(next) = self.aliases.get(current) {
            current = next;
        }
        current.clone()
    }

    /// Whether `searched` is `abstract_` or any key its alias chain passes through.
    ///
    /// Chains are kept acyclic by `Container::alias`, so the walk terminates.
    pub(crate) fn alias_chain_contains(&self, abstract_: &Key, searched: &Key) -> bool {
        let mut current = Some(abstract_);
        while let Some(key) = current {
            if key == searched {
                return true;
            }
            current = self.aliases.get(key);
        }
        false
    }

    pub(crate) fn is_shared(&self, abstract_: &Key) -> bool {
        self.instances.contains_key(abstract_)
            || self.bindings.get(abstract_).map_or(false, |b| b.shared)
    }

    pub(crate) fn is_bound(&self, abstract_: &Key) -> bool {
        self.bindings.contains_key(abstract_)
            || self.instances.contains_key(abstract_)
            || self.aliases.contains_key(abstract_)
    }

    pub(crate) fn is_resolved(&self, abstract_: &Key) -> bool {
        let abstract_ = self.alias_of(abstract_);
        self.resolved.contains(&abstract_) || self.instances.contains_key(&abstract_)
    }

    /// Removes `searched` from every reverse alias list.
    pub(crate) fn remove_abstract_alias(&mut self, searched: &Key) {
        if !self.aliases.contains_key(searched) {
            return;
        }
        for aliases in self.abstract_aliases.values_mut() {
            aliases.retain(|alias| alias != searched);
        }
    }

    /// Contextual implementation for `abstract_` while `consumer` is being built.
    pub(crate) fn contextual_for(&self, consumer: &Key, abstract_: &Key) -> Option<Implementation> {
        let needs = self.contextual.get(consumer)?;
        if let Some(found) = needs.get(abstract_) {
            return Some(found.clone());
        }
        self.abstract_aliases
            .get(abstract_)?
            .iter()
            .find_map(|alias| needs.get(alias).cloned())
    }
}
