//! The inversion-of-control container.
//!
//! Registration lives here; resolution is in `resolve`, call injection in
//! `call`, and the process-wide accessor in `global`.

mod call;
mod global;
mod options;
mod resolve;
mod tagged;

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::contextual::{ContextualBindingBuilder, Implementation};
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::events::{BeforeResolvingFn, ReboundFn, ResolvingFn};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::parameters::{share, AnyArc, Parameters};
use crate::reflection::MetadataProvider;
use crate::registration::{Binding, Concrete, ExtenderFn, FactoryFn, Registry};

pub use call::{Callable, MethodRef};
pub use options::{ContainerOptions, DEFAULT_MAX_DEPTH};
pub use tagged::Tagged;

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

/// Inversion-of-control container
///
/// Maps abstracts (names, symbols or types) to concretes, builds object
/// graphs from registered constructor metadata, and injects dependencies
/// into functions and methods. Cloning is cheap and yields a handle to the
/// same container.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{share, Container, Resolver};
///
/// let container = Container::new();
/// container.bind("name", |_, _| Ok(share("Claudio"))).unwrap();
/// container.alias("name", "user.name").unwrap();
///
/// assert_eq!(*container.make_as::<&str>("user.name").unwrap(), "Claudio");
/// assert!(container.bound("name"));
/// assert!(container.is_alias("user.name"));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    max_depth: usize,
    metadata: Arc<dyn MetadataProvider>,
    registry: Mutex<Registry>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry();
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("bindings", &registry.bindings.len())
            .field("instances", &registry.instances.len())
            .field("aliases", &registry.aliases.len())
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed),
                max_depth: options.max_depth,
                metadata: options.metadata,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    /// Whether two handles refer to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn metadata(&self) -> &dyn MetadataProvider {
        &*self.inner.metadata
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock()
    }

    // ----- registration -----

    /// Registers a closure binding.
    pub fn bind<F>(&self, abstract_: impl Into<Key>, factory: F) -> DiResult<()>
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.register(abstract_, Some(Concrete::factory(factory)), false)
    }

    /// Binds an abstract to a class or another abstract.
    pub fn bind_class(&self, abstract_: impl Into<Key>, concrete: impl Into<Key>) -> DiResult<()> {
        self.register(abstract_, Some(Concrete::Class(concrete.into())), false)
    }

    /// Binds a class to itself.
    pub fn bind_type<T: 'static>(&self) -> DiResult<()> {
        self.register(key_of_type::<T>(), None, false)
    }

    /// Registers a binding.
    ///
    /// With no concrete the abstract is bound to itself, which only works
    /// for classes. A class concrete is built directly when it equals the
    /// abstract, and resolved as an abstract of its own otherwise.
    ///
    /// If the abstract was already resolved the new binding is resolved at
    /// once and handed to its rebinding callbacks.
    pub fn register(
        &self,
        abstract_: impl Into<Key>,
        concrete: Option<Concrete>,
        shared: bool,
    ) -> DiResult<()> {
        let abstract_ = abstract_.into();
        {
            let mut registry = self.registry();
            registry.instances.remove(&abstract_);
            registry.aliases.remove(&abstract_);
        }

        let concrete = match concrete {
            Some(concrete) => concrete,
            None => match &abstract_ {
                Key::Name(name) => {
                    return Err(DiError::Config(format!(
                        "please provide a concrete for abstract {}.",
                        name
                    )))
                }
                Key::Symbol(_) => {
                    return Err(DiError::Config(format!(
                        "concrete should be a closure or a class, \"{}\" given.",
                        abstract_.kind_name()
                    )))
                }
                Key::Type(..) => Concrete::Class(abstract_.clone()),
            },
        };

        let (factory, class) = match concrete {
            Concrete::Factory(factory) => (factory, None),
            Concrete::Class(class) => (class_closure(abstract_.clone(), class.clone()), Some(class)),
        };

        debug!(abstract_ = %abstract_, shared, "binding registered");
        let was_resolved = {
            let mut registry = self.registry();
            registry.bindings.insert(
                abstract_.clone(),
                Binding {
                    concrete: factory,
                    shared,
                    class,
                },
            );
            registry.is_resolved(&abstract_)
        };

        if was_resolved {
            self.rebound(&abstract_)?;
        }
        Ok(())
    }

    pub fn bind_if(
        &self,
        abstract_: impl Into<Key>,
        concrete: Option<Concrete>,
        shared: bool,
    ) -> DiResult<()> {
        let abstract_ = abstract_.into();
        if self.has(&abstract_) {
            return Ok(());
        }
        self.register(abstract_, concrete, shared)
    }

    /// Registers a shared closure binding.
    pub fn singleton<F>(&self, abstract_: impl Into<Key>, factory: F) -> DiResult<()>
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.register(abstract_, Some(Concrete::factory(factory)), true)
    }

    pub fn singleton_class(&self, abstract_: impl Into<Key>, concrete: impl Into<Key>) -> DiResult<()> {
        self.register(abstract_, Some(Concrete::Class(concrete.into())), true)
    }

    pub fn singleton_type<T: 'static>(&self) -> DiResult<()> {
        self.register(key_of_type::<T>(), None, true)
    }

    pub fn singleton_if(&self, abstract_: impl Into<Key>, concrete: Option<Concrete>) -> DiResult<()> {
        self.bind_if(abstract_, concrete, true)
    }

    /// Registers a shared binding cleared by [`forget_scoped_instances`](Self::forget_scoped_instances).
    pub fn scoped<F>(&self, abstract_: impl Into<Key>, factory: F) -> DiResult<()>
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.register_scoped(abstract_.into(), Some(Concrete::factory(factory)))
    }

    pub fn scoped_class(&self, abstract_: impl Into<Key>, concrete: impl Into<Key>) -> DiResult<()> {
        self.register_scoped(abstract_.into(), Some(Concrete::Class(concrete.into())))
    }

    pub fn scoped_type<T: 'static>(&self) -> DiResult<()> {
        self.register_scoped(key_of_type::<T>(), None)
    }

    pub fn scoped_if(&self, abstract_: impl Into<Key>, concrete: Option<Concrete>) -> DiResult<()> {
        let abstract_ = abstract_.into();
        if self.bound(&abstract_) {
            return Ok(());
        }
        self.register_scoped(abstract_, concrete)
    }

    fn register_scoped(&self, abstract_: Key, concrete: Option<Concrete>) -> DiResult<()> {
        self.registry().scoped.insert(abstract_.clone());
        self.register(abstract_, concrete, true)
    }

    /// Binds a string abstract to a constant.
    pub fn set<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> DiResult<()> {
        let value = share(value);
        self.bind(Key::from(name.into()), move |_, _| Ok(value.clone()))
    }

    /// Registers an existing value as the shared instance of an abstract.
    pub fn instance<T: Any + Send + Sync>(&self, abstract_: impl Into<Key>, value: T) -> DiResult<AnyArc> {
        self.instance_any(abstract_, share(value))
    }

    /// Type-erased form of [`instance`](Self::instance).
    pub fn instance_any(&self, abstract_: impl Into<Key>, value: AnyArc) -> DiResult<AnyArc> {
        let abstract_ = abstract_.into();
        let was_bound = {
            let mut registry = self.registry();
            registry.remove_abstract_alias(&abstract_);
            let was_bound = registry.is_bound(&abstract_);
            registry.aliases.remove(&abstract_);
            registry.instances.insert(abstract_.clone(), value.clone());
            was_bound
        };
        debug!(abstract_ = %abstract_, rebound = was_bound, "instance registered");
        if was_bound {
            self.rebound(&abstract_)?;
        }
        Ok(value)
    }

    /// Makes `alias` resolve to `abstract_`.
    ///
    /// Fails when `alias` is `abstract_` itself or anywhere on its alias chain.
    pub fn alias(&self, abstract_: impl Into<Key>, alias: impl Into<Key>) -> DiResult<()> {
        let abstract_ = abstract_.into();
        let alias = alias.into();
        let mut registry = self.registry();
        if registry.alias_chain_contains(&abstract_, &alias) {
            return Err(DiError::SelfAlias(abstract_.display_name()));
        }
        debug!(abstract_ = %abstract_, alias = %alias, "alias registered");
        registry.aliases.insert(alias.clone(), abstract_.clone());
        registry.abstract_aliases.entry(abstract_).or_default().push(alias);
        Ok(())
    }

    /// Assigns tags to abstracts.
    pub fn tag<K, T>(
        &self,
        abstracts: impl IntoIterator<Item = K>,
        tags: impl IntoIterator<Item = T>,
    ) where
        K: Into<Key>,
        T: Into<String>,
    {
        let abstracts: Vec<Key> = abstracts.into_iter().map(Into::into).collect();
        let mut registry = self.registry();
        for tag in tags {
            registry
                .tags
                .entry(tag.into())
                .or_default()
                .extend(abstracts.iter().cloned());
        }
    }

    /// Lazily resolves every abstract carrying `tag`.
    pub fn tagged(&self, tag: &str) -> Tagged {
        let keys = self.registry().tags.get(tag).cloned().unwrap_or_default();
        Tagged::new(self.clone(), keys)
    }

    /// Decorates an abstract's instances.
    ///
    /// An already cached instance is replaced immediately; otherwise the
    /// extender runs, in registration order, after every fresh resolution.
    pub fn extend<F>(&self, abstract_: impl Into<Key>, extender: F) -> DiResult<()>
    where
        F: Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_);
        let extender: ExtenderFn = Arc::new(extender);
        debug!(abstract_ = %abstract_, "extender registered");

        let cached = self.registry().instances.get(&abstract_).cloned();
        if let Some(instance) = cached {
            let extended = extender(instance, self)?;
            self.registry().instances.insert(abstract_.clone(), extended);
            return self.rebound(&abstract_);
        }

        let was_resolved = {
            let mut registry = self.registry();
            registry
                .extenders
                .entry(abstract_.clone())
                .or_default()
                .push(extender);
            registry.resolved.contains(&abstract_)
        };
        if was_resolved {
            self.rebound(&abstract_)?;
        }
        Ok(())
    }

    pub fn forget_extenders(&self, abstract_: impl Into<Key>) {
        let abstract_ = self.get_alias(abstract_);
        self.registry().extenders.remove(&abstract_);
    }

    /// Starts a contextual binding for one consumer class.
    pub fn when(&self, concrete: impl Into<Key>) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, vec![concrete.into()])
    }

    pub fn when_type<T: 'static>(&self) -> ContextualBindingBuilder<'_> {
        self.when(key_of_type::<T>())
    }

    /// Starts a contextual binding shared by several consumer classes.
    pub fn when_any<K: Into<Key>>(
        &self,
        concretes: impl IntoIterator<Item = K>,
    ) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, concretes.into_iter().map(Into::into).collect())
    }

    /// Records a contextual implementation, keyed by the need after alias resolution.
    pub fn add_contextual_binding(&self, concrete: &Key, need: &Key, implementation: Implementation) {
        let mut registry = self.registry();
        let need = registry.alias_of(need);
        debug!(concrete = %concrete, need = %need, "contextual binding registered");
        registry
            .contextual
            .entry(concrete.clone())
            .or_default()
            .insert(need, implementation);
    }

    // ----- callbacks -----

    /// Registers a callback fired before any abstract is resolved.
    pub fn before_resolving_any<F>(&self, callback: F)
    where
        F: Fn(&Key, &Parameters, &Container) + Send + Sync + 'static,
    {
        let callback: BeforeResolvingFn = Arc::new(callback);
        self.registry().events.global_before.push(callback);
    }

    pub fn before_resolving<F>(&self, abstract_: impl Into<Key>, callback: F)
    where
        F: Fn(&Key, &Parameters, &Container) + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_);
        let callback: BeforeResolvingFn = Arc::new(callback);
        self.registry()
            .events
            .before
            .entry(abstract_)
            .or_default()
            .push(callback);
    }

    /// Registers a callback fired with every resolved instance.
    pub fn resolving_any<F>(&self, callback: F)
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let callback: ResolvingFn = Arc::new(callback);
        self.registry().events.global_resolving.push(callback);
    }

    pub fn resolving<F>(&self, abstract_: impl Into<Key>, callback: F)
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_);
        let callback: ResolvingFn = Arc::new(callback);
        self.registry()
            .events
            .resolving
            .entry(abstract_)
            .or_default()
            .push(callback);
    }

    pub fn after_resolving_any<F>(&self, callback: F)
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let callback: ResolvingFn = Arc::new(callback);
        self.registry().events.global_after.push(callback);
    }

    pub fn after_resolving<F>(&self, abstract_: impl Into<Key>, callback: F)
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_);
        let callback: ResolvingFn = Arc::new(callback);
        self.registry()
            .events
            .after
            .entry(abstract_)
            .or_default()
            .push(callback);
    }

    /// Registers a rebinding callback, returning the current instance when
    /// the abstract is bound.
    pub fn rebinding<F>(&self, abstract_: impl Into<Key>, callback: F) -> DiResult<Option<AnyArc>>
    where
        F: Fn(&Container, &AnyArc) + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_);
        let callback: ReboundFn = Arc::new(callback);
        let bound = {
            let mut registry = self.registry();
            registry
                .events
                .rebound
                .entry(abstract_.clone())
                .or_default()
                .push(callback);
            registry.is_bound(&abstract_)
        };
        if bound {
            return self.make(abstract_).map(Some);
        }
        Ok(None)
    }

    /// Calls `method` on `target` with the new instance whenever `abstract_` is rebound.
    pub fn refresh<T, F>(
        &self,
        abstract_: impl Into<Key>,
        target: Arc<T>,
        method: F,
    ) -> DiResult<Option<AnyArc>>
    where
        T: Send + Sync + 'static,
        F: Fn(&T, AnyArc) + Send + Sync + 'static,
    {
        self.rebinding(abstract_, move |_, instance| method(&target, instance.clone()))
    }

    fn rebound(&self, abstract_: &Key) -> DiResult<()> {
        let instance = self.make(abstract_.clone())?;
        let callbacks = self.registry().events.rebound_for(abstract_);
        debug!(abstract_ = %abstract_, callbacks = callbacks.len(), "rebound");
        for callback in callbacks {
            callback(self, &instance);
        }
        Ok(())
    }

    // ----- queries -----

    /// Whether the abstract has a binding, an instance or is an alias.
    pub fn bound(&self, abstract_: impl Into<Key>) -> bool {
        self.registry().is_bound(&abstract_.into())
    }

    pub fn has(&self, abstract_: impl Into<Key>) -> bool {
        self.bound(abstract_)
    }

    /// Whether the abstract, after alias resolution, was resolved or holds an instance.
    pub fn resolved(&self, abstract_: impl Into<Key>) -> bool {
        self.registry().is_resolved(&abstract_.into())
    }

    pub fn is_shared(&self, abstract_: impl Into<Key>) -> bool {
        self.registry().is_shared(&abstract_.into())
    }

    pub fn is_alias(&self, abstract_: impl Into<Key>) -> bool {
        self.registry().aliases.contains_key(&abstract_.into())
    }

    /// Follows the alias chain to its root.
    pub fn get_alias(&self, abstract_: impl Into<Key>) -> Key {
        self.registry().alias_of(&abstract_.into())
    }

    /// Snapshot of the registered bindings in registration order.
    pub fn get_bindings(&self) -> Vec<(Key, Binding)> {
        self.registry()
            .bindings
            .iter()
            .map(|(k, b)| (k.clone(), b.clone()))
            .collect()
    }

    pub fn lifetime(&self, abstract_: impl Into<Key>) -> Option<Lifetime> {
        let abstract_ = abstract_.into();
        let registry = self.registry();
        let scoped = registry.scoped.contains(&abstract_);
        match registry.bindings.get(&abstract_) {
            Some(binding) => Some(Lifetime::from_flags(binding.shared, scoped)),
            None if registry.instances.contains_key(&abstract_) => Some(Lifetime::Singleton),
            None => None,
        }
    }

    /// Introspection snapshot of every binding and instance.
    pub fn binding_descriptors(&self) -> Vec<BindingDescriptor> {
        let registry = self.registry();
        let mut out: Vec<BindingDescriptor> = registry
            .bindings
            .iter()
            .map(|(key, binding)| BindingDescriptor {
                key: key.clone(),
                lifetime: Lifetime::from_flags(binding.shared, registry.scoped.contains(key)),
                concrete: binding.class.clone(),
                resolved: registry.resolved.contains(key),
                has_instance: registry.instances.contains_key(key),
            })
            .collect();
        for key in registry.instances.keys() {
            if !registry.bindings.contains_key(key) {
                out.push(BindingDescriptor {
                    key: key.clone(),
                    lifetime: Lifetime::Singleton,
                    concrete: None,
                    resolved: true,
                    has_instance: true,
                });
            }
        }
        out
    }

    // ----- teardown -----

    pub fn forget_instance(&self, abstract_: impl Into<Key>) {
        self.registry().instances.remove(&abstract_.into());
    }

    pub fn forget_instances(&self) {
        self.registry().instances.clear();
    }

    pub fn forget_scoped_instances(&self) {
        let mut registry = self.registry();
        let scoped: Vec<Key> = registry.scoped.iter().cloned().collect();
        for key in scoped {
            registry.instances.remove(&key);
        }
    }

    /// Removes a binding together with its instance and resolved flag.
    pub fn unset(&self, abstract_: impl Into<Key>) {
        let abstract_ = abstract_.into();
        let mut registry = self.registry();
        registry.bindings.shift_remove(&abstract_);
        registry.instances.remove(&abstract_);
        registry.resolved.remove(&abstract_);
    }

    /// Drops all bindings, instances, aliases, tags, extenders, contextual
    /// bindings and callbacks.
    pub fn flush(&self) {
        debug!(container = self.id(), "container flushed");
        *self.registry() = Registry::default();
    }
}

/// Closure standing in for a class concrete.
fn class_closure(abstract_: Key, concrete: Key) -> FactoryFn {
    Arc::new(move |container: &Container, parameters: &Parameters| {
        if abstract_ == concrete {
            container.build(concrete.clone())
        } else {
            container.resolve(concrete.clone(), parameters.clone(), false)
        }
    })
}
