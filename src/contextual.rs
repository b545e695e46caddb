//! Contextual bindings: per-consumer overrides of a dependency.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::config::{Config, ConfigValue};
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::parameters::{share, AnyArc, Parameters};
use crate::registration::FactoryFn;
use crate::traits::Resolver;

/// What a contextual binding hands to the consumer.
#[derive(Clone)]
pub enum Implementation {
    /// Fixed value, returned as is
    Value(AnyArc),
    /// Another abstract, resolved through the container
    Abstract(Key),
    /// Closure invoked with the container and the active overrides
    Factory(FactoryFn),
    /// Several implementations, injected one by one into a variadic parameter
    Many(Vec<Implementation>),
}

impl Implementation {
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Implementation::Value(share(value))
    }

    pub fn class<T: 'static>() -> Self {
        Implementation::Abstract(key_of_type::<T>())
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Implementation::Factory(Arc::new(factory))
    }

    pub fn many(items: impl IntoIterator<Item = Implementation>) -> Self {
        Implementation::Many(items.into_iter().collect())
    }
}

impl From<Key> for Implementation {
    fn from(key: Key) -> Self {
        Implementation::Abstract(key)
    }
}

impl From<AnyArc> for Implementation {
    fn from(value: AnyArc) -> Self {
        Implementation::Value(value)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Value(_) => f.write_str("Value"),
            Implementation::Abstract(key) => write!(f, "Abstract({})", key),
            Implementation::Factory(_) => f.write_str("Factory"),
            Implementation::Many(items) => f.debug_list().entries(items).finish(),
        }
    }
}

/// Fluent builder returned by [`Container::when`].
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{constructable, Container, Implementation, Parameter, Resolver};
/// use std::sync::Arc;
///
/// struct Filesystem(&'static str);
/// struct PhotoController {
///     disk: Arc<Filesystem>,
/// }
///
/// constructable::<PhotoController>("PhotoController")
///     .param(Parameter::inject("disk", "filesystem"))
///     .register(|args| Ok(PhotoController { disk: args.get::<Filesystem>(0)? }));
///
/// let container = Container::new();
/// container.instance("filesystem", Filesystem("local")).unwrap();
/// container
///     .when_type::<PhotoController>()
///     .needs("filesystem")
///     .give(Implementation::value(Filesystem("s3")))
///     .unwrap();
///
/// let controller = container.make_type::<PhotoController>().unwrap();
/// assert_eq!(controller.disk.0, "s3");
/// ```
pub struct ContextualBindingBuilder<'a> {
    container: &'a Container,
    concretes: Vec<Key>,
    need: Option<Key>,
}

impl<'a> ContextualBindingBuilder<'a> {
    pub(crate) fn new(container: &'a Container, concretes: Vec<Key>) -> Self {
        Self {
            container,
            concretes,
            need: None,
        }
    }

    /// The abstract, or primitive parameter name, being overridden.
    pub fn needs(&mut self, abstract_: impl Into<Key>) -> &mut Self {
        self.need = Some(abstract_.into());
        self
    }

    pub fn give(&self, implementation: impl Into<Implementation>) -> DiResult<()> {
        let need = self
            .need
            .as_ref()
            .ok_or(DiError::Usage("Please provide a need, before give!"))?;
        let implementation = implementation.into();
        for concrete in &self.concretes {
            self.container
                .add_contextual_binding(concrete, need, implementation.clone());
        }
        Ok(())
    }

    /// Gives the members of `tag`, resolved when the consumer is built.
    pub fn give_tagged(&self, tag: impl Into<String>) -> DiResult<()> {
        let tag = tag.into();
        self.give(Implementation::factory(move |container, _| {
            Ok(share(container.tagged(tag.as_str()).resolve_all()?))
        }))
    }

    /// Gives a value read from the `Config` bound under `"config"`.
    pub fn give_config(&self, key: impl Into<String>, default: ConfigValue) -> DiResult<()> {
        let key = key.into();
        self.give(Implementation::factory(move |container, _| {
            let config = container.make_as::<Config>("config")?;
            Ok(share(config.get_or(&key, default.clone())))
        }))
    }
}
