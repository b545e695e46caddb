//! Resolver traits for typed resolution.

use std::any::Any;
use std::sync::Arc;

use crate::container::{Callable, Container};
use crate::error::DiResult;
use crate::key::{key_of_type, Key};
use crate::parameters::{downcast, AnyArc, Parameters};

/// Object-safe resolution primitives.
///
/// Most users should use the [`Resolver`] trait instead, which layers typed
/// helpers on top of these methods.
pub trait ResolverCore: Send + Sync {
    /// Resolves an abstract with the given overrides.
    fn resolve_any(&self, key: &Key, parameters: Parameters) -> DiResult<AnyArc>;

    /// Invokes a callable with injected parameters.
    fn call_any(&self, callable: Callable, parameters: Parameters) -> DiResult<AnyArc>;
}

/// Typed resolution helpers.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{share, Container, Resolver};
///
/// let container = Container::new();
/// container.singleton("answer", |_, _| Ok(share(42usize))).unwrap();
///
/// let answer = container.make_as::<usize>("answer").unwrap();
/// assert_eq!(*answer, 42);
/// assert!(container.make_as::<String>("answer").is_err());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `key` and downcasts the instance to `T`.
    fn make_as<T: Any + Send + Sync>(&self, key: impl Into<Key>) -> DiResult<Arc<T>> {
        downcast(self.resolve_any(&key.into(), Parameters::default())?)
    }

    fn make_with_as<T: Any + Send + Sync>(
        &self,
        key: impl Into<Key>,
        parameters: Parameters,
    ) -> DiResult<Arc<T>> {
        downcast(self.resolve_any(&key.into(), parameters)?)
    }

    /// Resolves the class `T` itself.
    fn make_type<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.make_as::<T>(key_of_type::<T>())
    }

    /// Calls and downcasts the result to `T`.
    fn call_as<T: Any + Send + Sync>(
        &self,
        callable: impl Into<Callable>,
        parameters: Parameters,
    ) -> DiResult<Arc<T>> {
        downcast(self.call_any(callable.into(), parameters)?)
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key, parameters: Parameters) -> DiResult<AnyArc> {
        self.make_with(key.clone(), parameters)
    }

    fn call_any(&self, callable: Callable, parameters: Parameters) -> DiResult<AnyArc> {
        self.call(callable, parameters)
    }
}

impl Resolver for Container {}
