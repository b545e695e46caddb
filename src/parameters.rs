//! Parameter overrides and resolved argument lists.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{DiError, DiResult};

/// Type-erased shared value produced by the container.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A resolved list of values.
///
/// When a value that downcasts to `Sequence` is resolved for a variadic
/// parameter, its elements are spliced into the argument list.
pub type Sequence = Vec<AnyArc>;

/// Wraps a value for storage in the container.
///
/// ```rust
/// use ferrous_ioc::share;
///
/// let value = share(42u32);
/// assert_eq!(value.downcast_ref::<u32>(), Some(&42));
/// ```
#[inline]
pub fn share<T: Any + Send + Sync>(value: T) -> AnyArc {
    Arc::new(value)
}

/// Downcasts a resolved value, reporting the expected type on failure.
pub fn downcast<T: Any + Send + Sync>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// One frame of parameter overrides handed to `make_with`/`call`.
///
/// A named frame matches constructor parameters by name. A positional frame
/// is consumed front to back by parameters that have no class type, and is
/// passed verbatim to closure concretes.
///
/// ```rust
/// use ferrous_ioc::Parameters;
///
/// let named = Parameters::named().with("default_value", "alberto");
/// assert!(named.get("default_value").is_some());
///
/// let positional = Parameters::positional().push(1u32).push(2u32);
/// assert_eq!(positional.len(), 2);
/// assert!(Parameters::default().is_empty());
/// ```
#[derive(Clone)]
pub enum Parameters {
    Named(IndexMap<String, AnyArc>),
    Positional(VecDeque<AnyArc>),
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::Named(IndexMap::new())
    }
}

impl std::fmt::Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameters::Named(map) => f.debug_set().entries(map.keys()).finish(),
            Parameters::Positional(items) => write!(f, "[{} positional]", items.len()),
        }
    }
}

impl Parameters {
    pub fn named() -> Self {
        Parameters::Named(IndexMap::new())
    }

    pub fn positional() -> Self {
        Parameters::Positional(VecDeque::new())
    }

    /// Adds a named override. A positional frame is converted to a named one.
    pub fn with<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.with_any(name, share(value))
    }

    pub fn with_any(self, name: impl Into<String>, value: AnyArc) -> Self {
        let mut map = match self {
            Parameters::Named(map) => map,
            Parameters::Positional(_) => IndexMap::new(),
        };
        map.insert(name.into(), value);
        Parameters::Named(map)
    }

    /// Appends a positional override. A named frame is converted to a positional one.
    pub fn push<T: Any + Send + Sync>(self, value: T) -> Self {
        self.push_any(share(value))
    }

    pub fn push_any(self, value: AnyArc) -> Self {
        let mut items = match self {
            Parameters::Positional(items) => items,
            Parameters::Named(_) => VecDeque::new(),
        };
        items.push_back(value);
        Parameters::Positional(items)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            Parameters::Named(map) => map.len(),
            Parameters::Positional(items) => items.len(),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Parameters::Positional(_))
    }

    /// Named lookup; always `None` on a positional frame.
    pub fn get(&self, name: &str) -> Option<&AnyArc> {
        match self {
            Parameters::Named(map) => map.get(name),
            Parameters::Positional(_) => None,
        }
    }

    /// Typed named lookup.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).cloned().and_then(|v| v.downcast::<T>().ok())
    }

    pub(crate) fn shift(&mut self) -> Option<AnyArc> {
        match self {
            Parameters::Positional(items) => items.pop_front(),
            Parameters::Named(_) => None,
        }
    }

    /// Positional values in order; empty for a named frame.
    pub fn values(&self) -> Vec<AnyArc> {
        match self {
            Parameters::Positional(items) => items.iter().cloned().collect(),
            Parameters::Named(_) => Vec::new(),
        }
    }
}

impl From<Vec<AnyArc>> for Parameters {
    fn from(items: Vec<AnyArc>) -> Self {
        Parameters::Positional(items.into())
    }
}

impl From<IndexMap<String, AnyArc>> for Parameters {
    fn from(map: IndexMap<String, AnyArc>) -> Self {
        Parameters::Named(map)
    }
}

/// Arguments resolved for a constructor or method body.
///
/// Each slot is either a value or `None`, the latter standing for a
/// parameter whose declared default is null.
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Option<AnyArc>>,
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Arguments({})", self.values.len())
    }
}

impl Arguments {
    pub fn new(values: Vec<Option<AnyArc>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required argument at `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        match self.values.get(index).cloned().flatten() {
            Some(value) => downcast::<T>(value),
            None => Err(DiError::TypeMismatch(std::any::type_name::<T>())),
        }
    }

    /// Argument at `index`, `None` when absent, null or of another type.
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.values
            .get(index)
            .cloned()
            .flatten()
            .and_then(|v| v.downcast::<T>().ok())
    }

    /// Clones the argument at `index` out of its `Arc`.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, index: usize) -> DiResult<T> {
        self.get::<T>(index).map(|v| (*v).clone())
    }

    /// Every argument from `from` onwards, typically a spliced variadic tail.
    pub fn rest<T: Any + Send + Sync>(&self, from: usize) -> DiResult<Vec<Arc<T>>> {
        (from..self.values.len()).map(|i| self.get::<T>(i)).collect()
    }

    /// Raw slot at `index`.
    pub fn raw(&self, index: usize) -> Option<&AnyArc> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    pub fn into_values(self) -> Vec<Option<AnyArc>> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converting_frames_drops_previous_shape() {
        let p = Parameters::named().with("a", 1u8).push(2u8);
        assert!(p.is_positional());
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn shift_consumes_front() {
        let mut p = Parameters::positional().push("a").push("b");
        let first = p.shift().unwrap();
        assert_eq!(first.downcast_ref::<&str>(), Some(&"a"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn arguments_rest_collects_tail() {
        let args = Arguments::new(vec![Some(share(1u8)), Some(share(2u8)), Some(share(3u8))]);
        let tail = args.rest::<u8>(1).unwrap();
        assert_eq!(tail.iter().map(|v| **v).collect::<Vec<_>>(), vec![2, 3]);
        assert!(args.get::<String>(0).is_err());
    }
}
