//! Lazily resolved tag members.

use super::Container;
use crate::error::DiResult;
use crate::key::Key;
use crate::parameters::{AnyArc, Sequence};

/// Abstracts sharing a tag, resolved on every iteration.
///
/// Nothing is cached, so bindings changed between two passes are picked up.
///
/// ```rust
/// use ferrous_ioc::{share, Container};
///
/// let container = Container::new();
/// container.bind("report.cpu", |_, _| Ok(share("cpu"))).unwrap();
/// container.bind("report.memory", |_, _| Ok(share("memory"))).unwrap();
/// container.tag(["report.cpu", "report.memory"], ["reports"]);
///
/// let reports = container.tagged("reports");
/// assert_eq!(reports.len(), 2);
/// let names: Vec<&str> = reports
///     .iter()
///     .map(|r| *r.unwrap().downcast_ref::<&str>().unwrap())
///     .collect();
/// assert_eq!(names, vec!["cpu", "memory"]);
/// ```
#[derive(Clone, Debug)]
pub struct Tagged {
    container: Container,
    keys: Vec<Key>,
}

impl Tagged {
    pub(crate) fn new(container: Container, keys: Vec<Key>) -> Self {
        Self { container, keys }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolves members one at a time.
    pub fn iter(&self) -> impl Iterator<Item = DiResult<AnyArc>> + '_ {
        self.keys.iter().map(move |key| self.container.make(key.clone()))
    }

    /// Resolves every member, failing on the first error.
    pub fn resolve_all(&self) -> DiResult<Sequence> {
        self.iter().collect()
    }
}
