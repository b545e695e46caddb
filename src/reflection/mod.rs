//! Parameter metadata for classes and functions.
//!
//! Classes are registered once through [`constructable`], which stores a
//! [`ClassDefinition`] in an [`Annotations`] table keyed by `TypeId`. The
//! container reads that table through the [`MetadataProvider`] trait to
//! decide whether a class can be built, what its constructor needs, and
//! which interface tokens and parent classes it declares.

mod class;
mod function;
mod parameter;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::key::Key;

pub use class::{constructable, ClassBuilder, ClassDefinition, MethodDefinition};
pub use function::{annotate, Function};
pub use parameter::{Parameter, ParameterType};

static GLOBAL: Lazy<Arc<Annotations>> = Lazy::new(|| Arc::new(Annotations::new()));

/// Side table of class definitions.
#[derive(Default)]
pub struct Annotations {
    classes: RwLock<HashMap<TypeId, Arc<ClassDefinition>>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used by [`ClassBuilder::register`] and by containers
    /// created without explicit options.
    pub fn global() -> Arc<Annotations> {
        GLOBAL.clone()
    }

    /// Adds or replaces a definition.
    pub fn insert(&self, definition: Arc<ClassDefinition>) {
        if let Some(id) = definition.key().type_id() {
            self.classes.write().insert(id, definition);
        }
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<ClassDefinition>> {
        self.classes.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl std::fmt::Debug for Annotations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotations")
            .field("classes", &self.len())
            .finish()
    }
}

/// Read access to parameter metadata, as consumed by the container.
pub trait MetadataProvider: Send + Sync {
    /// Definition registered for a class key.
    fn class(&self, key: &Key) -> Option<Arc<ClassDefinition>>;

    fn has_parameter_metadata(&self, key: &Key) -> bool {
        self.class(key)
            .map_or(false, |class| class.parameters().is_some())
    }

    fn parameters(&self, key: &Key) -> Option<Vec<Parameter>> {
        self.class(key)
            .and_then(|class| class.parameters().map(<[Parameter]>::to_vec))
    }

    fn declared_interfaces(&self, key: &Key) -> Vec<Key> {
        self.class(key)
            .map(|class| class.interfaces().to_vec())
            .unwrap_or_default()
    }

    /// Whether `child` extends `parent`, directly or through its ancestors.
    fn is_subclass_of(&self, child: &Key, parent: &Key) -> bool {
        let mut current = self.class(child).and_then(|c| c.parent().cloned());
        // Parent chains are acyclic by construction, the bound guards misuse.
        let mut hops = 0;
        while let Some(key) = current {
            if &key == parent {
                return true;
            }
            hops += 1;
            if hops > 64 {
                return false;
            }
            current = self.class(&key).and_then(|c| c.parent().cloned());
        }
        false
    }
}

impl MetadataProvider for Annotations {
    fn class(&self, key: &Key) -> Option<Arc<ClassDefinition>> {
        key.type_id().and_then(|id| self.get(id))
    }
}
