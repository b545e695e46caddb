//! Lifecycle callbacks fired around resolution.
//!
//! Four families exist: before-resolving, resolving and after-resolving,
//! each with a global bucket and per-abstract buckets, plus rebinding which
//! is per-abstract only. Per-abstract callbacks match a resolution when the
//! key is identical, when the resolved class extends a registered class, or
//! when the resolved class declares a registered string/symbol token.

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::container::Container;
use crate::key::Key;
use crate::parameters::{AnyArc, Parameters};
use crate::reflection::MetadataProvider;

/// Called before an abstract is resolved.
pub type BeforeResolvingFn = Arc<dyn Fn(&Key, &Parameters, &Container) + Send + Sync>;

/// Called with each freshly resolved instance.
pub type ResolvingFn = Arc<dyn Fn(&AnyArc, &Container) + Send + Sync>;

/// Called with the new instance after an already resolved abstract is rebound.
pub type ReboundFn = Arc<dyn Fn(&Container, &AnyArc) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Events {
    pub(crate) global_before: Vec<BeforeResolvingFn>,
    pub(crate) before: IndexMap<Key, Vec<BeforeResolvingFn>>,
    pub(crate) global_resolving: Vec<ResolvingFn>,
    pub(crate) resolving: IndexMap<Key, Vec<ResolvingFn>>,
    pub(crate) global_after: Vec<ResolvingFn>,
    pub(crate) after: IndexMap<Key, Vec<ResolvingFn>>,
    pub(crate) rebound: IndexMap<Key, Vec<ReboundFn>>,
}

impl Events {
    /// Before-resolving callbacks for `abstract_`, global ones first.
    pub(crate) fn before_for(
        &self,
        abstract_: &Key,
        metadata: &dyn MetadataProvider,
    ) -> Vec<BeforeResolvingFn> {
        let mut out = self.global_before.clone();
        for (registered, callbacks) in &self.before {
            let matched = registered == abstract_
                || (registered.is_type()
                    && abstract_.is_type()
                    && metadata.is_subclass_of(abstract_, registered))
                || (!registered.is_type()
                    && abstract_.is_type()
                    && metadata.declared_interfaces(abstract_).contains(registered));
            if matched {
                out.extend(callbacks.iter().cloned());
            }
        }
        out
    }

    /// Resolving then after-resolving callbacks for an instance, each
    /// family global first.
    pub(crate) fn resolving_for(
        &self,
        abstract_: &Key,
        instance: &AnyArc,
        metadata: &dyn MetadataProvider,
    ) -> Vec<ResolvingFn> {
        let runtime = runtime_class(instance);
        let mut out = self.global_resolving.clone();
        out.extend(matching(&self.resolving, abstract_, &runtime, metadata));
        out.extend(self.global_after.iter().cloned());
        out.extend(matching(&self.after, abstract_, &runtime, metadata));
        out
    }

    pub(crate) fn rebound_for(&self, abstract_: &Key) -> Vec<ReboundFn> {
        self.rebound.get(abstract_).cloned().unwrap_or_default()
    }
}

fn matching(
    buckets: &IndexMap<Key, Vec<ResolvingFn>>,
    abstract_: &Key,
    runtime: &Key,
    metadata: &dyn MetadataProvider,
) -> Vec<ResolvingFn> {
    let mut out = Vec::new();
    for (registered, callbacks) in buckets {
        let matched = registered == abstract_
            || (registered.is_type()
                && (registered == runtime || metadata.is_subclass_of(runtime, registered)))
            || (!registered.is_type() && metadata.declared_interfaces(runtime).contains(registered));
        if matched {
            out.extend(callbacks.iter().cloned());
        }
    }
    out
}

/// Class key of the value behind a type-erased instance.
pub(crate) fn runtime_class(instance: &AnyArc) -> Key {
    let value: &(dyn Any + Send + Sync) = &**instance;
    Key::Type(value.type_id(), "<instance>")
}
