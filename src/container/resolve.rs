//! Resolution and building.

use tracing::{trace, warn};

use super::Container;
use crate::contextual::Implementation;
use crate::error::{DiError, DiResult};
use crate::internal::frames;
use crate::internal::{BuildGuard, WithGuard};
use crate::key::Key;
use crate::parameters::{share, AnyArc, Arguments, Parameters, Sequence};
use crate::reflection::{Parameter, ParameterType};

/// Outcome of resolving one constructor parameter.
enum Dependency {
    /// Taken verbatim from an override
    Override(AnyArc),
    /// Resolved value, spliced when the parameter is variadic and the value is a `Sequence`
    Resolved(AnyArc),
    /// Substitute the declared default
    UseDefault,
    /// Values for a variadic parameter
    Many(Sequence),
}

impl Container {
    /// Resolves an abstract.
    pub fn make(&self, abstract_: impl Into<Key>) -> DiResult<AnyArc> {
        self.resolve(abstract_.into(), Parameters::default(), true)
    }

    /// Resolves an abstract with parameter overrides for its direct build.
    ///
    /// Overrides always bypass the instance cache and are never cached.
    pub fn make_with(&self, abstract_: impl Into<Key>, parameters: Parameters) -> DiResult<AnyArc> {
        self.resolve(abstract_.into(), parameters, true)
    }

    /// Same as [`make`](Self::make).
    pub fn get(&self, abstract_: impl Into<Key>) -> DiResult<AnyArc> {
        self.make(abstract_)
    }

    /// Closure resolving `abstract_` each time it is called.
    pub fn factory(
        &self,
        abstract_: impl Into<Key>,
    ) -> impl Fn() -> DiResult<AnyArc> + Send + Sync + 'static {
        let container = self.clone();
        let abstract_ = abstract_.into();
        move || container.make(abstract_.clone())
    }

    pub(crate) fn resolve(
        &self,
        abstract_: Key,
        parameters: Parameters,
        raise_events: bool,
    ) -> DiResult<AnyArc> {
        let abstract_ = self.get_alias(abstract_);
        trace!(abstract_ = %abstract_, depth = frames::depth(self.id()), "resolving");

        if raise_events {
            self.fire_before_resolving(&abstract_, &parameters);
        }

        let contextual = self.contextual_concrete(&abstract_);
        let needs_contextual_build = !parameters.is_empty() || contextual.is_some();

        if !needs_contextual_build {
            let cached = self.registry().instances.get(&abstract_).cloned();
            if let Some(instance) = cached {
                return Ok(instance);
            }
        }

        let _with = WithGuard::push(self.id(), parameters, self.max_depth())?;

        let mut object = match contextual {
            Some(implementation) => self.resolve_contextual(&abstract_, implementation)?,
            None => {
                let factory = self
                    .registry()
                    .bindings
                    .get(&abstract_)
                    .map(|binding| binding.concrete.clone());
                match factory {
                    Some(factory) => factory(self, &frames::last_parameters(self.id()))?,
                    None => self.build(abstract_.clone())?,
                }
            }
        };

        let extenders = self
            .registry()
            .extenders
            .get(&abstract_)
            .cloned()
            .unwrap_or_default();
        for extender in extenders {
            object = extender(object, self)?;
        }

        {
            let mut registry = self.registry();
            if registry.is_shared(&abstract_) && !needs_contextual_build {
                registry.instances.insert(abstract_.clone(), object.clone());
            }
        }

        if raise_events {
            self.fire_resolving(&abstract_, &object);
        }

        self.registry().resolved.insert(abstract_);
        Ok(object)
    }

    /// Instantiates a class from its constructor metadata.
    ///
    /// String and symbol abstracts reaching this point have no binding and
    /// are reported as not instantiable.
    pub fn build(&self, concrete: impl Into<Key>) -> DiResult<AnyArc> {
        let concrete = concrete.into();
        let definition = match self.metadata().class(&concrete) {
            Some(definition) if definition.parameters().is_some() => definition,
            Some(definition) => return Err(DiError::NotConstructable(definition.name().to_string())),
            None if concrete.is_type() => return Err(DiError::NotConstructable(concrete.display_name())),
            None => return Err(self.not_instantiable(&concrete)),
        };

        let guard = BuildGuard::push(self.id(), &concrete)?;
        trace!(class = definition.name(), "building");

        let parameters = definition.parameters().unwrap_or_default();
        let arguments = if parameters.is_empty() {
            Arguments::default()
        } else {
            self.resolve_dependencies(parameters)?
        };
        drop(guard);

        definition.construct(arguments)
    }

    fn not_instantiable(&self, concrete: &Key) -> DiError {
        DiError::NotInstantiable {
            target: concrete.display_name(),
            building: frames::build_stack(self.id()),
        }
    }

    /// Contextual implementation for `abstract_` given the class being built.
    pub(crate) fn contextual_concrete(&self, abstract_: &Key) -> Option<Implementation> {
        let consumer = frames::current_build(self.id())?;
        self.registry().contextual_for(&consumer, abstract_)
    }

    fn resolve_contextual(&self, abstract_: &Key, implementation: Implementation) -> DiResult<AnyArc> {
        match implementation {
            Implementation::Abstract(concrete) if &concrete == abstract_ => self.build(concrete),
            Implementation::Many(items) => {
                warn!(abstract_ = %abstract_, "contextual list given to a non-variadic dependency");
                self.resolve_items(items).map(share)
            }
            other => self.resolve_item(other),
        }
    }

    /// Produces the value of one contextual implementation.
    fn resolve_item(&self, implementation: Implementation) -> DiResult<AnyArc> {
        match implementation {
            Implementation::Value(value) => Ok(value),
            Implementation::Abstract(key) => self.make(key),
            Implementation::Factory(factory) => factory(self, &frames::last_parameters(self.id())),
            Implementation::Many(items) => self.resolve_items(items).map(share),
        }
    }

    fn resolve_items(&self, items: Vec<Implementation>) -> DiResult<Sequence> {
        items.into_iter().map(|item| self.resolve_item(item)).collect()
    }

    fn resolve_dependencies(&self, parameters: &[Parameter]) -> DiResult<Arguments> {
        let mut results: Vec<Option<AnyArc>> = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let dependency = self
                .resolve_dependency(parameter)
                .map_err(|e| attribute_cycle(e, parameter))?;

            match dependency {
                Dependency::Override(value) => results.push(Some(value)),
                Dependency::Resolved(value) if parameter.is_variadic => {
                    match value.downcast_ref::<Sequence>() {
                        Some(items) => results.extend(items.iter().cloned().map(Some)),
                        None => results.push(Some(value)),
                    }
                }
                Dependency::Resolved(value) => results.push(Some(value)),
                Dependency::UseDefault => results.push(parameter.default_value.clone()),
                Dependency::Many(items) if parameter.is_variadic => {
                    results.extend(items.into_iter().map(Some))
                }
                Dependency::Many(items) => results.push(Some(share(items))),
            }
        }

        Ok(Arguments::new(results))
    }

    fn resolve_dependency(&self, parameter: &Parameter) -> DiResult<Dependency> {
        if let Some(value) = frames::named_override(self.id(), &parameter.name) {
            return Ok(Dependency::Override(value));
        }

        match &parameter.kind {
            ParameterType::Unresolved => Err(self.circular(parameter)),
            ParameterType::Primitive => match frames::shift_positional(self.id()) {
                Some(value) => Ok(Dependency::Override(value)),
                None => self.resolve_primitive(parameter),
            },
            ParameterType::Class(class) => self.resolve_class(parameter, class),
        }
    }

    fn resolve_primitive(&self, parameter: &Parameter) -> DiResult<Dependency> {
        if let Some(implementation) = self.contextual_concrete(&Key::from(parameter.name.as_str())) {
            return self.resolve_item(implementation).map(Dependency::Resolved);
        }
        if parameter.has_default {
            return Ok(Dependency::UseDefault);
        }
        if parameter.is_variadic {
            return Ok(Dependency::Many(Vec::new()));
        }
        Err(unresolvable(parameter))
    }

    fn resolve_class(&self, parameter: &Parameter, class: &Key) -> DiResult<Dependency> {
        let result = if parameter.is_variadic {
            self.resolve_variadic_class(class)
        } else {
            self.make(class.clone()).map(Dependency::Resolved)
        };

        match result {
            Err(e) if e.is_circular() || matches!(e, DiError::DepthExceeded(_)) => Err(e),
            Err(e) if parameter.has_default || parameter.is_variadic => {
                trace!(parameter = %parameter.name, error = %e, "falling back");
                if parameter.has_default {
                    Ok(Dependency::UseDefault)
                } else {
                    Ok(Dependency::Many(Vec::new()))
                }
            }
            other => other,
        }
    }

    fn resolve_variadic_class(&self, class: &Key) -> DiResult<Dependency> {
        let abstract_ = self.get_alias(class);
        match self.contextual_concrete(&abstract_) {
            Some(Implementation::Many(items)) => self.resolve_items(items).map(Dependency::Many),
            _ => self.make(class.clone()).map(Dependency::Resolved),
        }
    }

    fn circular(&self, parameter: &Parameter) -> DiError {
        DiError::Circular {
            index: parameter.index,
            name: parameter.name.clone(),
            class: parameter.class_name.clone(),
            path: frames::build_stack(self.id()),
        }
    }

    fn fire_before_resolving(&self, abstract_: &Key, parameters: &Parameters) {
        let callbacks = self.registry().events.before_for(abstract_, self.metadata());
        for callback in callbacks {
            callback(abstract_, parameters, self);
        }
    }

    fn fire_resolving(&self, abstract_: &Key, object: &AnyArc) {
        let callbacks = self
            .registry()
            .events
            .resolving_for(abstract_, object, self.metadata());
        for callback in callbacks {
            callback(object, self);
        }
    }
}

fn unresolvable(parameter: &Parameter) -> DiError {
    DiError::Unresolvable {
        index: parameter.index,
        name: parameter.name.clone(),
        class: parameter.class_name.clone(),
    }
}

/// Attributes a cycle detected deeper down to the parameter that entered it.
fn attribute_cycle(error: DiError, parameter: &Parameter) -> DiError {
    match error {
        DiError::Circular { name, path, .. } if name.is_empty() => DiError::Circular {
            index: parameter.index,
            name: parameter.name.clone(),
            class: parameter.class_name.clone(),
            path,
        },
        other => other,
    }
}
