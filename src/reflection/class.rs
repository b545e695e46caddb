//! Class definitions and the registration builder.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::parameters::{AnyArc, Arguments};
use crate::reflection::parameter::{place_all, Parameter};
use crate::reflection::Annotations;

type Constructor = Arc<dyn Fn(Arguments) -> DiResult<AnyArc> + Send + Sync>;
type MethodBody = Arc<dyn Fn(Option<&AnyArc>, Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// A method registered on a class.
#[derive(Clone)]
pub struct MethodDefinition {
    name: String,
    is_static: bool,
    parameters: Option<Vec<Parameter>>,
    body: MethodBody,
}

impl MethodDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Parameter metadata, `None` when the method was not made methodable.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        self.parameters.as_deref()
    }

    /// Runs the body. Instance methods need the receiver they were declared on.
    pub fn invoke(&self, receiver: Option<&AnyArc>, arguments: Arguments) -> DiResult<AnyArc> {
        (self.body)(receiver, arguments)
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Everything the container knows about a constructable class.
pub struct ClassDefinition {
    name: String,
    key: Key,
    parameters: Option<Vec<Parameter>>,
    interfaces: Vec<Key>,
    parent: Option<Key>,
    constructor: Constructor,
    methods: HashMap<(String, bool), MethodDefinition>,
}

impl ClassDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Constructor parameter metadata, `None` for a bare class.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        self.parameters.as_deref()
    }

    pub fn interfaces(&self) -> &[Key] {
        &self.interfaces
    }

    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_ref()
    }

    pub fn construct(&self, arguments: Arguments) -> DiResult<AnyArc> {
        (self.constructor)(arguments)
    }

    pub fn method(&self, name: &str, is_static: bool) -> Option<&MethodDefinition> {
        self.methods.get(&(name.to_string(), is_static))
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("interfaces", &self.interfaces)
            .field("parent", &self.parent)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Starts the registration of `T` as a constructable class.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{constructable, share, Container, Parameter, Resolver};
/// use std::sync::Arc;
///
/// struct Engine;
/// struct Car {
///     engine: Arc<Engine>,
/// }
///
/// constructable::<Engine>("Engine").register(|_| Ok(Engine));
/// constructable::<Car>("Car")
///     .param(Parameter::class::<Engine>("engine"))
///     .method("honk", |_car, _| Ok(share("beep")))
///     .register(|args| Ok(Car { engine: args.get::<Engine>(0)? }));
///
/// let container = Container::new();
/// let car = container.make_type::<Car>().unwrap();
/// let _engine: &Engine = &car.engine;
/// ```
pub fn constructable<T: Any + Send + Sync>(name: impl Into<String>) -> ClassBuilder<T> {
    ClassBuilder {
        name: name.into(),
        parameters: Some(Vec::new()),
        interfaces: Vec::new(),
        parent: None,
        methods: Vec::new(),
        _marker: PhantomData,
    }
}

/// Fluent registration of a [`ClassDefinition`].
pub struct ClassBuilder<T> {
    name: String,
    parameters: Option<Vec<Parameter>>,
    interfaces: Vec<Key>,
    parent: Option<Key>,
    methods: Vec<(String, bool, Option<Vec<Parameter>>, MethodBody)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.get_or_insert_with(Vec::new).push(parameter);
        self
    }

    pub fn params(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .extend(parameters);
        self
    }

    /// Registers the class without constructor metadata; building it fails.
    pub fn bare(mut self) -> Self {
        self.parameters = None;
        self
    }

    /// Tokens this class declares it implements.
    pub fn interfaces<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.interfaces.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn extends<P: 'static>(mut self) -> Self {
        self.parent = Some(key_of_type::<P>());
        self
    }

    /// Instance method without parameter metadata.
    pub fn method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T, Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.push_instance(name.into(), None, body)
    }

    /// Instance method callable through the container.
    pub fn methodable<F>(self, name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&T, Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.push_instance(name.into(), Some(parameters), body)
    }

    /// Static method without parameter metadata.
    pub fn static_method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let body: MethodBody = Arc::new(move |_: Option<&AnyArc>, args: Arguments| body(args));
        self.methods.push((name.into(), true, None, body));
        self
    }

    /// Static method callable through the container.
    pub fn static_methodable<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        body: F,
    ) -> Self
    where
        F: Fn(Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let body: MethodBody = Arc::new(move |_: Option<&AnyArc>, args: Arguments| body(args));
        self.methods.push((name.into(), true, Some(parameters), body));
        self
    }

    fn push_instance<F>(mut self, name: String, parameters: Option<Vec<Parameter>>, body: F) -> Self
    where
        F: Fn(&T, Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let body: MethodBody = Arc::new(move |receiver: Option<&AnyArc>, args: Arguments| {
            let this = receiver
                .and_then(|r| r.downcast_ref::<T>())
                .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
            body(this, args)
        });
        self.methods.push((name, false, parameters, body));
        self
    }

    /// Stores the definition in the process-wide table.
    pub fn register<F>(self, constructor: F) -> Arc<ClassDefinition>
    where
        F: Fn(Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_in(&Annotations::global(), constructor)
    }

    pub fn register_in<F>(self, annotations: &Annotations, constructor: F) -> Arc<ClassDefinition>
    where
        F: Fn(Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        let name = self.name;
        let methods = self
            .methods
            .into_iter()
            .map(|(method, is_static, parameters, body)| {
                let definition = MethodDefinition {
                    name: method.clone(),
                    is_static,
                    parameters: parameters.map(|p| place_all(p, &name)),
                    body,
                };
                ((method, is_static), definition)
            })
            .collect();

        let definition = Arc::new(ClassDefinition {
            key: key_of_type::<T>(),
            parameters: self.parameters.map(|p| place_all(p, &name)),
            interfaces: self.interfaces,
            parent: self.parent,
            constructor: Arc::new(move |args: Arguments| constructor(args).map(|v| Arc::new(v) as AnyArc)),
            methods,
            name,
        });
        annotations.insert(definition.clone());
        definition
    }
}
