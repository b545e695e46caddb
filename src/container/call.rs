//! Calling functions and methods with injected dependencies.

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use super::Container;
use crate::error::{DiError, DiResult};
use crate::events::runtime_class;
use crate::internal::frames;
use crate::key::{key_of_type, Key};
use crate::parameters::{AnyArc, Arguments, Parameters, Sequence};
use crate::reflection::{Function, Parameter, ParameterType};
use crate::registration::{MethodBindingFn, Receiver};

/// A method on a class, addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: Key,
    pub method: String,
    pub is_static: bool,
}

impl MethodRef {
    pub fn new(class: impl Into<Key>, method: impl Into<String>, is_static: bool) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            is_static,
        }
    }

    /// Instance method of `T`.
    pub fn on<T: 'static>(method: impl Into<String>) -> Self {
        Self::new(key_of_type::<T>(), method, false)
    }

    /// Static method of `T`.
    pub fn on_static<T: 'static>(method: impl Into<String>) -> Self {
        Self::new(key_of_type::<T>(), method, true)
    }
}

/// Something [`Container::call`] can invoke.
#[derive(Clone)]
pub enum Callable {
    /// Annotated free function
    Function(Function),
    /// Method on a class; instance methods are called on `make(class)`
    Method(MethodRef),
    /// Instance method on an existing object of class `class`
    Bound {
        instance: AnyArc,
        class: Key,
        method: String,
    },
}

impl Callable {
    /// Method on a typed instance; errors name `T`.
    pub fn bound<T: Any + Send + Sync>(instance: Arc<T>, method: impl Into<String>) -> Self {
        Callable::Bound {
            instance,
            class: key_of_type::<T>(),
            method: method.into(),
        }
    }

    /// Method on a type-erased instance, its class taken from the value itself.
    pub fn bound_any(instance: AnyArc, method: impl Into<String>) -> Self {
        Callable::Bound {
            class: runtime_class(&instance),
            instance,
            method: method.into(),
        }
    }
}

impl From<Function> for Callable {
    fn from(function: Function) -> Self {
        Callable::Function(function)
    }
}

impl From<MethodRef> for Callable {
    fn from(method: MethodRef) -> Self {
        Callable::Method(method)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "Function({})", function.name()),
            Callable::Method(method) => write!(f, "Method({:?})", method),
            Callable::Bound { method, .. } => write!(f, "Bound({})", method),
        }
    }
}

impl Container {
    /// Invokes a function or method, resolving its parameters.
    ///
    /// Positional overrides are appended after the resolved arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_ioc::{share, Container, Function, Parameter, Parameters, Resolver};
    ///
    /// struct Mailer;
    ///
    /// let container = Container::new();
    /// container.instance("mailer", Mailer).unwrap();
    ///
    /// let send = Function::annotated(
    ///     "send",
    ///     vec![Parameter::inject("mailer", "mailer"), Parameter::primitive("to")],
    ///     |args| {
    ///         args.get::<Mailer>(0)?;
    ///         Ok(share(format!("sent to {}", args.get::<&str>(1)?)))
    ///     },
    /// );
    ///
    /// let result = container
    ///     .call_as::<String>(send, Parameters::named().with("to", "taylor"))
    ///     .unwrap();
    /// assert_eq!(*result, "sent to taylor");
    /// ```
    pub fn call(&self, callable: impl Into<Callable>, parameters: Parameters) -> DiResult<AnyArc> {
        match callable.into() {
            Callable::Function(function) => {
                let declared = function
                    .parameters()
                    .ok_or_else(|| DiError::NotAnnotated(function.name().to_string()))?;
                trace!(function = function.name(), "calling function");
                let arguments = self.method_dependencies(declared, &parameters)?;
                function.invoke(arguments)
            }
            Callable::Method(target) => {
                let receiver = if target.is_static {
                    Receiver::Static(target.class.clone())
                } else {
                    Receiver::Instance(self.make(target.class.clone())?)
                };
                self.call_bound_method(target, receiver, parameters)
            }
            Callable::Bound {
                instance,
                class,
                method,
            } => {
                let target = MethodRef::new(class, method, false);
                self.call_bound_method(target, Receiver::Instance(instance), parameters)
            }
        }
    }

    /// Defers [`call`](Self::call) until the returned closure runs.
    pub fn wrap(
        &self,
        callable: impl Into<Callable>,
        parameters: Parameters,
    ) -> impl Fn() -> DiResult<AnyArc> + Send + Sync + 'static {
        let container = self.clone();
        let callable = callable.into();
        move || container.call(callable.clone(), parameters.clone())
    }

    /// Overrides how `call` runs a method.
    pub fn bind_method<F>(&self, method: MethodRef, callback: F)
    where
        F: Fn(&Receiver, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let callback: MethodBindingFn = Arc::new(callback);
        self.registry()
            .method_bindings
            .insert((method.class, method.method, method.is_static), callback);
    }

    pub fn has_method_binding(&self, method: &MethodRef) -> bool {
        self.registry().method_bindings.contains_key(&method_slot(method))
    }

    /// Runs the method binding registered for `method`.
    pub fn call_method_binding(&self, method: &MethodRef, receiver: &Receiver) -> DiResult<AnyArc> {
        let callback = self
            .registry()
            .method_bindings
            .get(&method_slot(method))
            .cloned()
            .ok_or_else(|| DiError::NotAFunction(method_display(self, method)))?;
        callback(receiver, self)
    }

    fn call_bound_method(
        &self,
        target: MethodRef,
        receiver: Receiver,
        parameters: Parameters,
    ) -> DiResult<AnyArc> {
        if self.has_method_binding(&target) {
            return self.call_method_binding(&target, &receiver);
        }

        let class = self.metadata().class(&target.class);
        let method = class
            .as_ref()
            .and_then(|c| c.method(&target.method, target.is_static))
            .ok_or_else(|| DiError::NotAFunction(method_display(self, &target)))?;
        let declared = method
            .parameters()
            .ok_or_else(|| DiError::NotMethodable(method_display(self, &target)))?;

        trace!(method = %method_display(self, &target), "calling method");
        let arguments = self.method_dependencies(declared, &parameters)?;
        method.invoke(receiver.instance(), arguments)
    }

    fn method_dependencies(&self, declared: &[Parameter], parameters: &Parameters) -> DiResult<Arguments> {
        let mut results: Vec<Option<AnyArc>> = Vec::with_capacity(declared.len());

        for parameter in declared {
            match self.call_parameter(parameter, parameters)? {
                Some(value) if parameter.is_variadic => match value.downcast_ref::<Sequence>() {
                    Some(items) => results.extend(items.iter().cloned().map(Some)),
                    None => results.push(Some(value)),
                },
                Some(value) => results.push(Some(value)),
                None => results.push(parameter.default_value.clone()),
            }
        }

        results.extend(parameters.values().into_iter().map(Some));
        Ok(Arguments::new(results))
    }

    /// Value for one call parameter; `None` selects the declared default.
    ///
    /// Unlike constructor resolution, class-typed parameters are always
    /// resolved through the container and positional overrides are never
    /// consumed here.
    fn call_parameter(&self, parameter: &Parameter, parameters: &Parameters) -> DiResult<Option<AnyArc>> {
        if let Some(value) = parameters.get(&parameter.name) {
            return Ok(Some(value.clone()));
        }
        match &parameter.kind {
            ParameterType::Unresolved => Err(DiError::Circular {
                index: parameter.index,
                name: parameter.name.clone(),
                class: parameter.class_name.clone(),
                path: frames::build_stack(self.id()),
            }),
            ParameterType::Class(class) => self.make(class.clone()).map(Some),
            ParameterType::Primitive if parameter.has_default => Ok(None),
            ParameterType::Primitive => Err(DiError::Unresolvable {
                index: parameter.index,
                name: parameter.name.clone(),
                class: parameter.class_name.clone(),
            }),
        }
    }
}

fn method_slot(method: &MethodRef) -> (Key, String, bool) {
    (method.class.clone(), method.method.clone(), method.is_static)
}

/// `Class.prototype.method` for instance methods, `Class.method` for static ones.
fn method_display(container: &Container, method: &MethodRef) -> String {
    let class = container
        .metadata()
        .class(&method.class)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| method.class.display_name());
    if method.is_static {
        format!("{}.{}", class, method.method)
    } else {
        format!("{}.prototype.{}", class, method.method)
    }
}
