//! Free functions callable through the container.

use std::fmt;
use std::sync::Arc;

use crate::error::DiResult;
use crate::parameters::{AnyArc, Arguments};
use crate::reflection::parameter::{place_all, Parameter};

type Body = Arc<dyn Fn(Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// A named function, optionally annotated with parameter metadata.
///
/// Only annotated functions can be invoked through `Container::call`.
///
/// ```rust
/// use ferrous_ioc::{annotate, share, Function, Parameter};
///
/// let plain = Function::new("greet", |args| Ok(share(args.len())));
/// assert!(plain.parameters().is_none());
///
/// let greet = annotate(plain, vec![Parameter::primitive("name").default("world")]);
/// assert_eq!(greet.parameters().map(|p| p.len()), Some(1));
/// assert_eq!(greet.parameters().unwrap()[0].class_name, "greet");
/// ```
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    parameters: Option<Arc<Vec<Parameter>>>,
    body: Body,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: None,
            body: Arc::new(body),
        }
    }

    /// Shorthand for `annotate(Function::new(name, body), parameters)`.
    pub fn annotated<F>(name: impl Into<Arc<str>>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        annotate(Self::new(name, body), parameters)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> Option<&[Parameter]> {
        self.parameters.as_deref().map(Vec::as_slice)
    }

    pub fn invoke(&self, arguments: Arguments) -> DiResult<AnyArc> {
        (self.body)(arguments)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("annotated", &self.parameters.is_some())
            .finish()
    }
}

/// Attaches parameter metadata to a function.
pub fn annotate(function: Function, parameters: Vec<Parameter>) -> Function {
    let parameters = place_all(parameters, &function.name);
    Function {
        parameters: Some(Arc::new(parameters)),
        ..function
    }
}
