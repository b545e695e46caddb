//! Parameter descriptors.

use std::any::Any;
use std::fmt;

use crate::key::{key_of_type, Key};
use crate::parameters::{share, AnyArc};

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// No class type: resolved from overrides, contextual primitives or defaults
    Primitive,
    /// Resolved through the container under this key
    Class(Key),
    /// Type information degraded by a reference cycle
    Unresolved,
}

/// Metadata for one constructor, method or function parameter.
///
/// `index` and `class_name` are filled in when the owning class or function
/// is registered.
///
/// ```rust
/// use ferrous_ioc::{Parameter, ParameterType};
///
/// struct Mailer;
///
/// let first = Parameter::primitive("first");
/// let mailer = Parameter::class::<Mailer>("mailer").nullable();
/// let rest = Parameter::primitive("rest").variadic();
/// let greeting = Parameter::primitive("greeting").default("hello");
///
/// assert_eq!(first.kind, ParameterType::Primitive);
/// assert!(mailer.allows_null);
/// assert!(rest.is_variadic);
/// assert!(greeting.has_default);
/// ```
#[derive(Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterType,
    pub is_variadic: bool,
    pub allows_null: bool,
    pub has_default: bool,
    /// Declared default; `None` with `has_default` means a null default
    pub default_value: Option<AnyArc>,
    pub index: usize,
    pub class_name: String,
}

impl Parameter {
    fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            kind,
            is_variadic: false,
            allows_null: false,
            has_default: false,
            default_value: None,
            index: 0,
            class_name: String::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Primitive)
    }

    /// Parameter typed as the class `T`.
    pub fn class<T: 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Class(key_of_type::<T>()))
    }

    /// Parameter injected under an arbitrary key, usually a string or symbol token.
    pub fn inject(name: impl Into<String>, key: impl Into<Key>) -> Self {
        Self::new(name, ParameterType::Class(key.into()))
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Unresolved)
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allows_null = true;
        self
    }

    pub fn default<T: Any + Send + Sync>(self, value: T) -> Self {
        self.default_any(share(value))
    }

    pub fn default_any(mut self, value: AnyArc) -> Self {
        self.has_default = true;
        self.default_value = Some(value);
        self
    }

    pub fn default_null(mut self) -> Self {
        self.has_default = true;
        self.allows_null = true;
        self.default_value = None;
        self
    }

    /// Key resolved for a class-typed parameter.
    pub fn class_key(&self) -> Option<&Key> {
        match &self.kind {
            ParameterType::Class(key) => Some(key),
            _ => None,
        }
    }

    pub(crate) fn placed(mut self, index: usize, class_name: &str) -> Self {
        self.index = index;
        self.class_name = class_name.to_string();
        self
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("index", &self.index)
            .field("is_variadic", &self.is_variadic)
            .field("has_default", &self.has_default)
            .finish()
    }
}

/// Numbers parameters and stamps their declaring class or function.
pub(crate) fn place_all(parameters: Vec<Parameter>, class_name: &str) -> Vec<Parameter> {
    parameters
        .into_iter()
        .enumerate()
        .map(|(index, p)| p.placed(index, class_name))
        .collect()
}
