//! Error types for the inversion-of-control container.

use thiserror::Error;

/// Container errors
///
/// Every failure raised by registration, resolution or call injection.
/// Resolution is all-or-nothing: an error surfaces to the caller of
/// `make`/`build`/`call` after the container has unwound its own build
/// and parameter stacks.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError};
///
/// let container = Container::new();
/// match container.make("Claudio") {
///     Err(DiError::NotInstantiable { target, building }) => {
///         assert_eq!(target, "Claudio");
///         assert!(building.is_empty());
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_ioc::DiError;
///
/// let err = DiError::Unresolvable {
///     index: 0,
///     name: "first".into(),
///     class: "MixedPrimitive".into(),
/// };
/// assert_eq!(
///     err.to_string(),
///     "Unresolvable dependency resolving [[Parameter #0 [ <required> first ]] in class MixedPrimitive."
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Invalid call to a binding API
    #[error("{0}")]
    Config(String),
    /// An abstract was aliased to itself
    #[error("[{0}] is aliased to itself.")]
    SelfAlias(String),
    /// Contextual builder misuse
    #[error("{0}")]
    Usage(&'static str),
    /// Target has no binding and cannot be built
    #[error("{}", not_instantiable_message(.target, .building))]
    NotInstantiable {
        target: String,
        building: Vec<String>,
    },
    /// A constructor or method parameter could not be satisfied
    #[error("Unresolvable dependency resolving [[Parameter #{index} [ <required> {name} ]] in class {class}.")]
    Unresolvable {
        index: usize,
        name: String,
        class: String,
    },
    /// Type resolution re-entered a class that is still being built
    #[error("Circular dependency resolving [[Parameter #{index} [ <required> {name} ]] in class {class}: {}.", .path.join(" -> "))]
    Circular {
        index: usize,
        name: String,
        class: String,
        path: Vec<String>,
    },
    /// Class carries no constructor metadata
    #[error("Target class [{0}] must be registered as constructable!")]
    NotConstructable(String),
    /// Method exists but carries no parameter metadata
    #[error("Target method [{0}] must be registered as methodable!")]
    NotMethodable(String),
    /// Bare function without parameter metadata
    #[error("Target function [{0}] must be annotated!")]
    NotAnnotated(String),
    /// Named member is missing on the target
    #[error("Target method [{0}] is not a function.")]
    NotAFunction(String),
    /// Downcast of a resolved value failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

fn not_instantiable_message(target: &str, building: &[String]) -> String {
    if building.is_empty() {
        format!("Target [{}] is not instantiable.", target)
    } else {
        format!(
            "Target [{}] is not instantiable while building [{}].",
            target,
            building.join(", ")
        )
    }
}

impl DiError {
    /// Circular dependency detected during type resolution.
    pub fn is_circular(&self) -> bool {
        matches!(self, DiError::Circular { .. })
    }

    /// Errors raised by the resolution engine itself, as opposed to
    /// configuration mistakes at registration time.
    pub fn is_binding_resolution(&self) -> bool {
        matches!(
            self,
            DiError::NotInstantiable { .. }
                | DiError::Unresolvable { .. }
                | DiError::Circular { .. }
                | DiError::NotConstructable(_)
                | DiError::NotMethodable(_)
                | DiError::NotAnnotated(_)
                | DiError::DepthExceeded(_)
        )
    }
}

/// Result type for container operations
///
/// ```rust
/// use ferrous_ioc::{DiResult, DiError};
///
/// fn lookup() -> DiResult<()> {
///     Err(DiError::Usage("Please provide a need, before give!"))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
