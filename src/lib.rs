//! # ferrous-ioc
//!
//! Runtime inversion-of-control container: binding registry, contextual
//! bindings, constructor and call injection, lifecycle callbacks.
//!
//! ## Features
//!
//! - **Abstracts of any kind**: bind string names, [`Symbol`]s or Rust types
//! - **Lifetimes**: transient, singleton and scoped bindings, plus existing instances
//! - **Constructor injection**: classes registered through [`constructable`] are built
//!   from their parameter metadata, including variadic and defaulted parameters
//! - **Contextual bindings**: `when(Consumer).needs(Dependency).give(...)`
//! - **Call injection**: invoke annotated functions and methods with resolved arguments
//! - **Circular dependency detection**: cycles are reported with the full build path
//! - **Lifecycle callbacks**: before-resolving, resolving, after-resolving and rebinding
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{constructable, share, Container, Parameter, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! constructable::<UserService>("UserService")
//!     .param(Parameter::class::<Database>("db"))
//!     .register(|args| Ok(UserService { db: args.get::<Database>(0)? }));
//!
//! let container = Container::new();
//! container
//!     .singleton(ferrous_ioc::key_of_type::<Database>(), |_, _| {
//!         Ok(share(Database { url: "postgres://localhost".to_string() }))
//!     })
//!     .unwrap();
//!
//! let users = container.make_type::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```
//!
//! ## Contextual Bindings
//!
//! ```rust
//! use ferrous_ioc::{constructable, Container, Implementation, Parameter, Resolver};
//!
//! struct Report {
//!     format: String,
//! }
//!
//! constructable::<Report>("Report")
//!     .param(Parameter::primitive("format").default("text".to_string()))
//!     .register(|args| Ok(Report { format: args.cloned::<String>(0)? }));
//!
//! let container = Container::new();
//! assert_eq!(container.make_type::<Report>().unwrap().format, "text");
//!
//! container
//!     .when_type::<Report>()
//!     .needs("format")
//!     .give(Implementation::value("pdf".to_string()))
//!     .unwrap();
//! assert_eq!(container.make_type::<Report>().unwrap().format, "pdf");
//! ```
//!
//! ## Lifetimes
//!
//! ```rust
//! use ferrous_ioc::{share, Container};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let container = Container::new();
//!
//! let c = counter.clone();
//! container
//!     .scoped("request.id", move |_, _| Ok(share(c.fetch_add(1, Ordering::SeqCst))))
//!     .unwrap();
//!
//! let first = container.make("request.id").unwrap();
//! assert!(Arc::ptr_eq(&first, &container.make("request.id").unwrap()));
//!
//! // A new "request" starts with fresh scoped instances
//! container.forget_scoped_instances();
//! assert!(!Arc::ptr_eq(&first, &container.make("request.id").unwrap()));
//! ```

// Module declarations
pub mod config;
pub mod container;
pub mod contextual;
pub mod descriptors;
pub mod error;
pub mod events;
pub mod key;
pub mod lifetime;
pub mod parameters;
pub mod reflection;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use container::{Callable, Container, ContainerOptions, MethodRef, Tagged, DEFAULT_MAX_DEPTH};
pub use contextual::{ContextualBindingBuilder, Implementation};
pub use descriptors::BindingDescriptor;
pub use error::{DiError, DiResult};
pub use events::{BeforeResolvingFn, ReboundFn, ResolvingFn};
pub use key::{key_of_type, Key, Symbol};
pub use lifetime::Lifetime;
pub use parameters::{downcast, share, AnyArc, Arguments, Parameters, Sequence};
pub use reflection::{
    annotate, constructable, Annotations, ClassBuilder, ClassDefinition, Function,
    MetadataProvider, MethodDefinition, Parameter, ParameterType,
};
pub use registration::{Binding, Concrete, ExtenderFn, FactoryFn, MethodBindingFn, Receiver};
pub use traits::{Resolver, ResolverCore};
