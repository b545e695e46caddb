//! Abstract identifiers for the container.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

// Process-wide registry backing `Symbol::for_key`
static SYMBOL_REGISTRY: Lazy<Mutex<HashMap<Arc<str>, Symbol>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Opaque token usable as an abstract.
///
/// Two symbols are equal only if they come from the same `Symbol::new`
/// call, or from `Symbol::for_key` with the same description.
///
/// ```rust
/// use ferrous_ioc::Symbol;
///
/// assert_eq!(Symbol::for_key("IContract"), Symbol::for_key("IContract"));
/// assert_ne!(Symbol::new("IContract"), Symbol::new("IContract"));
/// ```
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    /// Creates a fresh, unique symbol.
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    /// Returns the shared symbol registered under `description`, creating it
    /// on first use.
    pub fn for_key(description: &str) -> Self {
        let mut registry = SYMBOL_REGISTRY.lock();
        if let Some(symbol) = registry.get(description) {
            return symbol.clone();
        }
        let symbol = Symbol::new(description);
        registry.insert(symbol.description.clone(), symbol.clone());
        symbol
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Key for binding storage and lookup.
///
/// An abstract is a string name, a [`Symbol`], or a Rust type standing in
/// for a class. Names and symbols compare by value; types compare by
/// `TypeId` only.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Key, Symbol, key_of_type};
///
/// struct Mailer;
///
/// let by_name = Key::from("mailer");
/// let by_symbol = Key::from(Symbol::for_key("IMailer"));
/// let by_type = key_of_type::<Mailer>();
///
/// assert_eq!(by_name.display_name(), "mailer");
/// assert_eq!(by_symbol.display_name(), "Symbol(IMailer)");
/// assert_eq!(by_type.display_name(), "Mailer");
/// assert!(by_type.is_type());
/// ```
#[derive(Clone)]
pub enum Key {
    /// String abstract
    Name(Arc<str>),
    /// Symbol abstract
    Symbol(Symbol),
    /// Class abstract with TypeId and full type name for diagnostics
    Type(TypeId, &'static str),
}

impl Key {
    /// Human-readable name used in error messages.
    ///
    /// Type keys drop their module path, so `app::mail::Mailer` renders as
    /// `Mailer`.
    pub fn display_name(&self) -> String {
        match self {
            Key::Name(name) => name.to_string(),
            Key::Symbol(symbol) => format!("Symbol({})", symbol.description()),
            Key::Type(_, name) => short_type_name(name),
        }
    }

    /// Whether this key names a class rather than a string or symbol token.
    pub fn is_type(&self) -> bool {
        matches!(self, Key::Type(_, _))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Key::Name(_))
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Key::Type(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            _ => None,
        }
    }

    /// `typeof` of the abstract in configuration error messages.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Key::Name(_) => "string",
            Key::Symbol(_) => "symbol",
            Key::Type(_, _) => "function",
        }
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Name(a), Key::Name(b)) => a == b,
            (Key::Symbol(a), Key::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            // Type name is ignored, TypeId alone identifies the class
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Key::Symbol(symbol) => {
                2u8.hash(state);
                symbol.hash(state);
            }
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "Name({:?})", name),
            Key::Symbol(symbol) => write!(f, "{:?}", symbol),
            Key::Type(_, name) => write!(f, "Type({})", name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(Arc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Arc::from(name))
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Key::Symbol(symbol)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Creates the class key for `T`.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Strips module paths from a type name, keeping generic arguments readable.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
