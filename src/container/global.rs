//! Process-wide container accessor.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use super::Container;

static INSTANCE: Lazy<Mutex<Option<Container>>> = Lazy::new(|| Mutex::new(None));

impl Container {
    /// Returns the shared container, creating it on first use.
    ///
    /// ```rust
    /// use ferrous_ioc::Container;
    ///
    /// let first = Container::get_instance();
    /// let second = Container::get_instance();
    /// assert!(first.ptr_eq(&second));
    /// ```
    pub fn get_instance() -> Container {
        INSTANCE.lock().get_or_insert_with(Container::new).clone()
    }

    /// Replaces the shared container; `None` resets it so the next
    /// [`get_instance`](Self::get_instance) creates a fresh one.
    pub fn set_instance(container: Option<Container>) -> Option<Container> {
        debug!(reset = container.is_none(), "shared container replaced");
        let mut slot = INSTANCE.lock();
        *slot = container;
        slot.clone()
    }
}
