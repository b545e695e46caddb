//! Container construction options.

use std::sync::Arc;

use crate::config::Config;
use crate::reflection::{Annotations, MetadataProvider};

/// Default bound on nested resolutions and class builds per thread.
///
/// Low enough that runaway factory recursion fails with `DepthExceeded`
/// well before it exhausts a 2 MiB thread stack in an unoptimized build.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for [`Container::with_options`](crate::Container::with_options).
///
/// ```rust
/// use ferrous_ioc::{Annotations, Container, ContainerOptions};
/// use std::sync::Arc;
///
/// let options = ContainerOptions::new()
///     .max_depth(64)
///     .annotations(Arc::new(Annotations::new()));
/// let container = Container::with_options(options);
/// assert_eq!(container.max_depth(), 64);
/// ```
#[derive(Clone)]
pub struct ContainerOptions {
    pub(crate) max_depth: usize,
    pub(crate) metadata: Arc<dyn MetadataProvider>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            metadata: Annotations::global(),
        }
    }
}

impl std::fmt::Debug for ContainerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `container.max_depth` from a configuration repository.
    pub fn load(config: &Config) -> Self {
        let depth = config.get_i64_or("container.max_depth", DEFAULT_MAX_DEPTH as i64);
        Self::new().max_depth(usize::try_from(depth).unwrap_or(DEFAULT_MAX_DEPTH))
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Uses a private class table instead of the process-wide one.
    pub fn annotations(mut self, annotations: Arc<Annotations>) -> Self {
        self.metadata = annotations;
        self
    }

    /// Uses a custom metadata provider.
    pub fn metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigSource;

    #[test]
    fn load_reads_depth_from_config() {
        let config = Config::new().with_source(MapConfigSource::new().set("container.max_depth", 12i64));
        assert_eq!(ContainerOptions::load(&config).max_depth, 12);
        assert_eq!(ContainerOptions::load(&Config::new()).max_depth, DEFAULT_MAX_DEPTH);
    }
}
