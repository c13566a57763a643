use std::any::Any;
use std::convert::Infallible;

use crate::log::{silent_sink, LogSink};
use crate::resolve::{erase, BoxError};
use crate::{Inject, Registry, TypeKey, WiringError};

/// Isolated registry of test doubles.
///
/// Each overlay starts empty and never reads from or writes to the global registry: a dependency
/// without a double fails with [WiringError::NoTestDoubleRegistered], whatever the global
/// registry holds for it.
#[derive(Debug)]
pub struct TestOverlay {
    registry: Registry,
}

impl TestOverlay {
    /// Create an empty overlay with a silent log sink
    pub fn new() -> Self {
        Self::with_log_sink(silent_sink())
    }

    pub fn with_log_sink(sink: LogSink) -> Self {
        Self {
            registry: Registry::with_log_sink(sink),
        }
    }

    pub fn register_test_double<D, F>(&self, resolver: F)
    where
        D: Send + 'static,
        F: Fn(TypeKey) -> D + Send + Sync + 'static,
    {
        self.try_register_test_double(move |consumer| Ok::<D, Infallible>(resolver(consumer)));
    }

    pub fn try_register_test_double<D, E, F>(&self, resolver: F)
    where
        D: Send + 'static,
        E: Into<BoxError>,
        F: Fn(TypeKey) -> Result<D, E> + Send + Sync + 'static,
    {
        self.registry.register_key(TypeKey::of::<D>(), erase(resolver));
    }

    pub fn contains<D: ?Sized + 'static>(&self) -> bool {
        self.registry.contains::<D>()
    }
}

impl Default for TestOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Inject for TestOverlay {
    fn inject_any(
        &self,
        consumer: TypeKey,
        dependency: TypeKey,
    ) -> Result<Box<dyn Any + Send>, WiringError> {
        self.registry
            .resolve_with(consumer, dependency, WiringError::NoTestDoubleRegistered)
    }
}
