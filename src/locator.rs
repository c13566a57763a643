//! Process-wide service locator.
//!
//! The free functions of this module all delegate to one [Registry], created empty on first use
//! and only emptied by an explicit [reset]. [Injector] is a handle on the same registry that can
//! be passed to constructors through the [Inject] trait.

use std::any::Any;

use once_cell::sync::Lazy;

use crate::log::LogSink;
use crate::resolve::BoxError;
use crate::{Inject, InjectExt, Registry, TypeKey, WiringError};

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The registry behind the locator functions
pub fn global() -> &'static Registry {
    &GLOBAL
}

pub fn register<D, F>(resolver: F)
where
    D: Send + 'static,
    F: Fn(TypeKey) -> D + Send + Sync + 'static,
{
    GLOBAL.register(resolver);
}

pub fn try_register<D, E, F>(resolver: F)
where
    D: Send + 'static,
    E: Into<BoxError>,
    F: Fn(TypeKey) -> Result<D, E> + Send + Sync + 'static,
{
    GLOBAL.try_register(resolver);
}

pub fn register_singleton<D, F>(init: F)
where
    D: Clone + Send + Sync + 'static,
    F: Fn() -> D + Send + Sync + 'static,
{
    GLOBAL.register_singleton(init);
}

pub fn try_register_singleton<D, E, F>(init: F)
where
    D: Clone + Send + Sync + 'static,
    E: Into<BoxError>,
    F: Fn() -> Result<D, E> + Send + Sync + 'static,
{
    GLOBAL.try_register_singleton(init);
}

/// Resolve `D` on behalf of `C` from the global registry
pub fn inject<C: ?Sized + 'static, D: 'static>() -> Result<D, WiringError> {
    GLOBAL.inject::<C, D>()
}

pub fn contains<D: ?Sized + 'static>() -> bool {
    GLOBAL.contains::<D>()
}

/// Forget every global registration
pub fn reset() {
    GLOBAL.clear();
}

pub fn set_log_sink(sink: LogSink) {
    GLOBAL.set_log_sink(sink);
}

/// [Inject] handle on the global registry
#[derive(Clone, Copy, Debug, Default)]
pub struct Injector;

impl Inject for Injector {
    fn inject_any(
        &self,
        consumer: TypeKey,
        dependency: TypeKey,
    ) -> Result<Box<dyn Any + Send>, WiringError> {
        GLOBAL.inject_any(consumer, dependency)
    }
}
