use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::helpers::Singleton;
use crate::log::{stdout_sink, LogSink};
use crate::resolve::{annotate, downcast, erase, BoxError, Resolver};
use crate::{TypeKey, WiringError};

/// Resolution capability, independent of the registry behind it.
///
/// Constructors can take a `&dyn Inject` (or a generic `I: Inject`) to resolve their own
/// dependencies, which lets tests hand them a [TestOverlay](crate::TestOverlay) instead of the
/// global [Injector](crate::Injector).
pub trait Inject: Send + Sync {
    /// Resolve the dependency identified by `dependency` on behalf of `consumer`.
    fn inject_any(
        &self,
        consumer: TypeKey,
        dependency: TypeKey,
    ) -> Result<Box<dyn Any + Send>, WiringError>;
}

/// Typed resolution for every [Inject] implementation, including trait objects
pub trait InjectExt: Inject {
    /// Obtain an instance of `D` on behalf of the consumer type `C`.
    ///
    /// Use [NoConsumer](crate::NoConsumer) as consumer when there is none.
    fn inject<C: ?Sized + 'static, D: 'static>(&self) -> Result<D, WiringError> {
        let key = TypeKey::of::<D>();
        let instance = self.inject_any(TypeKey::of::<C>(), key)?;
        downcast(key, instance)
    }
}

impl<I: Inject + ?Sized> InjectExt for I {}

/// Registry of resolvers indexed by the [TypeKey] of the dependency they produce.
///
/// Registering a resolver for a key replaces the previous one. The registry lock is never held
/// while a resolver runs, so resolvers are free to resolve their own dependencies.
pub struct Registry {
    entries: RwLock<HashMap<TypeKey, Resolver>>,
    sink: RwLock<LogSink>,
}

impl Registry {
    /// Create an empty registry logging to the standard output
    pub fn new() -> Self {
        Self::with_log_sink(stdout_sink())
    }

    pub fn with_log_sink(sink: LogSink) -> Self {
        Self {
            entries: RwLock::default(),
            sink: RwLock::new(sink),
        }
    }

    pub fn set_log_sink(&self, sink: LogSink) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    /// Register a resolver for `D`, called with the consumer key on every resolution
    pub fn register<D, F>(&self, resolver: F)
    where
        D: Send + 'static,
        F: Fn(TypeKey) -> D + Send + Sync + 'static,
    {
        self.try_register(move |consumer| Ok::<D, Infallible>(resolver(consumer)));
    }

    /// Register a fallible resolver for `D`
    pub fn try_register<D, E, F>(&self, resolver: F)
    where
        D: Send + 'static,
        E: Into<BoxError>,
        F: Fn(TypeKey) -> Result<D, E> + Send + Sync + 'static,
    {
        self.register_key(TypeKey::of::<D>(), erase(resolver));
    }

    /// Register a shared instance of `D`, created by `init` on first resolution
    pub fn register_singleton<D, F>(&self, init: F)
    where
        D: Clone + Send + Sync + 'static,
        F: Fn() -> D + Send + Sync + 'static,
    {
        self.try_register_singleton(move || Ok::<D, Infallible>(init()));
    }

    /// Register a shared instance of `D` with a fallible initializer.
    ///
    /// A failed initialization is reported to the caller and retried on the next resolution.
    pub fn try_register_singleton<D, E, F>(&self, init: F)
    where
        D: Clone + Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn() -> Result<D, E> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<D>();
        let singleton = Singleton::new(key, init);
        self.register_key(key, erase(move |_consumer| singleton.get()));
    }

    pub(crate) fn register_key(&self, key: TypeKey, resolver: Resolver) {
        self.write().insert(key, resolver);
        tracing::debug!(dependency = %key, "registered resolver");
        self.log(format!("registered resolver for {}", key));
    }

    pub fn contains<D: ?Sized + 'static>(&self) -> bool {
        self.contains_key(TypeKey::of::<D>())
    }

    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove all resolvers, dropping the instances cached by singletons
    pub fn clear(&self) {
        let previous = std::mem::take(&mut *self.write());
        tracing::debug!(removed = previous.len(), "cleared registry");
        drop(previous);
    }

    fn lookup(&self, key: TypeKey) -> Option<Resolver> {
        self.read().get(&key).cloned()
    }

    /// Run the resolver registered for `dependency`, reporting a missing entry with `missing`
    pub(crate) fn resolve_with(
        &self,
        consumer: TypeKey,
        dependency: TypeKey,
        missing: fn(TypeKey) -> WiringError,
    ) -> Result<Box<dyn Any + Send>, WiringError> {
        let Some(resolver) = self.lookup(dependency) else {
            tracing::debug!(dependency = %dependency, consumer = %consumer, "no resolver");
            return Err(missing(dependency));
        };
        let _guard = ResolutionGuard::enter(self, consumer, dependency)?;

        tracing::debug!(dependency = %dependency, consumer = %consumer, "resolving");
        self.log(format!("returned instance of {}", dependency));
        annotate(
            dependency,
            format!("invoking resolver for {}", dependency),
            || resolver(consumer),
        )
        .map_err(|e| {
            tracing::warn!(
                dependency = %dependency,
                consumer = %consumer,
                error = %e,
                "resolution failed"
            );
            e
        })
    }

    fn log(&self, message: String) {
        let sink = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sink(&message);
    }

    // every mutation is a single insert or a full swap, a poisoned map is still consistent
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Resolver>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Resolver>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.read().keys()).finish()
    }
}

impl Inject for Registry {
    fn inject_any(
        &self,
        consumer: TypeKey,
        dependency: TypeKey,
    ) -> Result<Box<dyn Any + Send>, WiringError> {
        self.resolve_with(consumer, dependency, WiringError::NotRegistered)
    }
}

thread_local! {
    // (registry address, dependency, consumer) for every resolution running on this thread
    static RESOLVING: RefCell<Vec<(usize, TypeKey, TypeKey)>> = RefCell::new(Vec::new());
}

/// Marks a resolution as in progress on the current thread until dropped
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(
        registry: &Registry,
        consumer: TypeKey,
        dependency: TypeKey,
    ) -> Result<Self, WiringError> {
        let frame = (registry as *const Registry as usize, dependency, consumer);
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&frame) {
                return Err(WiringError::CyclicResolution(dependency));
            }
            stack.push(frame);
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
