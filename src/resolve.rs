//! Resolver functions, resolution errors and their annotation
//!
//! A resolver is stored in type-erased form: it receives the [TypeKey] of the consumer and
//! returns a boxed instance of the dependency it was registered for, or a failure.
//!
//! * The typed registration entry points wrap user closures with [erase], which boxes the
//!   produced instance and converts the failure into a [BoxError].
//! * Failures raised while running a resolver (or a singleton initializer) are wrapped by
//!   [annotate] into a single [WiringError::ResolutionFailure] describing the action in progress.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::TypeKey;

/// Failure raised by a user-supplied resolver
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Type-erased resolver stored in a registry
pub(crate) type Resolver =
    Arc<dyn Fn(TypeKey) -> Result<Box<dyn Any + Send>, BoxError> + Send + Sync>;

/// Errors triggered while registering or resolving dependencies
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("no resolver registered for {0}")]
    NotRegistered(TypeKey),
    #[error("no test double registered for {0}")]
    NoTestDoubleRegistered(TypeKey),
    #[error("error {action}: {source}")]
    ResolutionFailure {
        key: TypeKey,
        action: String,
        #[source]
        source: BoxError,
    },
    #[error("cyclic dependencies: {0} is already being resolved")]
    CyclicResolution(TypeKey),
    /// The resolver stored under a key produced an instance of another type.
    ///
    /// The typed registration functions always derive the key from the produced type, so they
    /// cannot reach this state.
    #[error("consistency error: the resolver for {0} produced an instance of another type")]
    TypeMismatch(TypeKey),
}

impl WiringError {
    /// Type key of the dependency this error is about
    pub fn key(&self) -> TypeKey {
        match self {
            WiringError::NotRegistered(key)
            | WiringError::NoTestDoubleRegistered(key)
            | WiringError::CyclicResolution(key)
            | WiringError::TypeMismatch(key)
            | WiringError::ResolutionFailure { key, .. } => *key,
        }
    }

    /// Follow nested resolution failures down to the innermost wiring error.
    ///
    /// When resolving a chain of dependencies, each level annotates the failure of the level
    /// below it. This returns the deepest [WiringError] of the chain, which is `self` if the
    /// failure was not caused by another wiring error.
    pub fn innermost(&self) -> &WiringError {
        let mut current = self;
        while let WiringError::ResolutionFailure { source, .. } = current {
            match source.downcast_ref::<WiringError>() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }
}

/// Run an operation and wrap any failure with a description of the action.
///
/// Successful values are returned unchanged, failures are never dropped.
pub fn annotate<T, E, F>(
    key: TypeKey,
    action: impl Into<String>,
    op: F,
) -> Result<T, WiringError>
where
    E: Into<BoxError>,
    F: FnOnce() -> Result<T, E>,
{
    op().map_err(|e| WiringError::ResolutionFailure {
        key,
        action: action.into(),
        source: e.into(),
    })
}

/// Wrap a typed resolver into its type-erased form
pub(crate) fn erase<D, E, F>(resolver: F) -> Resolver
where
    D: Send + 'static,
    E: Into<BoxError>,
    F: Fn(TypeKey) -> Result<D, E> + Send + Sync + 'static,
{
    Arc::new(move |consumer| match resolver(consumer) {
        Ok(instance) => Ok(Box::new(instance) as Box<dyn Any + Send>),
        Err(e) => Err(e.into()),
    })
}

/// Recover the typed instance produced by a type-erased resolver
pub(crate) fn downcast<D: 'static>(
    key: TypeKey,
    instance: Box<dyn Any + Send>,
) -> Result<D, WiringError> {
    instance
        .downcast::<D>()
        .map(|b| *b)
        .map_err(|_| WiringError::TypeMismatch(key))
}
