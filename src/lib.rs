//! Explicit dependency resolution with a global service locator and injectable resolvers.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use locus::*;
//! // Define traits and implementors
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "Hello world".into()
//!     }
//! }
//!
//! struct App;
//!
//! # fn main() -> Result<(), WiringError> {
//! locator::set_log_sink(log::silent_sink());
//!
//! // Register a shared instance for the trait object type
//! locator::register_singleton(|| Arc::new(English) as Arc<dyn Greeter>);
//!
//! // Resolve it on behalf of a consumer, through the locator or an injected handle
//! let a: Arc<dyn Greeter> = locator::inject::<App, _>()?;
//! let b: Arc<dyn Greeter> = Injector.inject::<App, _>()?;
//! assert_eq!(a.greet(), "Hello world");
//! assert!(Arc::ptr_eq(&a, &b));
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Resolvers are stored in a [Registry] indexed by the [TypeKey] of the dependency they produce.
//! Resolution never inspects constructors: every dependency must be registered explicitly.
//!
//! * A resolver is a function receiving the [TypeKey] of the consumer and producing an instance.
//!   Comparing this key lets a single registration return different implementations to
//!   different consumers.
//! * A singleton registration wraps its initializer in a [Singleton], which runs it at most once
//!   and ignores the consumer.
//! * Failures raised by resolvers are wrapped into [WiringError::ResolutionFailure] with a
//!   description of the action in progress.
//!
//! Two equivalent surfaces share the process-wide registry: the free functions of [locator]
//! and the [Injector] handle, which implements the [Inject] trait. Code depending on [Inject]
//! rather than on the locator can be tested with a [TestOverlay], an isolated registry of test
//! doubles.

mod helpers;
mod inject;
mod key;
pub mod locator;
pub mod log;
mod overlay;
mod resolve;

pub use helpers::Singleton;
pub use inject::{Inject, InjectExt, Registry};
pub use key::{NoConsumer, TypeKey};
pub use locator::Injector;
pub use overlay::TestOverlay;
pub use resolve::{annotate, BoxError, WiringError};
