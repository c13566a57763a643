use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use once_cell::sync::OnceCell;

use crate::resolve::{annotate, BoxError};
use crate::{TypeKey, WiringError};

type Init<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

/// Memoizing resolver: runs its initializer once and hands out clones of the result.
///
/// The consumer of the dependency is ignored. Concurrent first accesses block until the winner
/// has finished, then receive its instance. A failed initialization leaves the cache empty and the
/// next access tries again.
pub struct Singleton<T> {
    key: TypeKey,
    cell: OnceCell<T>,
    init: Init<T>,
    // thread currently running `init`, used to reject re-entrant initialization
    initializing: Mutex<Option<ThreadId>>,
}

impl<T: Clone + Send + Sync> Singleton<T> {
    pub fn new<E, F>(key: TypeKey, init: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            key,
            cell: OnceCell::new(),
            init: Box::new(move || init().map_err(Into::into)),
            initializing: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Obtain the cached instance, running the initializer if needed
    pub fn get(&self) -> Result<T, WiringError> {
        if let Some(instance) = self.cell.get() {
            return Ok(instance.clone());
        }

        let me = thread::current().id();
        if *self.lock_owner() == Some(me) {
            return Err(WiringError::CyclicResolution(self.key));
        }

        self.cell
            .get_or_try_init(|| {
                let _owner = OwnerGuard::claim(self, me);
                annotate(
                    self.key,
                    format!("invoking singleton init for {}", self.key),
                    || (self.init)(),
                )
            })
            .cloned()
    }

    fn lock_owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.initializing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records the initializing thread until dropped, including when `init` panics
struct OwnerGuard<'a, T: Clone + Send + Sync> {
    singleton: &'a Singleton<T>,
}

impl<'a, T: Clone + Send + Sync> OwnerGuard<'a, T> {
    fn claim(singleton: &'a Singleton<T>, owner: ThreadId) -> Self {
        *singleton.lock_owner() = Some(owner);
        Self { singleton }
    }
}

impl<T: Clone + Send + Sync> Drop for OwnerGuard<'_, T> {
    fn drop(&mut self) {
        *self.singleton.lock_owner() = None;
    }
}
