//! Exclusive access to a solver shared between threads.
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// A solver behind a mutex.
///
/// Training needs `&mut` access and evaluation `&` access. When a live solver
/// is assessed from another thread, both go through this wrapper so that an
/// evaluation never observes a half-applied update.
pub struct SharedSolver<S>(Arc<Mutex<S>>);

impl<S> Clone for SharedSolver<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S> SharedSolver<S> {
    /// Wraps a solver.
    pub fn new(solver: S) -> Self {
        Self(Arc::new(Mutex::new(solver)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>> {
        self.0.lock().map_err(|_| anyhow!("solver lock poisoned"))
    }

    /// Runs `f` with exclusive mutable access, for training.
    pub fn train<T>(&self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    /// Runs `f` with read access, for evaluation.
    pub fn assess<T>(&self, f: impl FnOnce(&S) -> T) -> Result<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Returns the solver if this is the last handle.
    pub fn into_inner(self) -> Option<S> {
        Arc::try_unwrap(self.0)
            .ok()
            .and_then(|m| m.into_inner().ok())
    }
}
