//! Contains the diagnostic sink shared by every phase of a compilation.
//!
//! Errors are never returned silently: each phase hands them to a
//! [`Handler`] and then aborts the work it was doing.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

/// Represents a trait responsible for handling diagnostics in the compiler.
pub trait Handler<T>: Send + Sync {
    /// Receives an error and handles it.
    fn receive(&self, error: T);
}

/// Is a struct that implements [`Handler`] trait by storing all errors in a
/// vector.
///
/// Parallel instantiations of one compilation push into the same storage, so
/// the order of the errors follows the order the use sites failed in, not
/// the order they were requested in.
#[derive(Debug)]
pub struct Storage<T: Send + Sync> {
    errors: RwLock<Vec<T>>,
}

impl<T: Send + Sync> Storage<T> {
    /// Creates a new empty [`Storage`]
    #[must_use]
    pub const fn new() -> Self { Self { errors: RwLock::new(Vec::new()) } }

    /// Consumes the [`Storage`] and returns the underlying vector of errors.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> { self.errors.into_inner() }

    /// Returns a reference to the underlying vector of errors.
    #[must_use]
    pub fn as_vec(&self) -> RwLockReadGuard<Vec<T>> { self.errors.read() }

    /// Returns the number of errors received so far.
    #[must_use]
    pub fn len(&self) -> usize { self.errors.read().len() }

    /// Returns `true` if no error has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.errors.read().is_empty() }
}

impl<T: Send + Sync> Default for Storage<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Send + Sync, U> Handler<U> for Storage<T>
where
    U: Into<T>,
{
    fn receive(&self, error: U) { self.errors.write().push(error.into()); }
}

/// Is a struct that implements [`Handler`] trait by counting the number of
/// diagnostics received, for when only the number of failed declarations and
/// use sites of a compilation matters.
#[derive(Debug, Default)]
pub struct Counter {
    counter: AtomicUsize,
}

impl Counter {
    /// Returns the number of diagnostics received.
    #[must_use]
    pub fn count(&self) -> usize { self.counter.load(Ordering::Relaxed) }
}

impl<T> Handler<T> for Counter {
    fn receive(&self, _error: T) { self.counter.fetch_add(1, Ordering::Relaxed); }
}

/// Handles a diagnostic by panicking and printing the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Panic;

impl<T: std::fmt::Debug> Handler<T> for Panic {
    fn receive(&self, error: T) {
        panic!("{error:?}");
    }
}
