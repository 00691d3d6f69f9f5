//! Interop with promise-like types from outside this module.

use std::fmt;

use super::{Promise, PromiseId};

/// Continuation handed to [`Thenable::register`].
pub type Callback<V> = Box<dyn FnOnce(V) + Send + 'static>;

/// Anything that can report its eventual outcome to a pair of callbacks.
///
/// A promise resolved with a thenable stays pending until the thenable calls
/// one of the callbacks, then takes over that outcome. Implementations may
/// call the callbacks later, from any thread, or call both; only the first
/// call has an effect. Returning `Err` from `register` before either callback
/// fired rejects the adopting promise with that reason.
pub trait Thenable<T, E>: Send {
    fn register(
        self: Box<Self>,
        on_fulfilled: Callback<T>,
        on_rejected: Callback<E>,
    ) -> Result<(), E>;

    /// Identity of the underlying promise, used to reject self-resolution.
    fn promise_id(&self) -> Option<PromiseId> {
        None
    }
}

/// What a promise gets resolved with: a plain value or a thenable to adopt.
pub enum Resolution<T, E> {
    Value(T),
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T, E> Resolution<T, E> {
    pub fn thenable<R>(thenable: R) -> Self
    where
        R: Thenable<T, E> + 'static,
    {
        Resolution::Thenable(Box::new(thenable))
    }
}

impl<T, E> From<Promise<T, E>> for Resolution<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn from(promise: Promise<T, E>) -> Self {
        Resolution::Thenable(Box::new(promise))
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Thenable(thenable) => f
                .debug_tuple("Thenable")
                .field(&thenable.promise_id())
                .finish(),
        }
    }
}

impl<T, E> Thenable<T, E> for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn register(
        self: Box<Self>,
        on_fulfilled: Callback<T>,
        on_rejected: Callback<E>,
    ) -> Result<(), E> {
        self.push_waiter(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value),
            Err(reason) => on_rejected(reason),
        });
        Ok(())
    }

    fn promise_id(&self) -> Option<PromiseId> {
        Some(self.id())
    }
}
