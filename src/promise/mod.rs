//! The deferred-computation state machine.
//!
//! A [`Promise`] starts out pending and settles at most once, either
//! fulfilled with a `T` or rejected with an `E`. Continuations registered with
//! the `then` family are queued as waiters and run, in registration order, by a
//! notification task handed to the promise's [`Scheduler`]. Waiters never run
//! synchronously inside `resolve`, `reject` or `then`.
//!
//! # Example
//!
//! ```
//! use deferred::{Promise, Scheduler, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let scheduler: Scheduler = queue.clone().into();
//!
//! let doubled = Promise::<i32, String>::resolve(&scheduler, 3)
//!     .then(|v| Ok(v + 1))
//!     .then(|v| Ok(v * 2));
//!
//! queue.run_until_idle();
//! assert_eq!(doubled.outcome(), Some(Ok(8)));
//! ```

mod combinators;
mod future;
mod thenable;

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::UsageError;
use crate::scheduler::Scheduler;

pub use future::Settlement;
pub use thenable::{Callback, Resolution, Thenable};

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique promise identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PromiseId(u64);

impl PromiseId {
    fn next() -> Self {
        PromiseId(NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise#{}", self.0)
    }
}

/// Observable settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Fulfilled,
    Rejected,
}

enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T: Clone, E: Clone> State<T, E> {
    fn kind(&self) -> PromiseState {
        match self {
            State::Pending => PromiseState::Pending,
            State::Fulfilled(_) => PromiseState::Fulfilled,
            State::Rejected(_) => PromiseState::Rejected,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    fn outcome(&self) -> Option<Result<T, E>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

/// A registered continuation.
///
/// Carries the handlers and the resolver of the dependent promise, folded into
/// one closure because every registration has its own result type.
struct Waiter<T, E> {
    reaction: Box<dyn FnOnce(Result<T, E>) + Send>,
}

struct Inner<T, E> {
    state: State<T, E>,
    /// A notification task is currently running the waiters.
    draining: bool,
    waiters: VecDeque<Waiter<T, E>>,
}

struct Shared<T, E> {
    id: PromiseId,
    scheduler: Scheduler,
    inner: Mutex<Inner<T, E>>,
}

/// A value or failure that is not known yet.
///
/// Cloning is cheap and yields another handle to the same promise.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// The settle capability of a promise, handed to executors.
pub struct Resolver<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T, E> Promise<T, E> {
    pub fn id(&self) -> PromiseId {
        self.shared.id
    }

    /// The scheduler that runs this promise's notifications.
    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a pending promise together with its resolver.
    pub fn pending(scheduler: &Scheduler) -> (Self, Resolver<T, E>) {
        let promise = Promise {
            shared: Arc::new(Shared {
                id: PromiseId::next(),
                scheduler: scheduler.clone(),
                inner: Mutex::new(Inner {
                    state: State::Pending,
                    draining: false,
                    waiters: VecDeque::new(),
                }),
            }),
        };
        let resolver = Resolver {
            promise: promise.clone(),
        };
        (promise, resolver)
    }

    /// Creates a promise and runs `executor` synchronously with its resolver.
    ///
    /// An `Err` returned by the executor rejects the promise, unless the
    /// executor already settled it.
    pub fn new<F>(scheduler: &Scheduler, executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (promise, resolver) = Self::pending(scheduler);
        if let Err(reason) = executor(resolver.clone()) {
            resolver.reject(reason);
        }
        promise
    }

    /// A promise fulfilled with `value`.
    pub fn resolve(scheduler: &Scheduler, value: T) -> Self {
        Self::new(scheduler, move |resolver| {
            resolver.resolve(value);
            Ok(())
        })
    }

    /// A promise resolved with `resolution`, adopting it if it is a thenable.
    pub fn resolve_with(scheduler: &Scheduler, resolution: Resolution<T, E>) -> Self {
        Self::new(scheduler, move |resolver| {
            resolver.resolve_with(resolution);
            Ok(())
        })
    }

    /// A promise rejected with `reason`.
    pub fn reject(scheduler: &Scheduler, reason: E) -> Self {
        Self::new(scheduler, move |resolver| {
            resolver.reject(reason);
            Ok(())
        })
    }

    pub fn state(&self) -> PromiseState {
        self.shared.inner.lock().state.kind()
    }

    /// The settled value or reason, if the promise has settled.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.shared.inner.lock().state.outcome()
    }

    /// Runs `on_fulfilled` with the value; rejections pass through unchanged.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value).map(Resolution::Value),
            Err(reason) => Err(reason),
        })
    }

    /// Runs `on_fulfilled` or `on_rejected`, whichever matches the outcome.
    pub fn then_or_else<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
        G: FnOnce(E) -> Result<U, E> + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value).map(Resolution::Value),
            Err(reason) => on_rejected(reason).map(Resolution::Value),
        })
    }

    /// Like [`then`](Promise::then), but the handler may hand back a thenable
    /// for the returned promise to adopt.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value),
            Err(reason) => Err(reason),
        })
    }

    /// General form of the `then` family: both handlers may return a thenable.
    pub fn then_with<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + Send + 'static,
        G: FnOnce(E) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value),
            Err(reason) => on_rejected(reason),
        })
    }

    /// Runs `on_rejected` with the reason; values pass through unchanged.
    pub fn catch<G>(&self, on_rejected: G) -> Promise<T, E>
    where
        G: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => Ok(Resolution::Value(value)),
            Err(reason) => on_rejected(reason).map(Resolution::Value),
        })
    }

    /// Registers `handler` as a waiter feeding a new dependent promise.
    fn subscribe<U, F>(&self, handler: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Result<T, E>) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        let (dependent, resolver) = Promise::pending(&self.shared.scheduler);
        self.push_waiter(move |outcome| match handler(outcome) {
            Ok(resolution) => resolver.resolve_with(resolution),
            Err(reason) => resolver.reject(reason),
        });
        dependent
    }

    fn push_waiter<F>(&self, reaction: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.shared.inner.lock().waiters.push_back(Waiter {
            reaction: Box::new(reaction),
        });
        self.notify();
    }

    fn notify(&self) {
        let promise = self.clone();
        self.shared.scheduler.schedule(move || promise.drain());
    }

    /// Runs every queued waiter against the settled outcome, oldest first.
    fn drain(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state.is_pending() || inner.draining {
                return;
            }
            inner.draining = true;
        }

        // On a panicking handler, clear the flag and hand the waiters behind
        // it to a fresh notification.
        let promise = scopeguard::guard_on_unwind(self, |promise| {
            let stranded = {
                let mut inner = promise.shared.inner.lock();
                inner.draining = false;
                !inner.waiters.is_empty()
            };
            if stranded {
                promise.notify();
            }
        });
        let shared = &promise.shared;

        let mut notified = 0usize;
        loop {
            let (waiter, outcome) = {
                let mut inner = shared.inner.lock();
                let next = if inner.waiters.is_empty() {
                    None
                } else {
                    inner.state.outcome()
                };
                match next {
                    Some(outcome) => (inner.waiters.pop_front(), outcome),
                    None => {
                        inner.draining = false;
                        break;
                    }
                }
            };
            if let Some(waiter) = waiter {
                (waiter.reaction)(outcome);
                notified += 1;
            }
        }

        if notified > 0 {
            tracing::trace!(promise = %shared.id, waiters = notified, "notified waiters");
        }
    }

    /// Moves a pending promise into `next`. No-op once settled.
    fn settle(&self, next: State<T, E>) {
        let kind = next.kind();
        {
            let mut inner = self.shared.inner.lock();
            if !inner.state.is_pending() {
                return;
            }
            inner.state = next;
        }
        tracing::trace!(promise = %self.shared.id, state = ?kind, "settled");
        self.notify();
    }

    /// Hands settlement over to `thenable`; only its first callback counts.
    fn adopt(&self, thenable: Box<dyn Thenable<T, E>>) {
        let called = Arc::new(AtomicBool::new(false));

        let on_fulfilled: Callback<T> = {
            let promise = self.clone();
            let called = Arc::clone(&called);
            Box::new(move |value| {
                if !called.swap(true, Ordering::SeqCst) {
                    promise.settle(State::Fulfilled(value));
                }
            })
        };
        let on_rejected: Callback<E> = {
            let promise = self.clone();
            let called = Arc::clone(&called);
            Box::new(move |reason| {
                if !called.swap(true, Ordering::SeqCst) {
                    promise.settle(State::Rejected(reason));
                }
            })
        };

        if let Err(reason) = thenable.register(on_fulfilled, on_rejected) {
            if !called.swap(true, Ordering::SeqCst) {
                tracing::debug!(promise = %self.shared.id, "thenable registration failed");
                self.settle(State::Rejected(reason));
            }
        }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// The promise this resolver settles.
    pub fn promise(&self) -> &Promise<T, E> {
        &self.promise
    }

    /// Fulfills the promise with `value`. No-op once settled.
    ///
    /// Works while a thenable is still being adopted; the thenable's later
    /// callback is then ignored.
    pub fn resolve(&self, value: T) {
        self.promise.settle(State::Fulfilled(value));
    }

    /// Resolves the promise, adopting `resolution` if it is a thenable.
    ///
    /// # Panics
    /// Panics with [`UsageError::SelfResolution`] if `resolution` is the
    /// promise itself. Use [`try_resolve_with`](Resolver::try_resolve_with) to
    /// get the error back instead.
    pub fn resolve_with(&self, resolution: Resolution<T, E>) {
        if let Err(err) = self.try_resolve_with(resolution) {
            tracing::error!(promise = %self.promise.id(), "{}", err);
            panic!("{}", err);
        }
    }

    /// Resolves the promise, adopting `resolution` if it is a thenable.
    pub fn try_resolve_with(&self, resolution: Resolution<T, E>) -> Result<(), UsageError> {
        match resolution {
            Resolution::Value(value) => {
                self.resolve(value);
                Ok(())
            }
            Resolution::Thenable(thenable) => {
                let id = self.promise.id();
                let source = thenable.promise_id();
                if !self.promise.shared.inner.lock().state.is_pending() {
                    return Ok(());
                }
                if source == Some(id) {
                    return Err(UsageError::SelfResolution { id });
                }
                tracing::debug!(promise = %id, source = ?source, "adopting thenable");
                self.promise.adopt(thenable);
                Ok(())
            }
        }
    }

    /// Rejects the promise with `reason`. No-op once settled.
    pub fn reject(&self, reason: E) {
        self.promise.settle(State::Rejected(reason));
    }
}

impl<T, E> fmt::Debug for Promise<T, E>
where
    T: Clone,
    E: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.shared.id)
            .field("state", &self.shared.inner.lock().state.kind())
            .finish()
    }
}

impl<T, E> fmt::Debug for Resolver<T, E>
where
    T: Clone,
    E: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.promise)
            .finish()
    }
}
