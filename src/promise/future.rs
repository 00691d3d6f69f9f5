//! Awaiting a promise from async Rust.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::Promise;
use crate::error::AwaitError;

/// Future returned by awaiting a [`Promise`].
///
/// The outcome is delivered by a waiter like any other continuation, so the
/// promise's scheduler must keep running for the future to complete.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Settlement<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Settlement<T, E> {
    type Output = Result<T, AwaitError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(reason))) => Poll::Ready(Err(AwaitError::Rejected(reason))),
            // the waiter was dropped with the promise before it settled
            Poll::Ready(Err(_)) => Poll::Ready(Err(AwaitError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> IntoFuture for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Result<T, AwaitError<E>>;
    type IntoFuture = Settlement<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        let (sender, receiver) = oneshot::channel();
        self.push_waiter(move |outcome| {
            let _ = sender.send(outcome);
        });
        Settlement { receiver }
    }
}
