//! Join-all: compose N computations into one that completes after all N.
//!
//! The combinator is agnostic to what its branches wait on; sleeps,
//! readiness waits, join handles, and plain futures compose freely.
//! Results always come back in launch order, regardless of the order in
//! which branches complete.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

enum Slot<F: Future> {
    Pending(Pin<Box<F>>),
    Done(F::Output),
    Taken,
}

/// Future returned by [`join_all`].
pub struct JoinAll<F: Future> {
    slots: Vec<Slot<F>>,
    remaining: usize,
}

// All state is boxed; the combinator itself never needs pinning.
impl<F: Future> Unpin for JoinAll<F> {}

/// Launches every computation in `branches` and awaits them all.
///
/// Resolves exactly once, when the last branch completes, with the results
/// in launch order. An empty set resolves immediately with an empty vector.
pub fn join_all<I>(branches: I) -> JoinAll<I::Item>
where
    I: IntoIterator,
    I::Item: Future,
{
    let slots: Vec<Slot<I::Item>> = branches
        .into_iter()
        .map(|branch| Slot::Pending(Box::pin(branch)))
        .collect();
    let remaining = slots.len();

    JoinAll { slots, remaining }
}

impl<F: Future> Future for JoinAll<F> {
    type Output = Vec<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        for slot in this.slots.iter_mut() {
            if let Slot::Pending(branch) = slot {
                if let Poll::Ready(value) = branch.as_mut().poll(cx) {
                    *slot = Slot::Done(value);
                    this.remaining -= 1;
                }
            }
        }

        if this.remaining > 0 {
            return Poll::Pending;
        }

        let results = this
            .slots
            .iter_mut()
            .map(|slot| match std::mem::replace(slot, Slot::Taken) {
                Slot::Done(value) => value,
                _ => unreachable!("all branches completed"),
            })
            .collect();

        Poll::Ready(results)
    }
}

/// Future returned by [`try_join_all`].
pub struct TryJoinAll<F, T, E>
where
    F: Future<Output = Result<T, E>>,
{
    inner: JoinAll<F>,
}

impl<F, T, E> Unpin for TryJoinAll<F, T, E> where F: Future<Output = Result<T, E>> {}

/// Fallible join-all: awaits every branch, then surfaces the first failure.
///
/// Failure policy: all branches are driven to completion before the
/// combinator resolves (no branch is torn down mid-flight), and the error
/// surfaced is the failure of the lowest launch index, not the one that
/// failed first in time.
pub fn try_join_all<I, T, E>(branches: I) -> TryJoinAll<I::Item, T, E>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    TryJoinAll {
        inner: join_all(branches),
    }
}

impl<F, T, E> Future for TryJoinAll<F, T, E>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<Vec<T>, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcomes = match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(outcomes) => outcomes,
            Poll::Pending => return Poll::Pending,
        };

        Poll::Ready(outcomes.into_iter().collect())
    }
}
