//! Race-first: compose N computations into one that completes with the
//! first finisher, cancelling the rest.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`race_first`].
pub struct RaceFirst<F: Future> {
    branches: Vec<Pin<Box<F>>>,
}

impl<F: Future> Unpin for RaceFirst<F> {}

/// Launches every computation in `branches` and awaits the first finisher.
///
/// Resolves exactly once, with `(index, value)` identifying which branch
/// completed. Branches are polled in launch order on every wake, so when
/// several become ready in the same reactor batch or timer sweep the
/// lowest index wins. The losing branches are dropped synchronously before
/// the combinator resolves; their reactor registrations and timer nodes
/// are deregistered in the process, so a late event on a cancelled branch
/// wakes nothing.
///
/// # Panics
/// Panics on an empty set of branches: nothing could ever complete it.
pub fn race_first<I>(branches: I) -> RaceFirst<I::Item>
where
    I: IntoIterator,
    I::Item: Future,
{
    let branches: Vec<_> = branches.into_iter().map(Box::pin).collect();
    assert!(
        !branches.is_empty(),
        "race_first() requires at least one branch"
    );

    RaceFirst { branches }
}

impl<F: Future> Future for RaceFirst<F> {
    type Output = (usize, F::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        for (index, branch) in this.branches.iter_mut().enumerate() {
            if let Poll::Ready(value) = branch.as_mut().poll(cx) {
                log::trace!("race: branch {index} won of {}", this.branches.len());

                // Tear the losers down before resuming the waiter.
                this.branches.clear();

                return Poll::Ready((index, value));
            }
        }

        Poll::Pending
    }
}
