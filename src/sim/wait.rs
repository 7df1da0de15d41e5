//! Frame-driven waits for the game-over sequence
//!
//! The browser has no blocking sleep, so waits are futures polled once per
//! frame by the owner. Time comes from a shared clock the owner sets each
//! frame; clicks arrive through a shared counter. Nothing registers a waker,
//! so these futures must be polled from a frame loop, not an executor that
//! waits for wake-ups.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Frame time shared with pending waits
#[derive(Debug, Clone, Default)]
pub struct WaitClock {
    now_ms: Rc<Cell<f64>>,
}

impl WaitClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }

    pub fn now(&self) -> f64 {
        self.now_ms.get()
    }

    /// Resolves once the clock reaches now + `ms`
    pub fn sleep(&self, ms: f64) -> Sleep {
        Sleep {
            clock: self.clone(),
            deadline_ms: self.now() + ms,
        }
    }
}

#[derive(Debug)]
pub struct Sleep {
    clock: WaitClock,
    deadline_ms: f64,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now() >= self.deadline_ms {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Counts pointer clicks / taps
#[derive(Debug, Clone, Default)]
pub struct ClickSignal {
    clicks: Rc<Cell<u64>>,
}

impl ClickSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.clicks.set(self.clicks.get() + 1);
    }

    /// Resolves on the first click after this call; earlier clicks don't count
    pub fn next_click(&self) -> NextClick {
        NextClick {
            signal: self.clone(),
            seen: self.clicks.get(),
        }
    }
}

#[derive(Debug)]
pub struct NextClick {
    signal: ClickSignal,
    seen: u64,
}

impl Future for NextClick {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.signal.clicks.get() > self.seen {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Which side of a race finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum First<A, B> {
    Left(A),
    Right(B),
}

/// Resolves with whichever future finishes first; the other is dropped
///
/// Both ready on the same poll: left wins.
pub fn race<A, B>(left: A, right: B) -> Race<A, B>
where
    A: Future + Unpin,
    B: Future + Unpin,
{
    Race { left, right }
}

#[derive(Debug)]
pub struct Race<A, B> {
    left: A,
    right: B,
}

impl<A, B> Future for Race<A, B>
where
    A: Future + Unpin,
    B: Future + Unpin,
{
    type Output = First<A::Output, B::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Poll::Ready(out) = Pin::new(&mut self.left).poll(cx) {
            return Poll::Ready(First::Left(out));
        }
        if let Poll::Ready(out) = Pin::new(&mut self.right).poll(cx) {
            return Poll::Ready(First::Right(out));
        }
        Poll::Pending
    }
}

/// How the game-over screen was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    TimedOut,
    Clicked,
}

/// Settle, then wait for whichever comes first: the timeout or a click
///
/// Clicks during the settle period are ignored.
pub fn game_over_sequence(
    clock: WaitClock,
    clicks: ClickSignal,
    settle_ms: f64,
    dismiss_ms: f64,
) -> impl Future<Output = Dismissal> {
    async move {
        clock.sleep(settle_ms).await;
        match race(clock.sleep(dismiss_ms), clicks.next_click()).await {
            First::Left(()) => Dismissal::TimedOut,
            First::Right(()) => Dismissal::Clicked,
        }
    }
}

/// Poll a frame-driven future once
pub fn poll_once<F: Future + ?Sized>(future: Pin<&mut F>) -> Option<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    match future.poll(&mut cx) {
        Poll::Ready(out) => Some(out),
        Poll::Pending => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(clock: &WaitClock, clicks: &ClickSignal) -> Pin<Box<dyn Future<Output = Dismissal>>> {
        Box::pin(game_over_sequence(clock.clone(), clicks.clone(), 1000.0, 5000.0))
    }

    #[test]
    fn test_sleep_waits_for_clock() {
        let clock = WaitClock::new();
        clock.set(100.0);
        let mut sleep = clock.sleep(50.0);
        assert!(poll_once(Pin::new(&mut sleep)).is_none());
        clock.set(149.9);
        assert!(poll_once(Pin::new(&mut sleep)).is_none());
        clock.set(150.0);
        assert_eq!(poll_once(Pin::new(&mut sleep)), Some(()));
    }

    #[test]
    fn test_only_new_clicks_count() {
        let clicks = ClickSignal::new();
        clicks.fire();
        let mut next = clicks.next_click();
        assert!(poll_once(Pin::new(&mut next)).is_none());
        clicks.fire();
        assert_eq!(poll_once(Pin::new(&mut next)), Some(()));
    }

    #[test]
    fn test_race_left_wins_ties() {
        let clock = WaitClock::new();
        let clicks = ClickSignal::new();
        let mut both = race(clock.sleep(0.0), clicks.next_click());
        clicks.fire();
        assert_eq!(poll_once(Pin::new(&mut both)), Some(First::Left(())));
    }

    #[test]
    fn test_dismiss_times_out() {
        let clock = WaitClock::new();
        let clicks = ClickSignal::new();
        clock.set(0.0);
        let mut wait = sequence(&clock, &clicks);

        assert!(poll_once(wait.as_mut()).is_none());
        clock.set(1000.0);
        assert!(poll_once(wait.as_mut()).is_none());
        clock.set(5999.0);
        assert!(poll_once(wait.as_mut()).is_none());
        clock.set(6000.0);
        assert_eq!(poll_once(wait.as_mut()), Some(Dismissal::TimedOut));
    }

    #[test]
    fn test_click_during_settle_is_ignored() {
        let clock = WaitClock::new();
        let clicks = ClickSignal::new();
        clock.set(0.0);
        let mut wait = sequence(&clock, &clicks);

        poll_once(wait.as_mut());
        clock.set(500.0);
        clicks.fire();
        assert!(poll_once(wait.as_mut()).is_none());

        clock.set(1200.0);
        assert!(poll_once(wait.as_mut()).is_none());
        clock.set(1300.0);
        clicks.fire();
        assert_eq!(poll_once(wait.as_mut()), Some(Dismissal::Clicked));
    }
}
