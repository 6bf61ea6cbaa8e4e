//! Slide carousel with auto-advance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Default time each slide stays up.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Position within a fixed number of slides. Navigation wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideIndex {
    current: usize,
    len: usize,
}

impl SlideIndex {
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    #[must_use]
    pub const fn current(self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    pub const fn next(&mut self) {
        if self.len > 0 {
            self.current = (self.current + 1) % self.len;
        }
    }

    pub const fn previous(&mut self) {
        if self.len > 0 {
            self.current = (self.current + self.len - 1) % self.len;
        }
    }

    /// Jump to `index`. Out-of-range indexes are ignored and return `false`.
    pub const fn go_to(&mut self, index: usize) -> bool {
        if index < self.len {
            self.current = index;
            true
        } else {
            false
        }
    }
}

/// Observable carousel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    pub index: SlideIndex,
    pub paused: bool,
}

struct Shared {
    state: watch::Sender<CarouselState>,
    restart: Notify,
}

/// A carousel whose timer runs on the tokio runtime.
///
/// Manual navigation and [`Carousel::resume`] restart the countdown for the
/// current slide. Dropping the carousel stops the timer.
pub struct Carousel {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Carousel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Carousel {
    /// Start auto-advancing through `len` slides every `every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(len: usize, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(1));
        let (state, _) = watch::channel(CarouselState {
            index: SlideIndex::new(len),
            paused: false,
        });
        let shared = Arc::new(Shared {
            state,
            restart: Notify::new(),
        });

        let task = tokio::spawn(Self::run(Arc::clone(&shared), every));
        tracing::debug!(slides = len, interval_ms = every.as_millis(), "Carousel started");

        Self { shared, task }
    }

    async fn run(shared: Arc<Shared>, every: Duration) {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    shared.state.send_if_modified(|state| {
                        if state.paused || state.index.len() < 2 {
                            return false;
                        }
                        state.index.next();
                        true
                    });
                }
                () = shared.restart.notified() => ticker.reset(),
            }
        }
    }

    fn navigate(&self, step: impl FnOnce(&mut SlideIndex) -> bool) -> bool {
        let moved = self
            .shared
            .state
            .send_if_modified(|state| step(&mut state.index));
        if moved {
            self.shared.restart.notify_one();
        }
        moved
    }

    #[must_use]
    pub fn state(&self) -> CarouselState {
        *self.shared.state.borrow()
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.state().index.current()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    /// Receiver that yields every slide change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CarouselState> {
        self.shared.state.subscribe()
    }

    pub fn next(&self) {
        self.navigate(|index| {
            let before = *index;
            index.next();
            *index != before
        });
    }

    pub fn previous(&self) {
        self.navigate(|index| {
            let before = *index;
            index.previous();
            *index != before
        });
    }

    /// Jump to a slide. Returns `false` for an out-of-range index.
    pub fn go_to(&self, slide: usize) -> bool {
        let mut in_range = false;
        self.navigate(|index| {
            let before = *index;
            in_range = index.go_to(slide);
            *index != before
        });
        in_range
    }

    /// Stop auto-advancing. Manual navigation still works.
    pub fn pause(&self) {
        self.shared.state.send_if_modified(|state| {
            let changed = !state.paused;
            state.paused = true;
            changed
        });
    }

    /// Resume auto-advancing with a fresh countdown.
    pub fn resume(&self) {
        let resumed = self.shared.state.send_if_modified(|state| {
            let changed = state.paused;
            state.paused = false;
            changed
        });
        if resumed {
            self.shared.restart.notify_one();
        }
    }
}

impl Drop for Carousel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    const TICK: Duration = Duration::from_secs(5);

    #[test]
    fn test_slide_index_wraps() {
        let mut index = SlideIndex::new(3);
        index.previous();
        assert_eq!(index.current(), 2);
        index.next();
        assert_eq!(index.current(), 0);

        assert!(index.go_to(1));
        assert!(!index.go_to(3));
        assert_eq!(index.current(), 1);
    }

    #[test]
    fn test_empty_index_never_moves() {
        let mut index = SlideIndex::new(0);
        index.next();
        index.previous();
        assert_eq!(index.current(), 0);
        assert!(index.is_empty());
        assert!(!index.go_to(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_on_interval() {
        let carousel = Carousel::start(3, TICK);
        assert_eq!(carousel.current(), 0);

        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(carousel.current(), 1);

        sleep(TICK * 2).await;
        assert_eq!(carousel.current(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_and_resume_restarts_countdown() {
        let carousel = Carousel::start(3, TICK);
        carousel.pause();

        sleep(Duration::from_secs(12)).await;
        assert_eq!(carousel.current(), 0);
        assert!(carousel.is_paused());

        carousel.resume();
        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(carousel.current(), 0);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(carousel.current(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_navigation() {
        let carousel = Carousel::start(4, TICK);
        carousel.previous();
        assert_eq!(carousel.current(), 3);
        assert!(carousel.go_to(2));
        assert!(!carousel.go_to(9));
        assert_eq!(carousel.current(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let carousel = Carousel::start(3, TICK);
        let rx = carousel.watch();
        drop(carousel);

        sleep(TICK * 3).await;
        assert_eq!(rx.borrow().index.current(), 0);
    }
}
