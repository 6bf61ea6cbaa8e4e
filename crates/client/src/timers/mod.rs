//! Background timers: carousel auto-advance and current-period polling.
//!
//! Both spawn a tokio task and abort it when their handle is dropped.

pub mod carousel;
pub mod period;

pub use carousel::{Carousel, CarouselState, SlideIndex};
pub use period::{PeriodRefresher, RefreshOutcome};
