//! Timed rotation through a fixed list of items.

use std::{
    cell::{Ref, RefCell},
    rc::{Rc, Weak},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    host::{AnimationSink, AnimationStart, Direction, Registration, TimerHost},
    motion::{Easing, Tween, VisualState},
    PortfolioError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarouselEvent {
    Tick,
    Next,
    Previous,
}

/// Cursor change produced by one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Fixed, non-empty sequence with a wrapping cursor.
#[derive(Debug, Clone)]
pub struct Carousel<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>) -> Result<Self> {
        if items.is_empty() {
            return Err(PortfolioError::EmptyCarousel);
        }
        Ok(Self { items, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &T {
        &self.items[self.cursor]
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn tick(&mut self) -> usize {
        self.apply(CarouselEvent::Tick).to
    }

    pub fn next(&mut self) -> usize {
        self.apply(CarouselEvent::Next).to
    }

    pub fn previous(&mut self) -> usize {
        self.apply(CarouselEvent::Previous).to
    }

    pub fn apply(&mut self, event: CarouselEvent) -> Transition {
        let len = self.items.len();
        let from = self.cursor;
        self.cursor = match event {
            CarouselEvent::Tick | CarouselEvent::Next => (from + 1) % len,
            CarouselEvent::Previous => (from + len - 1) % len,
        };
        Transition {
            from,
            to: self.cursor,
        }
    }
}

/// Behavior of a carousel once it is mounted into a view.
#[derive(Debug, Clone)]
pub struct CarouselOptions {
    /// Element that displays the current item; its entrance replays on every
    /// cursor change.
    pub target: String,
    pub interval: Duration,
    pub reset_timer_on_manual: bool,
    pub entrance: Tween,
}

impl CarouselOptions {
    pub fn new(target: impl Into<String>, interval: Duration) -> Self {
        Self {
            target: target.into(),
            interval,
            reset_timer_on_manual: false,
            entrance: Tween::new(
                VisualState::hidden_below(30.0),
                VisualState::RESTING,
                Duration::from_millis(600),
                Easing::Power2Out,
            ),
        }
    }
}

struct Shared<T> {
    carousel: RefCell<Carousel<T>>,
    sink: Rc<dyn AnimationSink>,
    target: String,
    entrance: Tween,
}

impl<T> Shared<T> {
    fn apply(&self, event: CarouselEvent) -> Transition {
        let transition = self.carousel.borrow_mut().apply(event);
        tracing::trace!(?event, from = transition.from, to = transition.to, "carousel moved");

        if transition.changed() {
            self.sink.start(AnimationStart {
                source: format!("{}#{}", self.target, transition.to),
                target: self.target.clone(),
                offset: Duration::ZERO,
                direction: Direction::Forward,
                tween: self.entrance,
            });
        }
        transition
    }
}

/// A carousel driven by a host timer for the lifetime of its view.
pub struct MountedCarousel<T: 'static> {
    shared: Rc<Shared<T>>,
    timers: Rc<dyn TimerHost>,
    interval: Duration,
    reset_timer_on_manual: bool,
    timer: Option<Registration>,
}

impl<T: 'static> MountedCarousel<T> {
    /// Arms the rotation timer. The first item is shown without an entrance
    /// replay.
    pub fn mount(
        carousel: Carousel<T>,
        options: CarouselOptions,
        timers: Rc<dyn TimerHost>,
        sink: Rc<dyn AnimationSink>,
    ) -> Self {
        let shared = Rc::new(Shared {
            carousel: RefCell::new(carousel),
            sink,
            target: options.target,
            entrance: options.entrance,
        });

        let mut mounted = Self {
            shared,
            timers,
            interval: options.interval,
            reset_timer_on_manual: options.reset_timer_on_manual,
            timer: None,
        };
        mounted.arm();
        mounted
    }

    fn arm(&mut self) {
        // Release the previous timer before arming a new one.
        self.timer.take();

        let weak: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        self.timer = Some(self.timers.set_interval(
            self.interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.apply(CarouselEvent::Tick);
                }
            }),
        ));
    }

    pub fn cursor(&self) -> usize {
        self.shared.carousel.borrow().cursor()
    }

    pub fn len(&self) -> usize {
        self.shared.carousel.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current(&self) -> Ref<'_, T> {
        Ref::map(self.shared.carousel.borrow(), Carousel::current)
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn next(&mut self) -> usize {
        self.manual(CarouselEvent::Next)
    }

    pub fn previous(&mut self) -> usize {
        self.manual(CarouselEvent::Previous)
    }

    fn manual(&mut self, event: CarouselEvent) -> usize {
        let transition = self.shared.apply(event);
        if self.reset_timer_on_manual {
            self.arm();
        }
        transition.to
    }

    /// Cancels the rotation timer.
    pub fn unmount(mut self) {
        if let Some(timer) = self.timer.take() {
            timer.release();
        }
    }
}

impl<T: 'static> std::fmt::Debug for MountedCarousel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedCarousel")
            .field("cursor", &self.cursor())
            .field("len", &self.len())
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
