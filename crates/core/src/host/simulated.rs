use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
    time::Duration,
};

use super::{
    AnimationSink, AnimationStart, Crossing, IntersectionHost, Registration, Threshold, TimerHost,
};

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f32,
    pub height: f32,
}

struct TimerEntry {
    period: Duration,
    next_due: Duration,
    callback: Option<Box<dyn FnMut()>>,
}

struct ObserverEntry {
    target: String,
    threshold: Threshold,
    past: bool,
    callback: Option<Box<dyn FnMut(Crossing)>>,
}

#[derive(Default)]
struct HostState {
    now: Duration,
    scroll_y: f32,
    viewport_height: f32,
    layout: HashMap<String, ElementRect>,
    next_id: u64,
    timers: BTreeMap<u64, TimerEntry>,
    observers: BTreeMap<u64, ObserverEntry>,
    started: Vec<(Duration, AnimationStart)>,
}

impl HostState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn earliest_due(&self, until: Duration) -> Option<(u64, Duration)> {
        self.timers
            .iter()
            .filter(|(_, timer)| timer.next_due <= until)
            .min_by_key(|(id, timer)| (timer.next_due, **id))
            .map(|(id, timer)| (*id, timer.next_due))
    }

    fn pending_crossing(&self, after: Option<u64>) -> Option<(u64, Crossing)> {
        let lower = after.map_or(0, |id| id + 1);
        self.observers.range(lower..).find_map(|(id, observer)| {
            let rect = self.layout.get(&observer.target)?;
            let trigger = observer
                .threshold
                .trigger_scroll(rect.top, rect.height, self.viewport_height);
            let past = self.scroll_y >= trigger;
            match (observer.past, past) {
                (false, true) => Some((*id, Crossing::Forward)),
                (true, false) => Some((*id, Crossing::Backward)),
                _ => None,
            }
        })
    }
}

/// Deterministic single-threaded host with a virtual clock and scroll
/// position. Callbacks run outside of any internal borrow, so they may
/// register, release or start animations re-entrantly.
#[derive(Clone)]
pub struct SimulatedHost {
    state: Rc<RefCell<HostState>>,
}

impl SimulatedHost {
    pub fn new(viewport_height: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                viewport_height,
                ..HostState::default()
            })),
        }
    }

    pub fn set_layout(&self, target: impl Into<String>, rect: ElementRect) {
        self.state.borrow_mut().layout.insert(target.into(), rect);
    }

    pub fn scroll_y(&self) -> f32 {
        self.state.borrow().scroll_y
    }

    pub fn active_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn active_observers(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Advances the virtual clock, firing every timer that falls due in
    /// chronological order.
    pub fn advance(&self, delta: Duration) {
        let until = self.state.borrow().now + delta;

        loop {
            let due = self.state.borrow().earliest_due(until);
            let Some((id, due)) = due else {
                break;
            };

            let callback = {
                let mut state = self.state.borrow_mut();
                state.now = due;
                state.timers.get_mut(&id).and_then(|timer| timer.callback.take())
            };
            let Some(mut callback) = callback else {
                // Re-entrant advance from inside this timer's own callback.
                if let Some(timer) = self.state.borrow_mut().timers.get_mut(&id) {
                    timer.next_due = due + timer.period;
                }
                continue;
            };

            callback();

            let mut state = self.state.borrow_mut();
            if let Some(timer) = state.timers.get_mut(&id) {
                timer.callback = Some(callback);
                timer.next_due = due + timer.period;
            }
        }

        self.state.borrow_mut().now = until;
    }

    /// Moves the viewport and delivers every resulting threshold crossing.
    pub fn scroll_to(&self, y: f32) {
        self.state.borrow_mut().scroll_y = y.max(0.0);
        self.refresh();
    }

    /// Re-evaluates all observations against the current scroll position.
    pub fn refresh(&self) {
        let mut cursor = None;
        loop {
            let pending = self.state.borrow().pending_crossing(cursor);
            let Some((id, crossing)) = pending else {
                break;
            };
            cursor = Some(id);

            let callback = {
                let mut state = self.state.borrow_mut();
                state.observers.get_mut(&id).and_then(|observer| {
                    observer.past = crossing == Crossing::Forward;
                    observer.callback.take()
                })
            };
            if let Some(callback) = callback {
                self.invoke_observer(id, callback, crossing);
            }
        }
    }

    /// Delivers `crossing` to the observation registered under `id`,
    /// regardless of layout. Returns `false` when no such registration is
    /// live.
    pub fn deliver_crossing(&self, id: u64, crossing: Crossing) -> bool {
        let callback = self
            .state
            .borrow_mut()
            .observers
            .get_mut(&id)
            .and_then(|observer| observer.callback.take());

        match callback {
            Some(callback) => {
                self.invoke_observer(id, callback, crossing);
                true
            }
            None => false,
        }
    }

    /// Drains every animation started so far, paired with the virtual time at
    /// which it was requested.
    pub fn take_started(&self) -> Vec<(Duration, AnimationStart)> {
        std::mem::take(&mut self.state.borrow_mut().started)
    }

    fn invoke_observer(&self, id: u64, mut callback: Box<dyn FnMut(Crossing)>, crossing: Crossing) {
        callback(crossing);

        let mut state = self.state.borrow_mut();
        if let Some(observer) = state.observers.get_mut(&id) {
            observer.callback = Some(callback);
        }
    }
}

impl std::fmt::Debug for SimulatedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SimulatedHost")
            .field("now", &state.now)
            .field("scroll_y", &state.scroll_y)
            .field("timers", &state.timers.len())
            .field("observers", &state.observers.len())
            .finish()
    }
}

impl TimerHost for SimulatedHost {
    fn now(&self) -> Duration {
        self.state.borrow().now
    }

    fn set_interval(&self, period: Duration, callback: Box<dyn FnMut()>) -> Registration {
        let period = period.max(Duration::from_millis(1));
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            let next_due = state.now + period;
            state.timers.insert(
                id,
                TimerEntry {
                    period,
                    next_due,
                    callback: Some(callback),
                },
            );
            id
        };
        tracing::trace!(id, ?period, "interval armed");

        let state = Rc::downgrade(&self.state);
        Registration::new(id, move || {
            if let Some(state) = state.upgrade() {
                // The entry owns its callback; drop it outside the borrow.
                let removed = state.borrow_mut().timers.remove(&id);
                drop(removed);
            }
        })
    }
}

impl IntersectionHost for SimulatedHost {
    fn observe(
        &self,
        target: &str,
        threshold: Threshold,
        callback: Box<dyn FnMut(Crossing)>,
    ) -> Registration {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            state.observers.insert(
                id,
                ObserverEntry {
                    target: target.to_string(),
                    threshold,
                    past: false,
                    callback: Some(callback),
                },
            );
            id
        };
        tracing::trace!(id, target, "observation registered");

        let state = Rc::downgrade(&self.state);
        let registration = Registration::new(id, move || {
            if let Some(state) = state.upgrade() {
                let removed = state.borrow_mut().observers.remove(&id);
                drop(removed);
            }
        });

        // An element already past its threshold crosses as soon as it is observed.
        self.refresh();
        registration
    }
}

impl AnimationSink for SimulatedHost {
    fn start(&self, animation: AnimationStart) {
        let mut state = self.state.borrow_mut();
        tracing::debug!(
            source = %animation.source,
            target = %animation.target,
            offset = ?animation.offset,
            direction = ?animation.direction,
            "animation started"
        );
        let now = state.now;
        state.started.push((now, animation));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        host::Direction,
        motion::{Easing, Tween, VisualState},
    };

    fn counter() -> (Rc<Cell<u32>>, Box<dyn FnMut()>) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, Box::new(move || inner.set(inner.get() + 1)))
    }

    #[test]
    fn fires_intervals_on_schedule() {
        let host = SimulatedHost::new(800.0);
        let (count, callback) = counter();
        let _timer = host.set_interval(Duration::from_secs(6), callback);

        host.advance(Duration::from_millis(5_999));
        assert_eq!(count.get(), 0);
        host.advance(Duration::from_millis(1));
        assert_eq!(count.get(), 1);
        host.advance(Duration::from_secs(12));
        assert_eq!(count.get(), 3);
        assert_eq!(host.now(), Duration::from_secs(18));
    }

    #[test]
    fn released_interval_stops_firing() {
        let host = SimulatedHost::new(800.0);
        let (count, callback) = counter();
        let timer = host.set_interval(Duration::from_secs(1), callback);
        host.advance(Duration::from_secs(2));
        assert_eq!(count.get(), 2);

        timer.release();
        assert_eq!(host.active_timers(), 0);
        host.advance(Duration::from_secs(10));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn delivers_crossings_in_both_directions() {
        let host = SimulatedHost::new(1_000.0);
        host.set_layout(
            "cards",
            ElementRect {
                top: 2_000.0,
                height: 400.0,
            },
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _observation = host.observe(
            "cards",
            Threshold::parse("top 80%").unwrap(),
            Box::new(move |crossing| sink.borrow_mut().push(crossing)),
        );

        host.scroll_to(1_100.0);
        host.scroll_to(1_300.0);
        host.scroll_to(1_250.0);
        host.scroll_to(0.0);

        assert_eq!(*seen.borrow(), vec![Crossing::Forward, Crossing::Backward]);
    }

    #[test]
    fn element_already_in_view_crosses_on_observe() {
        let host = SimulatedHost::new(1_000.0);
        host.set_layout(
            "hero-card",
            ElementRect {
                top: 100.0,
                height: 300.0,
            },
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _observation = host.observe(
            "hero-card",
            Threshold::parse("top 80%").unwrap(),
            Box::new(move |crossing| sink.borrow_mut().push(crossing)),
        );
        host.advance(Duration::from_secs(10));

        assert_eq!(*seen.borrow(), vec![Crossing::Forward]);
        assert_eq!(host.scroll_y(), 0.0);

        host.refresh();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn unknown_layout_never_crosses() {
        let host = SimulatedHost::new(1_000.0);
        let seen = Rc::new(Cell::new(false));
        let flag = seen.clone();
        let _observation = host.observe(
            "missing",
            Threshold::visible_amount(0.2),
            Box::new(move |_| flag.set(true)),
        );

        host.scroll_to(100_000.0);
        assert!(!seen.get());
    }

    #[test]
    fn detached_observation_is_not_delivered() {
        let host = SimulatedHost::new(1_000.0);
        let seen = Rc::new(Cell::new(false));
        let flag = seen.clone();
        let observation = host.observe(
            "form",
            Threshold::visible_amount(0.0),
            Box::new(move |_| flag.set(true)),
        );
        let id = observation.id();

        drop(observation);
        assert!(!host.deliver_crossing(id, Crossing::Forward));
        assert!(!seen.get());
        assert_eq!(host.active_observers(), 0);
    }

    #[test]
    fn callbacks_may_release_their_own_timer() {
        let host = SimulatedHost::new(800.0);
        let slot: Rc<RefCell<Option<Registration>>> = Rc::new(RefCell::new(None));
        let (count, mut tick) = counter();

        let inner_slot = slot.clone();
        let registration = host.set_interval(
            Duration::from_secs(1),
            Box::new(move || {
                tick();
                inner_slot.borrow_mut().take();
            }),
        );
        *slot.borrow_mut() = Some(registration);

        host.advance(Duration::from_secs(5));
        assert_eq!(count.get(), 1);
        assert_eq!(host.active_timers(), 0);
    }

    #[test]
    fn records_started_animations_with_time() {
        let host = SimulatedHost::new(800.0);
        host.advance(Duration::from_millis(250));
        host.start(AnimationStart {
            source: "test".into(),
            target: "el".into(),
            offset: Duration::ZERO,
            direction: Direction::Forward,
            tween: Tween::new(
                VisualState::hidden_below(10.0),
                VisualState::RESTING,
                Duration::from_millis(100),
                Easing::Linear,
            ),
        });

        let started = host.take_started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].0, Duration::from_millis(250));
        assert!(host.take_started().is_empty());
    }
}
