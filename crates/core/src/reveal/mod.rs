//! Reveal-on-scroll sequencing.
//!
//! A [`RevealGroup`] names a container and its children. Once mounted, the
//! container is observed through the host's [`IntersectionHost`] and the
//! children are animated from the hidden state to the resting state, one
//! after another, when the container crosses its threshold.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    host::{
        AnimationSink, AnimationStart, Crossing, Direction, IntersectionHost, Registration,
        Threshold,
    },
    motion::{duration_secs, Easing, Tween, VisualState},
};

/// How a group responds to crossings after its first reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Play on the first forward crossing, ignore everything afterwards.
    Once,
    /// Play on forward crossings and reverse on backward crossings.
    ToggleReverse,
}

/// Animation parameters shared by every child of a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealSpec {
    pub hidden: VisualState,
    pub resting: VisualState,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    #[serde(with = "duration_secs")]
    pub stagger: Duration,
    /// Extra delay before the first child starts.
    #[serde(with = "duration_secs")]
    pub delay_children: Duration,
    pub easing: Easing,
    pub threshold: Threshold,
    pub mode: TriggerMode,
}

impl RevealSpec {
    /// Fade up from `y` pixels below over a spring, revealed once when a
    /// fifth of the container is visible.
    pub fn spring_fade_up(y: f32, stagger: Duration, delay_children: Duration) -> Self {
        Self {
            hidden: VisualState::hidden_below(y),
            resting: VisualState::RESTING,
            duration: Duration::from_millis(800),
            stagger,
            delay_children,
            easing: Easing::Spring {
                damping: 20.0,
                stiffness: 100.0,
            },
            threshold: Threshold::visible_amount(0.2),
            mode: TriggerMode::Once,
        }
    }

    /// Scroll-scrubbed entrance that reverses when scrolled back past.
    pub fn scroll_toggled(
        hidden: VisualState,
        duration: Duration,
        stagger: Duration,
        threshold: Threshold,
    ) -> Self {
        Self {
            hidden,
            resting: VisualState::RESTING,
            duration,
            stagger,
            delay_children: Duration::ZERO,
            easing: Easing::Power3Out,
            threshold,
            mode: TriggerMode::ToggleReverse,
        }
    }

    pub fn with_mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    fn tween(&self) -> Tween {
        Tween::new(self.hidden, self.resting, self.duration, self.easing)
    }
}

/// A container element and the children it reveals in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealGroup {
    pub container: String,
    pub children: Vec<String>,
    pub spec: RevealSpec,
}

impl RevealGroup {
    pub fn new(container: impl Into<String>, children: Vec<String>, spec: RevealSpec) -> Self {
        Self {
            container: container.into(),
            children,
            spec,
        }
    }

    /// Animation requests for playing the group in `direction`. Forward
    /// plays in child order at `delay_children + index * stagger`; reverse
    /// unwinds from the last child without the initial delay.
    pub fn schedule(&self, direction: Direction) -> Vec<AnimationStart> {
        let forward = self.spec.tween();

        let start = |slot: usize, target: &String, tween: Tween, base: Duration| AnimationStart {
            source: self.container.clone(),
            target: target.clone(),
            offset: base + self.spec.stagger * slot as u32,
            direction,
            tween,
        };

        match direction {
            Direction::Forward => self
                .children
                .iter()
                .enumerate()
                .map(|(index, child)| start(index, child, forward, self.spec.delay_children))
                .collect(),
            Direction::Reverse => self
                .children
                .iter()
                .rev()
                .enumerate()
                .map(|(slot, child)| start(slot, child, forward.reversed(), Duration::ZERO))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Armed,
    Played,
    Reversed,
}

/// Crossing state machine for one group.
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    group: RevealGroup,
    phase: Phase,
    plays: u32,
}

impl RevealSequencer {
    pub fn new(group: RevealGroup) -> Self {
        Self {
            group,
            phase: Phase::Armed,
            plays: 0,
        }
    }

    pub fn group(&self) -> &RevealGroup {
        &self.group
    }

    /// Number of forward plays so far.
    pub fn plays(&self) -> u32 {
        self.plays
    }

    pub fn has_fired(&self) -> bool {
        self.plays > 0
    }

    /// Advances the state machine and returns the animations to start.
    pub fn on_crossing(&mut self, crossing: Crossing) -> Vec<AnimationStart> {
        if self.group.children.is_empty() {
            return Vec::new();
        }

        let direction = match (self.phase, crossing, self.group.spec.mode) {
            (Phase::Armed, Crossing::Forward, _) => Direction::Forward,
            (Phase::Reversed, Crossing::Forward, TriggerMode::ToggleReverse) => Direction::Forward,
            (Phase::Played, Crossing::Backward, TriggerMode::ToggleReverse) => Direction::Reverse,
            _ => return Vec::new(),
        };

        self.phase = match direction {
            Direction::Forward => {
                self.plays += 1;
                Phase::Played
            }
            Direction::Reverse => Phase::Reversed,
        };
        tracing::debug!(
            group = %self.group.container,
            ?direction,
            children = self.group.children.len(),
            "reveal group triggered"
        );

        self.group.schedule(direction)
    }
}

/// A sequencer bound to the host for the lifetime of its owning view.
#[derive(Debug)]
pub struct MountedReveal {
    sequencer: Rc<RefCell<RevealSequencer>>,
    registration: Registration,
}

impl MountedReveal {
    /// Registers the group's container with `observer`. Animations are
    /// handed to `sink` as crossings arrive.
    pub fn mount(
        group: RevealGroup,
        observer: &dyn IntersectionHost,
        sink: Rc<dyn AnimationSink>,
    ) -> Self {
        let container = group.container.clone();
        let threshold = group.spec.threshold;
        let sequencer = Rc::new(RefCell::new(RevealSequencer::new(group)));
        let weak: Weak<RefCell<RevealSequencer>> = Rc::downgrade(&sequencer);

        let registration = observer.observe(
            &container,
            threshold,
            Box::new(move |crossing| {
                // A host may still hold the callback after release.
                let Some(sequencer) = weak.upgrade() else {
                    return;
                };
                let starts = sequencer.borrow_mut().on_crossing(crossing);
                for start in starts {
                    sink.start(start);
                }
            }),
        );

        Self {
            sequencer,
            registration,
        }
    }

    pub fn container(&self) -> String {
        self.sequencer.borrow().group().container.clone()
    }

    pub fn has_fired(&self) -> bool {
        self.sequencer.borrow().has_fired()
    }

    pub fn plays(&self) -> u32 {
        self.sequencer.borrow().plays()
    }

    pub fn registration_id(&self) -> u64 {
        self.registration.id()
    }

    /// Releases the observation whether or not the group has fired.
    pub fn unmount(self) {
        let Self {
            sequencer,
            registration,
        } = self;
        registration.release();
        drop(sequencer);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use proptest::prelude::*;

    use super::*;
    use crate::host::{ElementRect, SimulatedHost};

    fn children(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("card-{i}")).collect()
    }

    fn group(count: usize, mode: TriggerMode) -> RevealGroup {
        RevealGroup::new(
            "cards",
            children(count),
            RevealSpec::scroll_toggled(
                VisualState::hidden_below(100.0).with_rotation_x(-90.0),
                Duration::from_secs(1),
                Duration::from_millis(200),
                Threshold::parse("top 80%").unwrap(),
            )
            .with_mode(mode),
        )
    }

    fn host_with_cards() -> SimulatedHost {
        let host = SimulatedHost::new(1_000.0);
        host.set_layout(
            "cards",
            ElementRect {
                top: 2_000.0,
                height: 600.0,
            },
        );
        host
    }

    #[test]
    fn staggers_children_in_order() {
        let mut sequencer = RevealSequencer::new(group(3, TriggerMode::Once));
        let starts = sequencer.on_crossing(Crossing::Forward);

        let targets: Vec<_> = starts.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, ["card-0", "card-1", "card-2"]);
        let offsets: Vec<_> = starts.iter().map(|s| s.offset).collect();
        assert_eq!(
            offsets,
            [
                Duration::ZERO,
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
        assert!(starts.iter().all(|s| s.direction == Direction::Forward));
    }

    #[test]
    fn delay_children_shifts_every_offset() {
        let spec = RevealSpec::spring_fade_up(
            50.0,
            Duration::from_millis(200),
            Duration::from_millis(100),
        );
        let group = RevealGroup::new("stats", children(2), spec);
        let offsets: Vec<_> = group
            .schedule(Direction::Forward)
            .iter()
            .map(|s| s.offset)
            .collect();
        assert_eq!(offsets, [Duration::from_millis(100), Duration::from_millis(300)]);
    }

    #[test]
    fn once_mode_ignores_later_crossings() {
        let mut sequencer = RevealSequencer::new(group(2, TriggerMode::Once));
        assert_eq!(sequencer.on_crossing(Crossing::Forward).len(), 2);
        assert!(sequencer.on_crossing(Crossing::Backward).is_empty());
        assert!(sequencer.on_crossing(Crossing::Forward).is_empty());
        assert_eq!(sequencer.plays(), 1);
    }

    #[test]
    fn toggle_mode_reverses_last_child_first() {
        let mut sequencer = RevealSequencer::new(group(3, TriggerMode::ToggleReverse));
        sequencer.on_crossing(Crossing::Forward);
        let reverse = sequencer.on_crossing(Crossing::Backward);

        let targets: Vec<_> = reverse.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, ["card-2", "card-1", "card-0"]);
        assert_eq!(reverse[0].offset, Duration::ZERO);
        assert_eq!(reverse[0].tween.to.opacity, 0.0);
        assert!(reverse.iter().all(|s| s.direction == Direction::Reverse));

        assert_eq!(sequencer.on_crossing(Crossing::Forward).len(), 3);
        assert_eq!(sequencer.plays(), 2);
    }

    #[test]
    fn backward_before_play_is_ignored() {
        let mut sequencer = RevealSequencer::new(group(3, TriggerMode::ToggleReverse));
        assert!(sequencer.on_crossing(Crossing::Backward).is_empty());
        assert!(!sequencer.has_fired());
    }

    #[test]
    fn empty_group_is_a_no_op() {
        let mut sequencer = RevealSequencer::new(group(0, TriggerMode::Once));
        assert!(sequencer.on_crossing(Crossing::Forward).is_empty());
    }

    #[test]
    fn mounted_group_plays_through_host() {
        let host = host_with_cards();
        let mounted = MountedReveal::mount(
            group(3, TriggerMode::Once),
            &host,
            Rc::new(host.clone()),
        );

        host.scroll_to(500.0);
        assert!(host.take_started().is_empty());

        host.scroll_to(1_300.0);
        assert_eq!(host.take_started().len(), 3);
        assert!(mounted.has_fired());

        host.scroll_to(0.0);
        host.scroll_to(1_300.0);
        assert!(host.take_started().is_empty());
        assert_eq!(mounted.container(), "cards");
    }

    #[test]
    fn group_in_view_at_mount_plays_without_scrolling() {
        let host = SimulatedHost::new(1_000.0);
        host.set_layout(
            "cards",
            ElementRect {
                top: 100.0,
                height: 300.0,
            },
        );
        let mounted = MountedReveal::mount(
            group(3, TriggerMode::Once),
            &host,
            Rc::new(host.clone()),
        );

        let started = host.take_started();
        assert_eq!(started.len(), 3);
        assert!(started.iter().all(|(_, s)| s.direction == Direction::Forward));
        assert!(mounted.has_fired());
    }

    #[test]
    fn unmount_before_crossing_never_animates() {
        let host = host_with_cards();
        let mounted = MountedReveal::mount(
            group(3, TriggerMode::Once),
            &host,
            Rc::new(host.clone()),
        );
        let id = mounted.registration_id();

        mounted.unmount();
        assert_eq!(host.active_observers(), 0);
        host.scroll_to(5_000.0);
        assert!(!host.deliver_crossing(id, Crossing::Forward));
        assert!(host.take_started().is_empty());
    }

    /// Host that keeps callbacks around after release, to exercise the
    /// liveness guard.
    #[derive(Default)]
    struct LeakyHost {
        callbacks: RefCell<Vec<Box<dyn FnMut(Crossing)>>>,
    }

    impl IntersectionHost for LeakyHost {
        fn observe(
            &self,
            _target: &str,
            _threshold: Threshold,
            callback: Box<dyn FnMut(Crossing)>,
        ) -> Registration {
            self.callbacks.borrow_mut().push(callback);
            Registration::new(1, || {})
        }
    }

    struct CountingSink(Cell<usize>);

    impl AnimationSink for CountingSink {
        fn start(&self, _animation: AnimationStart) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn stale_callback_after_unmount_is_ignored() {
        let host = LeakyHost::default();
        let sink = Rc::new(CountingSink(Cell::new(0)));
        let mounted = MountedReveal::mount(group(3, TriggerMode::Once), &host, sink.clone());

        mounted.unmount();
        for callback in host.callbacks.borrow_mut().iter_mut() {
            callback(Crossing::Forward);
        }
        assert_eq!(sink.0.get(), 0);
    }

    proptest! {
        #[test]
        fn once_mode_fires_exactly_once(crossings in 1usize..40, backward_every in 1usize..5) {
            let host = host_with_cards();
            let sink = Rc::new(CountingSink(Cell::new(0)));
            let mounted = MountedReveal::mount(group(3, TriggerMode::Once), &host, sink.clone());
            let id = mounted.registration_id();

            for i in 0..crossings {
                let crossing = if i % backward_every == backward_every - 1 && i > 0 {
                    Crossing::Backward
                } else {
                    Crossing::Forward
                };
                host.deliver_crossing(id, crossing);
            }

            prop_assert_eq!(mounted.plays(), 1);
            prop_assert_eq!(sink.0.get(), 3);
        }
    }
}
