use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    host::{AnimationSink, AnimationStart, Direction, Registration, TimerHost},
    motion::{duration_secs, Tween},
};

#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    elapsed: Duration,
}

impl PlaybackClock {
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
    }
}

/// Where a segment starts relative to the rest of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Right after the previous segment ends.
    AfterPrevious,
    /// The given amount before the previous segment ends.
    Overlap(#[serde(with = "duration_secs")] Duration),
    /// At an absolute time from the start of the timeline.
    At(#[serde(with = "duration_secs")] Duration),
}

/// One tween applied to a list of targets with a per-target stagger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub targets: Vec<String>,
    pub tween: Tween,
    #[serde(with = "duration_secs")]
    pub stagger: Duration,
    pub position: Position,
}

impl Segment {
    pub fn new(label: impl Into<String>, targets: Vec<String>, tween: Tween) -> Self {
        Self {
            label: label.into(),
            targets,
            tween,
            stagger: Duration::ZERO,
            position: Position::AfterPrevious,
        }
    }

    pub fn staggered(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Time from the segment's start until its last target settles.
    pub fn span(&self) -> Duration {
        let extra = self.targets.len().saturating_sub(1) as u32;
        self.stagger * extra + self.tween.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    #[serde(with = "duration_secs")]
    pub time: Duration,
    pub label: String,
    pub target: String,
    pub tween: Tween,
}

/// Ordered sequence of segments, resolved to absolute start times.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub name: String,
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }

    pub fn then(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start time of every segment, in insertion order.
    pub fn segment_starts(&self) -> Vec<Duration> {
        let mut previous_end = Duration::ZERO;
        self.segments
            .iter()
            .map(|segment| {
                let start = match segment.position {
                    Position::AfterPrevious => previous_end,
                    Position::Overlap(overlap) => previous_end.saturating_sub(overlap),
                    Position::At(at) => at,
                };
                previous_end = start + segment.span();
                start
            })
            .collect()
    }

    /// One event per target, sorted by start time.
    pub fn schedule(&self) -> Vec<ScheduledEvent> {
        let mut events: Vec<ScheduledEvent> = self
            .segments
            .iter()
            .zip(self.segment_starts())
            .flat_map(|(segment, start)| {
                segment
                    .targets
                    .iter()
                    .enumerate()
                    .map(move |(index, target)| ScheduledEvent {
                        time: start + segment.stagger * index as u32 + segment.tween.delay,
                        label: segment.label.clone(),
                        target: target.clone(),
                        tween: Tween {
                            delay: Duration::ZERO,
                            ..segment.tween
                        },
                    })
            })
            .collect();
        events.sort_by_key(|event| event.time);
        events
    }

    pub fn total_duration(&self) -> Duration {
        self.segments
            .iter()
            .zip(self.segment_starts())
            .map(|(segment, start)| start + segment.span())
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    events: Vec<ScheduledEvent>,
    next_event: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_events(&mut self, events: Vec<ScheduledEvent>) {
        self.events = events;
        self.events.sort_by_key(|event| event.time);
        self.next_event = 0;
    }

    pub fn is_finished(&self) -> bool {
        self.next_event >= self.events.len()
    }

    /// Returns every event that has become due since the previous tick.
    pub fn tick(&mut self, clock: &PlaybackClock) -> &[ScheduledEvent] {
        let first = self.next_event;
        while let Some(event) = self.events.get(self.next_event) {
            if clock.elapsed() < event.time {
                break;
            }
            self.next_event += 1;
        }
        &self.events[first..self.next_event]
    }
}

struct Playback {
    name: String,
    clock: PlaybackClock,
    scheduler: Scheduler,
    sink: Rc<dyn AnimationSink>,
    registration: Option<Registration>,
}

impl Playback {
    fn step(&mut self, delta: Duration) {
        self.clock.advance(delta);
        for event in self.scheduler.tick(&self.clock) {
            tracing::trace!(
                timeline = %self.name,
                label = %event.label,
                target = %event.target,
                "timeline event due"
            );
            self.sink.start(AnimationStart {
                source: format!("{}:{}", self.name, event.label),
                target: event.target.clone(),
                offset: Duration::ZERO,
                direction: Direction::Forward,
                tween: event.tween,
            });
        }

        if self.scheduler.is_finished() {
            // Release the frame timer once the timeline has played out.
            self.registration.take();
        }
    }
}

/// A timeline played once from mount, stepped by a host frame timer.
pub struct MountedTimeline {
    playback: Rc<RefCell<Playback>>,
}

impl MountedTimeline {
    pub fn mount(
        timeline: &Timeline,
        frame_interval: Duration,
        timers: &dyn TimerHost,
        sink: Rc<dyn AnimationSink>,
    ) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.set_events(timeline.schedule());

        let playback = Rc::new(RefCell::new(Playback {
            name: timeline.name.clone(),
            clock: PlaybackClock::default(),
            scheduler,
            sink,
            registration: None,
        }));

        // Events due at time zero start with the mount itself.
        playback.borrow_mut().step(Duration::ZERO);

        if !playback.borrow().scheduler.is_finished() {
            let weak: Weak<RefCell<Playback>> = Rc::downgrade(&playback);
            let registration = timers.set_interval(
                frame_interval,
                Box::new(move || {
                    if let Some(playback) = weak.upgrade() {
                        playback.borrow_mut().step(frame_interval);
                    }
                }),
            );
            playback.borrow_mut().registration = Some(registration);
        }

        Self { playback }
    }

    pub fn is_finished(&self) -> bool {
        self.playback.borrow().scheduler.is_finished()
    }

    pub fn elapsed(&self) -> Duration {
        self.playback.borrow().clock.elapsed()
    }

    pub fn unmount(self) {
        let registration = self.playback.borrow_mut().registration.take();
        drop(registration);
    }
}

impl std::fmt::Debug for MountedTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let playback = self.playback.borrow();
        f.debug_struct("MountedTimeline")
            .field("name", &playback.name)
            .field("elapsed", &playback.clock.elapsed())
            .field("finished", &playback.scheduler.is_finished())
            .finish()
    }
}
