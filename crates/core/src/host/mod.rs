//! Capabilities the presentation model consumes from its host runtime.
//!
//! A browser shell would back these with `setInterval`, an
//! `IntersectionObserver` and a tweening library. [`SimulatedHost`] backs them
//! with a virtual clock and scroll position so the behavior can be driven
//! deterministically from tests and the command line preview.

mod simulated;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{motion::Tween, PortfolioError, Result};

pub use simulated::{ElementRect, SimulatedHost};

/// Handle to a host-side timer or observation. Dropping the handle removes
/// the registration before `drop` returns.
pub struct Registration {
    id: u64,
    release: Option<Box<dyn FnOnce()>>,
}

impl Registration {
    pub fn new(id: u64, release: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Releases the registration now. Equivalent to dropping it.
    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Clock and repeating-callback capability.
pub trait TimerHost {
    /// Time elapsed since the host started.
    fn now(&self) -> Duration;

    /// Schedules `callback` every `period` until the returned registration is
    /// released.
    fn set_interval(&self, period: Duration, callback: Box<dyn FnMut()>) -> Registration;
}

/// Direction in which an element moved across its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    /// Scrolling down brought the element past the threshold.
    Forward,
    /// Scrolling back up moved it before the threshold again.
    Backward,
}

/// Point at which an element counts as revealed: the line at
/// `element_fraction` of the element's height meets the line at
/// `viewport_fraction` of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub element_fraction: f32,
    pub viewport_fraction: f32,
}

impl Threshold {
    /// Triggers once `amount` of the element is above the viewport bottom.
    pub fn visible_amount(amount: f32) -> Self {
        Self {
            element_fraction: amount.clamp(0.0, 1.0),
            viewport_fraction: 1.0,
        }
    }

    /// Parses the `"<edge> <percent>%"` form, e.g. `"top 80%"`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parts = source.split_whitespace();
        let (Some(edge), Some(position), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PortfolioError::InvalidInput(
                "threshold must be `<edge> <percent>%`",
            ));
        };

        let element_fraction = match edge {
            "top" => 0.0,
            "center" => 0.5,
            "bottom" => 1.0,
            _ => {
                return Err(PortfolioError::InvalidInput(
                    "threshold edge must be top, center or bottom",
                ))
            }
        };

        let percent: f32 = position
            .strip_suffix('%')
            .and_then(|value| value.parse().ok())
            .ok_or(PortfolioError::InvalidInput(
                "threshold position must be a percentage",
            ))?;

        Ok(Self {
            element_fraction,
            viewport_fraction: percent / 100.0,
        })
    }

    /// Scroll offset at which an element occupying `top..top + height` in
    /// document coordinates crosses this threshold.
    pub fn trigger_scroll(&self, top: f32, height: f32, viewport_height: f32) -> f32 {
        top + height * self.element_fraction - viewport_height * self.viewport_fraction
    }
}

/// Viewport-intersection capability.
pub trait IntersectionHost {
    /// Invokes `callback` every time `target` crosses `threshold`, until the
    /// returned registration is released. A target that is already past the
    /// threshold when observed reports a forward crossing straight away.
    fn observe(
        &self,
        target: &str,
        threshold: Threshold,
        callback: Box<dyn FnMut(Crossing)>,
    ) -> Registration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

/// Request to transition one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationStart {
    /// Group, timeline or component that issued the request.
    pub source: String,
    pub target: String,
    /// Delay relative to the moment the request is issued.
    #[serde(with = "crate::motion::duration_secs")]
    pub offset: Duration,
    pub direction: Direction,
    pub tween: Tween,
}

/// Presentation capability that plays transitions on elements.
pub trait AnimationSink {
    fn start(&self, animation: AnimationStart);
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn registration_releases_once() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let registration = Registration::new(7, move || counter.set(counter.get() + 1));
        assert_eq!(registration.id(), 7);

        registration.release();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dropping_registration_releases() {
        let released = Rc::new(Cell::new(false));
        let flag = released.clone();
        {
            let _registration = Registration::new(1, move || flag.set(true));
        }
        assert!(released.get());
    }

    #[test]
    fn parses_edge_and_percent() {
        let threshold = Threshold::parse("top 80%").unwrap();
        assert_eq!(threshold.element_fraction, 0.0);
        assert!((threshold.viewport_fraction - 0.8).abs() < 1e-6);

        let threshold = Threshold::parse("bottom 20%").unwrap();
        assert_eq!(threshold.element_fraction, 1.0);
    }

    #[test]
    fn rejects_malformed_thresholds() {
        assert!(Threshold::parse("top").is_err());
        assert!(Threshold::parse("left 10%").is_err());
        assert!(Threshold::parse("top 80").is_err());
        assert!(Threshold::parse("top 80% extra").is_err());
    }

    #[test]
    fn computes_trigger_scroll() {
        let threshold = Threshold::parse("top 80%").unwrap();
        // element at 1000px, viewport 500px: top reaches 80% when scrolled 600px
        assert_eq!(threshold.trigger_scroll(1_000.0, 300.0, 500.0), 600.0);

        let amount = Threshold::visible_amount(0.2);
        assert_eq!(amount.trigger_scroll(1_000.0, 300.0, 500.0), 560.0);
    }
}
