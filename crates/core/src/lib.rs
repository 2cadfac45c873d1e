//! Core library for the portfolio site.
//!
//! The crate models the page as fixed content plus a handful of behavioral
//! components: a reveal-on-scroll sequencer, a timed rotation carousel, the
//! hero intro timeline and an ambient background driver. Components talk to
//! the outside world only through the capability traits in [`host`], so the
//! whole page can be mounted, driven and unmounted against the deterministic
//! [`SimulatedHost`]. The [`render`] module turns the same model into static
//! HTML.

pub mod assets;
pub mod background;
pub mod carousel;
pub mod config;
pub mod content;
pub mod error;
pub mod host;
pub mod lightbox;
pub mod motion;
pub mod page;
pub mod render;
pub mod reveal;
pub mod timeline;

pub use assets::AssetStore;
pub use background::{AmbientDriver, BackgroundFrame, BackgroundScene};
pub use carousel::{Carousel, CarouselEvent, CarouselOptions, MountedCarousel};
pub use config::{BackgroundConfig, CarouselConfig, PageConfig, SiteConfig};
pub use content::{AssetRef, DisplayItem, Icon, LinkTarget, SiteContent};
pub use error::{PortfolioError, Result};
pub use host::{
    AnimationSink, AnimationStart, Crossing, Direction, IntersectionHost, Registration,
    SimulatedHost, Threshold, TimerHost,
};
pub use lightbox::Lightbox;
pub use motion::{Easing, Tween, VisualState};
pub use page::{MountedPage, PageModel, SectionId};
pub use render::{render_document, reveal_manifest};
pub use reveal::{MountedReveal, RevealGroup, RevealSequencer, RevealSpec, TriggerMode};
pub use timeline::{MountedTimeline, PlaybackClock, ScheduledEvent, Scheduler, Timeline};
