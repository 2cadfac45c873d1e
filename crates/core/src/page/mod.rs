//! The page as a tree of sections with their reveal groups, intro timeline,
//! testimonial carousel and background, and the mount span that owns all of
//! their host registrations.

use std::{rc::Rc, time::Duration};

use serde::Serialize;

use crate::{
    background::{AmbientDriver, BackgroundScene},
    carousel::{Carousel, CarouselOptions, MountedCarousel},
    config::SiteConfig,
    content::{DisplayItem, SiteContent},
    host::{AnimationSink, IntersectionHost, Threshold, TimerHost},
    lightbox::Lightbox,
    motion::{Easing, Tween, VisualState},
    reveal::{MountedReveal, RevealGroup, RevealSpec},
    timeline::{MountedTimeline, Position, ScheduledEvent, Segment, Timeline},
    Result,
};

/// Element that shows the current testimonial.
pub const REVIEW_CARD_ID: &str = "reviews-card";

/// Top-level sections in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Home,
    About,
    Portfolio,
    Reviews,
    Contact,
    Footer,
}

impl SectionId {
    pub const ALL: [SectionId; 6] = [
        SectionId::Home,
        SectionId::About,
        SectionId::Portfolio,
        SectionId::Reviews,
        SectionId::Contact,
        SectionId::Footer,
    ];

    pub fn anchor(self) -> &'static str {
        match self {
            SectionId::Home => "home",
            SectionId::About => "about",
            SectionId::Portfolio => "portfolio",
            SectionId::Reviews => "reviews",
            SectionId::Contact => "contact",
            SectionId::Footer => "footer",
        }
    }
}

/// Id of the `index`-th child of `container`.
pub fn child_id(container: &str, index: usize) -> String {
    format!("{container}-{index}")
}

fn child_ids(container: &str, count: usize) -> Vec<String> {
    (0..count).map(|index| child_id(container, index)).collect()
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn fade_up_once(container: &str, count: usize) -> RevealGroup {
    RevealGroup::new(
        container,
        child_ids(container, count),
        RevealSpec::spring_fade_up(50.0, millis(200), millis(100)),
    )
}

fn reveal_groups(content: &SiteContent) -> Vec<RevealGroup> {
    let top_80 = Threshold {
        element_fraction: 0.0,
        viewport_fraction: 0.8,
    };
    let top_70 = Threshold {
        element_fraction: 0.0,
        viewport_fraction: 0.7,
    };

    vec![
        fade_up_once("about-heading", 2),
        RevealGroup::new(
            "about-skills",
            child_ids("about-skills", content.about.skills.len()),
            RevealSpec::scroll_toggled(
                VisualState::hidden_below(100.0).with_rotation_x(-90.0),
                millis(1_000),
                millis(200),
                top_80,
            ),
        ),
        fade_up_once("about-stats", content.about.stats.len()),
        fade_up_once("portfolio-heading", 2),
        fade_up_once("portfolio-web-title", 1),
        RevealGroup::new(
            "portfolio-web",
            child_ids("portfolio-web", content.portfolio.web_projects.len()),
            RevealSpec::scroll_toggled(
                VisualState::hidden_below(80.0).with_scale(0.9),
                millis(1_200),
                millis(300),
                top_70,
            ),
        ),
        fade_up_once("portfolio-graphic-title", 1),
        fade_up_once("portfolio-graphic", content.portfolio.graphic_projects.len()),
        RevealGroup::new(
            "reviews-heading",
            child_ids("reviews-heading", 2),
            RevealSpec::spring_fade_up(40.0, millis(200), Duration::ZERO)
                .with_easing(Easing::Power2Out)
                .with_duration(millis(600)),
        ),
        fade_up_once("contact-heading", 2),
        fade_up_once("contact-info", 3),
        RevealGroup::new(
            "contact-form",
            child_ids("contact-form", 4),
            RevealSpec::scroll_toggled(
                VisualState::hidden_below(0.0)
                    .with_x(-50.0)
                    .with_rotation_y(-15.0),
                millis(1_000),
                millis(150),
                top_80,
            ),
        ),
        RevealGroup::new(
            "footer-columns",
            child_ids("footer-columns", 4),
            RevealSpec::spring_fade_up(20.0, millis(200), Duration::ZERO)
                .with_easing(Easing::Power2Out)
                .with_duration(millis(600)),
        ),
    ]
}

fn intro_timeline(content: &SiteContent) -> Timeline {
    let text = Tween::new(
        VisualState::hidden_below(50.0).with_blur(10.0),
        VisualState::RESTING,
        millis(1_000),
        Easing::Power3Out,
    );
    let headshot = Tween::new(
        VisualState::hidden_below(0.0)
            .with_scale(0.8)
            .with_rotation(-10.0),
        VisualState::RESTING,
        millis(1_200),
        Easing::BackOut(1.7),
    );
    let buttons = Tween::new(
        VisualState::hidden_below(30.0),
        VisualState::RESTING,
        millis(800),
        Easing::Power2Out,
    );
    let socials = Tween::new(
        VisualState::hidden_below(0.0).with_x(-20.0),
        VisualState::RESTING,
        millis(300),
        Easing::EaseInOut,
    );

    Timeline::new("hero-intro")
        .then(Segment::new("text", child_ids("hero-text", 3), text).staggered(millis(200)))
        .then(
            Segment::new("headshot", vec!["hero-headshot".to_string()], headshot)
                .at(Position::Overlap(millis(500))),
        )
        .then(
            Segment::new("actions", child_ids("hero-actions", 2), buttons)
                .staggered(millis(100))
                .at(Position::Overlap(millis(300))),
        )
        .then(
            Segment::new(
                "socials",
                child_ids("hero-socials", content.profile.socials.len()),
                socials,
            )
            .staggered(millis(100))
            .at(Position::At(Duration::ZERO)),
        )
}

/// Serializable description of the page's behavior for a browser shell.
#[derive(Debug, Clone, Serialize)]
pub struct PageManifest<'a> {
    pub sections: Vec<&'static str>,
    pub reveal_groups: &'a [RevealGroup],
    pub intro: Vec<ScheduledEvent>,
    pub carousel: CarouselManifest,
    pub background: BackgroundManifest,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarouselManifest {
    pub target: &'static str,
    pub items: usize,
    pub interval_ms: u64,
    pub reset_timer_on_manual: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundManifest {
    pub enabled: bool,
    pub z_index: i32,
    pub star_count: usize,
}

/// Content and configuration resolved into the page's components.
#[derive(Debug, Clone)]
pub struct PageModel {
    content: SiteContent,
    config: SiteConfig,
    reveal_groups: Vec<RevealGroup>,
    intro: Timeline,
}

impl PageModel {
    pub fn new(content: SiteContent, config: SiteConfig) -> Self {
        let reveal_groups = reveal_groups(&content);
        let intro = intro_timeline(&content);
        Self {
            content,
            config,
            reveal_groups,
            intro,
        }
    }

    pub fn content(&self) -> &SiteContent {
        &self.content
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn reveal_groups(&self) -> &[RevealGroup] {
        &self.reveal_groups
    }

    pub fn reveal_group(&self, container: &str) -> Option<&RevealGroup> {
        self.reveal_groups
            .iter()
            .find(|group| group.container == container)
    }

    pub fn intro(&self) -> &Timeline {
        &self.intro
    }

    pub fn manifest(&self) -> PageManifest<'_> {
        PageManifest {
            sections: SectionId::ALL.iter().map(|section| section.anchor()).collect(),
            reveal_groups: &self.reveal_groups,
            intro: self.intro.schedule(),
            carousel: CarouselManifest {
                target: REVIEW_CARD_ID,
                items: self.content.reviews.testimonials.len(),
                interval_ms: self.config.carousel.interval_ms,
                reset_timer_on_manual: self.config.carousel.reset_timer_on_manual,
            },
            background: BackgroundManifest {
                enabled: self.config.background.enabled,
                z_index: crate::background::LAYER_Z_INDEX,
                star_count: self.config.background.star_count,
            },
        }
    }

    /// Mounts every behavioral component against `host`. The returned value
    /// owns all host registrations made here.
    pub fn mount<H>(&self, host: Rc<H>) -> Result<MountedPage>
    where
        H: TimerHost + IntersectionHost + AnimationSink + 'static,
    {
        let timers: Rc<dyn TimerHost> = host.clone();
        let sink: Rc<dyn AnimationSink> = host.clone();

        let carousel = Carousel::new(self.content.reviews.testimonials.clone())?;
        let mut options = CarouselOptions::new(REVIEW_CARD_ID, self.config.carousel.interval());
        options.reset_timer_on_manual = self.config.carousel.reset_timer_on_manual;
        options.entrance.duration = self.config.carousel.entrance_duration();

        let background = self.config.background.enabled.then(|| {
            AmbientDriver::start(
                BackgroundScene::from_config(&self.config.background),
                timers.clone(),
                self.config.background.frame_interval(),
            )
        });

        let intro = MountedTimeline::mount(
            &self.intro,
            self.config.background.frame_interval(),
            timers.as_ref(),
            sink.clone(),
        );

        let reveals = self
            .reveal_groups
            .iter()
            .cloned()
            .map(|group| MountedReveal::mount(group, host.as_ref(), sink.clone()))
            .collect();

        let reviews = MountedCarousel::mount(carousel, options, timers, sink);

        tracing::info!(
            reveal_groups = self.reveal_groups.len(),
            testimonials = reviews.len(),
            background = background.is_some(),
            "page mounted"
        );

        Ok(MountedPage {
            background,
            intro,
            reveals,
            reviews,
            lightbox: Lightbox::new(self.content.portfolio.graphic_projects.len()),
        })
    }
}

/// A page bound to its host. Unmounting releases every timer and
/// observation the page registered.
#[derive(Debug)]
pub struct MountedPage {
    background: Option<AmbientDriver>,
    intro: MountedTimeline,
    reveals: Vec<MountedReveal>,
    reviews: MountedCarousel<DisplayItem>,
    lightbox: Lightbox,
}

impl MountedPage {
    pub fn background(&self) -> Option<&AmbientDriver> {
        self.background.as_ref()
    }

    pub fn intro(&self) -> &MountedTimeline {
        &self.intro
    }

    pub fn reveals(&self) -> &[MountedReveal] {
        &self.reveals
    }

    pub fn reveal(&self, container: &str) -> Option<&MountedReveal> {
        self.reveals
            .iter()
            .find(|reveal| reveal.container() == container)
    }

    pub fn reviews(&self) -> &MountedCarousel<DisplayItem> {
        &self.reviews
    }

    pub fn reviews_mut(&mut self) -> &mut MountedCarousel<DisplayItem> {
        &mut self.reviews
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }

    pub fn unmount(self) {
        let Self {
            background,
            intro,
            reveals,
            reviews,
            lightbox: _,
        } = self;

        reviews.unmount();
        for reveal in reveals {
            reveal.unmount();
        }
        intro.unmount();
        if let Some(mut background) = background {
            background.stop();
        }
        tracing::info!("page unmounted");
    }
}
