//! Immutable content records rendered by the static sections.
//!
//! Everything the page displays is loaded once from TOML into
//! [`SiteContent`] and handed to the components that render it. Nothing in
//! here is mutated after [`SiteContent::validate`] succeeds.

use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{PortfolioError, Result};

const BUILTIN_CONTENT: &str = include_str!("../../content/site.toml");

/// Highest rating a testimonial may carry.
pub const MAX_RATING: u8 = 5;

/// Closed set of icons the presentation layer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Github,
    Linkedin,
    Instagram,
    Mail,
    Phone,
    MapPin,
    Code,
    Palette,
    Zap,
    Users,
    Award,
    Coffee,
    Star,
    ExternalLink,
    ArrowDown,
    Send,
    Heart,
}

impl Icon {
    pub fn name(self) -> &'static str {
        match self {
            Icon::Github => "github",
            Icon::Linkedin => "linkedin",
            Icon::Instagram => "instagram",
            Icon::Mail => "mail",
            Icon::Phone => "phone",
            Icon::MapPin => "map-pin",
            Icon::Code => "code",
            Icon::Palette => "palette",
            Icon::Zap => "zap",
            Icon::Users => "users",
            Icon::Award => "award",
            Icon::Coffee => "coffee",
            Icon::Star => "star",
            Icon::ExternalLink => "external-link",
            Icon::ArrowDown => "arrow-down",
            Icon::Send => "send",
            Icon::Heart => "heart",
        }
    }
}

/// Opaque handle to an image or other static asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of destination a [`LinkTarget`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Anchor,
    Mail,
    Phone,
    Web,
}

/// Validated link destination, passed to the host verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkTarget {
    href: String,
    kind: LinkKind,
}

impl LinkTarget {
    pub fn parse(href: &str) -> Result<Self> {
        let invalid = |reason: &str| PortfolioError::InvalidLink {
            href: href.to_string(),
            reason: reason.to_string(),
        };

        if href.starts_with('#') {
            return Ok(Self {
                href: href.to_string(),
                kind: LinkKind::Anchor,
            });
        }

        let url = Url::parse(href).map_err(|err| invalid(&err.to_string()))?;
        let kind = match url.scheme() {
            "mailto" => LinkKind::Mail,
            "tel" => LinkKind::Phone,
            "http" | "https" if url.host().is_some() => LinkKind::Web,
            "http" | "https" => return Err(invalid("missing host")),
            other => return Err(invalid(&format!("unsupported scheme `{other}`"))),
        };

        Ok(Self {
            href: href.to_string(),
            kind,
        })
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// External web links open in a new browsing context.
    pub fn opens_new_tab(&self) -> bool {
        self.kind == LinkKind::Web
    }
}

impl TryFrom<String> for LinkTarget {
    type Error = PortfolioError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LinkTarget> for String {
    fn from(value: LinkTarget) -> Self {
        value.href
    }
}

/// A project, skill or testimonial entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<AssetRef>,
    #[serde(default)]
    pub icon: Option<Icon>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub link: Option<LinkTarget>,
    #[serde(default)]
    pub featured: bool,
    /// Auxiliary labels keyed by kind, e.g. `tech`, `tools` or `rating`.
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl DisplayItem {
    pub fn tag(&self, key: &str) -> &[String] {
        self.tags.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Star rating for testimonials. `None` when the tag is absent or not a
    /// number.
    pub fn rating(&self) -> Option<u8> {
        self.tag("rating").first()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub icon: Icon,
    pub label: String,
    pub href: LinkTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub icon: Icon,
    pub label: String,
    pub value: String,
    pub href: LinkTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub icon: Icon,
    pub number: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub name: String,
    pub href: LinkTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub roles: Vec<String>,
    pub tagline: String,
    pub headshot: AssetRef,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
    pub heading: String,
    pub intro: String,
    pub skills: Vec<DisplayItem>,
    #[serde(default)]
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSection {
    pub heading: String,
    pub intro: String,
    #[serde(default)]
    pub web_projects: Vec<DisplayItem>,
    #[serde(default)]
    pub graphic_projects: Vec<DisplayItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsSection {
    pub heading: String,
    pub intro: String,
    pub testimonials: Vec<DisplayItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSection {
    pub heading: String,
    pub intro: String,
    pub blurb: String,
    #[serde(default)]
    pub entries: Vec<ContactEntry>,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterSection {
    pub blurb: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
    #[serde(default)]
    pub quick_links: Vec<NavLink>,
}

/// All content displayed on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    pub profile: Profile,
    pub about: AboutSection,
    pub portfolio: PortfolioSection,
    pub reviews: ReviewsSection,
    pub contact: ContactSection,
    pub footer: FooterSection,
}

impl SiteContent {
    /// Content bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONTENT)
    }

    /// Parses and validates content from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let content: Self = toml::from_str(source)?;
        content.validate()?;
        Ok(content)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let content = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded site content");
        Ok(content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.profile.name.trim().is_empty() {
            return Err(PortfolioError::InvalidInput("profile name must not be empty"));
        }

        if self.reviews.testimonials.is_empty() {
            return Err(PortfolioError::EmptyCarousel);
        }

        for testimonial in &self.reviews.testimonials {
            match testimonial.rating() {
                Some(rating) if (1..=MAX_RATING).contains(&rating) => {}
                _ => {
                    return Err(PortfolioError::msg(format!(
                        "testimonial `{}` needs a rating between 1 and {MAX_RATING}",
                        testimonial.title
                    )))
                }
            }
        }

        if let Some(project) = self
            .portfolio
            .web_projects
            .iter()
            .find(|project| project.link.is_none())
        {
            return Err(PortfolioError::msg(format!(
                "web project `{}` is missing a live link",
                project.title
            )));
        }

        Ok(())
    }

    /// Every asset referenced anywhere in the content, in display order.
    pub fn asset_refs(&self) -> Vec<&AssetRef> {
        let items = self
            .about
            .skills
            .iter()
            .chain(&self.portfolio.web_projects)
            .chain(&self.portfolio.graphic_projects)
            .chain(&self.reviews.testimonials);

        std::iter::once(&self.profile.headshot)
            .chain(items.filter_map(|item| item.image.as_ref()))
            .collect()
    }
}
