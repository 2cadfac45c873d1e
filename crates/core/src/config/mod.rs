use std::{path::Path, time::Duration};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
}

impl SiteConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads the configuration from `path`, falling back to defaults for any
    /// table the file leaves out.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded site configuration");
        Ok(config)
    }
}

/// Document-level settings used by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub lang: String,
    /// Year printed in the footer. Uses the current year when unset.
    pub copyright_year: Option<i32>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            lang: "en".to_string(),
            copyright_year: None,
        }
    }
}

impl PageConfig {
    pub fn copyright_year(&self) -> i32 {
        self.copyright_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }
}

/// Configuration for the testimonial rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub interval_ms: u64,
    /// When set, a manual next/previous re-arms the timer so the following
    /// automatic tick is a full period away.
    pub reset_timer_on_manual: bool,
    pub entrance_duration_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval_ms: 6_000,
            reset_timer_on_manual: false,
            entrance_duration_ms: 600,
        }
    }
}

impl CarouselConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn entrance_duration(&self) -> Duration {
        Duration::from_millis(self.entrance_duration_ms)
    }
}

/// Configuration for the decorative background layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub enabled: bool,
    pub star_count: usize,
    /// Edge length of the cube the stars are scattered in.
    pub spread: f32,
    pub seed: u64,
    pub frame_interval_ms: u64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            star_count: 5_000,
            spread: 2_000.0,
            seed: 0x5EED,
            frame_interval_ms: 16,
        }
    }
}

impl BackgroundConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}
