use std::fmt;
use std::str::FromStr;

/// Video quality tiers, highest first.
pub const VIDEO_QUALITY_TIERS: [&str; 4] = ["1080p", "720p", "480p", "360p"];
/// Audio quality tiers, highest first.
pub const AUDIO_QUALITY_TIERS: [&str; 4] = ["320kbps", "192kbps", "128kbps", "96kbps"];

const VIDEO_DEFAULT_TIER: &str = "720p";
const AUDIO_DEFAULT_TIER: &str = "128kbps";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Video,
    Audio,
}

impl MediaClass {
    pub fn quality_tiers(self) -> &'static [&'static str] {
        match self {
            MediaClass::Video => &VIDEO_QUALITY_TIERS,
            MediaClass::Audio => &AUDIO_QUALITY_TIERS,
        }
    }

    /// The most compatible tier, not the highest one.
    pub fn default_tier(self) -> &'static str {
        match self {
            MediaClass::Video => VIDEO_DEFAULT_TIER,
            MediaClass::Audio => AUDIO_DEFAULT_TIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    #[default]
    Mp4,
    Webm,
    Mp3,
    M4a,
}

impl Container {
    pub const ALL: [Container; 4] = [Container::Mp4, Container::Webm, Container::Mp3, Container::M4a];

    pub fn class(self) -> MediaClass {
        match self {
            Container::Mp4 | Container::Webm => MediaClass::Video,
            Container::Mp3 | Container::M4a => MediaClass::Audio,
        }
    }

    /// Wire name sent to the backend as `format`.
    pub fn as_str(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Container::ALL
            .into_iter()
            .find(|container| container.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown format '{s}' (expected mp4, webm, mp3 or m4a)"))
    }
}

/// Container and quality selection. The quality always belongs to the
/// vocabulary of the container's class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPreference {
    container: Container,
    quality: &'static str,
}

impl Default for MediaPreference {
    fn default() -> Self {
        let container = Container::default();
        Self {
            container,
            quality: container.class().default_tier(),
        }
    }
}

impl MediaPreference {
    pub fn container(&self) -> Container {
        self.container
    }

    pub fn quality(&self) -> &'static str {
        self.quality
    }

    pub fn quality_tiers(&self) -> &'static [&'static str] {
        self.container.class().quality_tiers()
    }

    pub fn set_container(&mut self, container: Container) {
        let class_changed = container.class() != self.container.class();
        self.container = container;
        if class_changed {
            self.quality = container.class().default_tier();
        }
    }

    /// Returns `false` and leaves the selection untouched when `tier` is not
    /// offered for the current container class.
    pub fn set_quality(&mut self, tier: &str) -> bool {
        match self.quality_tiers().iter().copied().find(|known| *known == tier) {
            Some(known) => {
                self.quality = known;
                true
            }
            None => false,
        }
    }
}
