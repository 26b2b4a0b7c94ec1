use crate::{Artifact, Container, Phase, RequestMode, VideoInfo};

/// Snapshot handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub mode: RequestMode,
    pub url: String,
    pub validation_message: Option<String>,
    pub container: Container,
    pub quality: String,
    pub quality_tiers: Vec<&'static str>,
    /// Only populated while the current URL is valid.
    pub video_info: Option<VideoInfo>,
    pub phase: Phase,
    pub progress_percent: f64,
    pub status_text: String,
    pub artifact: Option<Artifact>,
    pub download_enabled: bool,
    pub dirty: bool,
}
