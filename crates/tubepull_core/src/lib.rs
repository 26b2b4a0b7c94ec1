//! Tubepull core: pure download-session state machine and view-model helpers.
mod classify;
mod effect;
mod msg;
mod preference;
mod session;
mod state;
mod update;
mod view_model;

pub use classify::{classify, RequestMode, UrlValidation, ValidationFailure};
pub use effect::{Effect, JobRequest};
pub use msg::Msg;
pub use preference::{
    Container, MediaClass, MediaPreference, AUDIO_QUALITY_TIERS, VIDEO_QUALITY_TIERS,
};
pub use session::{Artifact, EventRecord, JobId, JobSession, JobStatus, Phase, VideoInfo};
pub use state::AppState;
pub use update::update;
pub use view_model::AppViewModel;
