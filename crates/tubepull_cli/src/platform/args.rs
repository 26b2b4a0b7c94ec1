use std::path::PathBuf;

use clap::Parser;
use tubepull_core::Container;

use super::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(
    name = "tubepull",
    author,
    version,
    about = "Start a download job on a tubepull backend and follow its progress"
)]
pub struct Args {
    /// Video or playlist URL
    pub url: String,

    /// Download a whole playlist instead of a single video
    #[arg(short, long)]
    pub playlist: bool,

    /// Output container: mp4, webm, mp3 or m4a (default: last used, else mp4)
    #[arg(short, long)]
    pub format: Option<Container>,

    /// Quality tier, e.g. 1080p or 192kbps (default: last used, else the format's default)
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Backend base URL
    #[arg(long, env = "TUBEPULL_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Give up when the progress stream is silent for this many seconds
    #[arg(long, default_value_t = 120)]
    pub idle_timeout: u64,

    /// Look up and print title, author and duration before downloading
    #[arg(long)]
    pub info: bool,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// Directory holding the remembered format and quality
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,
}
