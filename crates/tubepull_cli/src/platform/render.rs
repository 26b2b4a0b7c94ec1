use std::io::{self, Write};

use tubepull_core::{AppViewModel, Phase, RequestMode};
use tubepull_engine::resolve_artifact_url;

const BAR_WIDTH: usize = 30;

/// Draws view models onto a terminal-like writer. The progress line is
/// redrawn in place; everything else is printed once.
pub struct Renderer<W: Write> {
    out: W,
    base_url: String,
    progress_line_open: bool,
    info_shown: bool,
    last_phase: Phase,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, base_url: impl Into<String>) -> Self {
        Self {
            out,
            base_url: base_url.into(),
            progress_line_open: false,
            info_shown: false,
            last_phase: Phase::Idle,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        if let Some(info) = view.video_info.as_ref().filter(|_| !self.info_shown) {
            self.close_progress_line()?;
            writeln!(self.out, "{}", info.title)?;
            writeln!(self.out, "  by {}  ({})", info.author, info.duration_label())?;
            self.info_shown = true;
        }

        match view.phase {
            // A rejected URL is reported by the error line after the click.
            Phase::Idle => {}
            Phase::Processing => {
                if self.last_phase != Phase::Processing {
                    writeln!(self.out, "{}", header_line(view))?;
                }
                write!(self.out, "\r\x1b[2K{}", progress_line(view))?;
                self.progress_line_open = true;
            }
            Phase::Complete if self.last_phase != Phase::Complete => {
                self.close_progress_line()?;
                writeln!(self.out, "✔ {}", view.status_text)?;
                if let Some(artifact) = view.artifact.as_ref() {
                    let link = resolve_artifact_url(&self.base_url, &artifact.url)
                        .unwrap_or_else(|| artifact.url.clone());
                    writeln!(self.out, "  download: {link}")?;
                    if let Some(filename) = artifact.filename.as_deref() {
                        writeln!(self.out, "  save as:  {filename}")?;
                    }
                }
            }
            Phase::Error if self.last_phase != Phase::Error => {
                self.close_progress_line()?;
                writeln!(self.out, "✘ {}", view.status_text)?;
            }
            Phase::Complete | Phase::Error => {}
        }

        self.last_phase = view.phase;
        self.out.flush()
    }

    fn close_progress_line(&mut self) -> io::Result<()> {
        if self.progress_line_open {
            writeln!(self.out)?;
            self.progress_line_open = false;
        }
        Ok(())
    }
}

fn header_line(view: &AppViewModel) -> String {
    let what = match view.mode {
        RequestMode::Single => "video",
        RequestMode::Collection => "playlist",
    };
    format!(
        "Downloading {what} as {} {}",
        view.container.as_str().to_uppercase(),
        view.quality
    )
}

pub(crate) fn progress_line(view: &AppViewModel) -> String {
    let percent = view.progress_percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent.round() as u32,
        view.status_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubepull_core::{update, AppState, EventRecord, JobStatus, Msg};

    fn processing_state() -> AppState {
        let (state, _) = update(
            AppState::new(),
            Msg::UrlChanged("https://youtu.be/abc".to_string()),
        );
        update(state, Msg::DownloadClicked).0
    }

    fn render_to_string(views: &[AppViewModel]) -> String {
        let mut renderer = Renderer::new(Vec::new(), "http://localhost:5000");
        for view in views {
            renderer.render(view).unwrap();
        }
        String::from_utf8(renderer.out).unwrap()
    }

    #[test]
    fn progress_line_fills_bar_proportionally() {
        let mut view = processing_state().view();
        view.progress_percent = 50.0;
        view.status_text = "Downloading".to_string();
        let line = progress_line(&view);
        assert!(line.starts_with(&format!("[{}{}]", "#".repeat(15), "-".repeat(15))));
        assert!(line.ends_with(" 50%  Downloading"));
    }

    #[test]
    fn complete_prints_resolved_link_once() {
        let state = processing_state();
        let running = state.view();
        let (state, _) = update(
            state,
            Msg::JobRecord {
                job_id: 1,
                record: EventRecord {
                    status: Some(JobStatus::Complete),
                    download_url: Some("/downloads/abc.mp4".to_string()),
                    filename: Some("abc.mp4".to_string()),
                    ..EventRecord::default()
                },
            },
        );
        let done = state.view();

        let output = render_to_string(&[running, done.clone(), done]);
        assert!(output.contains("Downloading video as MP4 720p"));
        assert_eq!(output.matches("✔ Video downloaded successfully!").count(), 1);
        assert!(output.contains("download: http://localhost:5000/downloads/abc.mp4"));
        assert!(output.contains("save as:  abc.mp4"));
    }

    #[test]
    fn rejected_url_reason_is_printed_once() {
        let (state, _) = update(
            AppState::new(),
            Msg::UrlChanged("https://www.youtube.com/playlist?list=PL1".to_string()),
        );
        let idle = state.view();
        assert!(idle.validation_message.is_some());
        let (state, effects) = update(state, Msg::DownloadClicked);
        assert!(effects.is_empty());

        let output = render_to_string(&[idle, state.view()]);
        assert_eq!(
            output.matches("collection URL used in single-item mode").count(),
            1
        );
        assert!(output.contains("✘ collection URL used in single-item mode"));
    }

    #[test]
    fn error_prints_status_text() {
        let state = processing_state();
        let (state, _) = update(
            state,
            Msg::JobFailed {
                job_id: 1,
                error: "http status 500 (Internal Server Error)".to_string(),
            },
        );
        let output = render_to_string(&[state.view()]);
        assert!(output.contains("✘ Download failed: http status 500 (Internal Server Error)"));
    }
}
