use std::io::{self, Stdout};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use pull_logging::{pull_info, pull_warn};
use tubepull_core::{update, AppState, Msg, Phase, RequestMode};
use tubepull_engine::{ClientSettings, EngineHandle};

use super::args::Args;
use super::effects::EffectRunner;
use super::logging;
use super::persistence;
use super::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_app(args: Args) -> anyhow::Result<ExitCode> {
    logging::initialize(args.log);

    let saved = persistence::load_preference(&args.state_dir);
    let settings = ClientSettings {
        base_url: args.api_url.clone(),
        idle_timeout: Duration::from_secs(args.idle_timeout),
        ..ClientSettings::default()
    };
    let info_timeout = settings.info_timeout;
    let engine = EngineHandle::new(settings).context("invalid backend URL")?;

    let mut session = Session {
        state: AppState::new(),
        runner: EffectRunner::new(engine),
        renderer: Renderer::new(io::stdout(), args.api_url.clone()),
    };

    let mode = if args.playlist {
        RequestMode::Collection
    } else {
        RequestMode::Single
    };
    session.dispatch(Msg::ModeSelected(mode))?;
    session.dispatch(Msg::ContainerSelected(
        args.format.unwrap_or_else(|| saved.container()),
    ))?;
    let quality = args
        .quality
        .clone()
        .unwrap_or_else(|| saved.quality().to_string());
    session.dispatch(Msg::QualitySelected(quality.clone()))?;
    if args.quality.is_some() && session.state.preference().quality() != quality {
        let preference = session.state.preference();
        bail!(
            "quality {} is not offered for {}; choose one of: {}",
            quality,
            preference.container(),
            preference.quality_tiers().join(", ")
        );
    }
    session.dispatch(Msg::UrlChanged(args.url.clone()))?;

    if args.info {
        session.dispatch(Msg::UrlFocusLost)?;
        session.wait_for_info(info_timeout)?;
    }

    if let Err(err) = persistence::save_preference(&args.state_dir, session.state.preference()) {
        pull_warn!("Could not remember preferences: {}", err);
    }

    session.dispatch(Msg::DownloadClicked)?;
    while session.state.phase() == Phase::Processing {
        let msg = session
            .runner
            .next_msg(POLL_INTERVAL)
            .context("download engine stopped before the job finished")?
            .unwrap_or(Msg::Tick);
        session.dispatch(msg)?;
    }

    let phase = session.state.phase();
    pull_info!("Session finished in phase {:?}", phase);
    Ok(match phase {
        Phase::Complete => ExitCode::SUCCESS,
        Phase::Error => ExitCode::from(1),
        Phase::Idle | Phase::Processing => ExitCode::from(2),
    })
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer<Stdout>,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);
        if state.consume_dirty() {
            self.renderer
                .render(&state.view())
                .context("failed to write to terminal")?;
        }
        self.state = state;
        Ok(())
    }

    /// Pumps engine events until the info lookup for the current URL resolves.
    fn wait_for_info(&mut self, limit: Duration) -> anyhow::Result<()> {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            let next = self
                .runner
                .next_msg(POLL_INTERVAL)
                .context("download engine stopped during the info lookup")?;
            match next {
                Some(msg @ Msg::InfoFetched { .. }) => return self.dispatch(msg),
                Some(msg) => self.dispatch(msg)?,
                None => {}
            }
        }
        pull_warn!("No video info within {:?}", limit);
        Ok(())
    }
}
