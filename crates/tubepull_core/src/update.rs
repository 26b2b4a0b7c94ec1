use crate::{AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ModeSelected(mode) => cancel_effect(state.set_mode(mode)),
        Msg::UrlChanged(url) => {
            state.set_url(url);
            Vec::new()
        }
        Msg::UrlFocusLost => match state.info_query() {
            Some(url) => vec![Effect::FetchInfo { url }],
            None => Vec::new(),
        },
        Msg::InfoFetched { url, info } => {
            state.apply_info(&url, info);
            Vec::new()
        }
        Msg::ContainerSelected(container) => {
            state.set_container(container);
            Vec::new()
        }
        Msg::QualitySelected(tier) => {
            state.set_quality(&tier);
            Vec::new()
        }
        Msg::DownloadClicked => {
            // The control is disabled while a job runs; a stray click must not
            // start a second stream.
            if state.phase() == Phase::Processing || state.url().trim().is_empty() {
                return (state, Vec::new());
            }
            if !state.validation().valid {
                state.reject_invalid_url();
                return (state, Vec::new());
            }
            let (job_id, request) = state.start_job();
            vec![Effect::StartJob { job_id, request }]
        }
        Msg::JobRecord { job_id, record } => {
            state.apply_record(job_id, record);
            Vec::new()
        }
        Msg::JobFailed { job_id, error } => {
            state.apply_failure(job_id, &error);
            Vec::new()
        }
        Msg::JobStreamEnded { job_id } => {
            state.apply_stream_ended(job_id);
            Vec::new()
        }
        Msg::ResetClicked => cancel_effect(state.reset()),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn cancel_effect(detached: Option<crate::JobId>) -> Vec<Effect> {
    detached
        .map(|job_id| vec![Effect::CancelJob { job_id }])
        .unwrap_or_default()
}
