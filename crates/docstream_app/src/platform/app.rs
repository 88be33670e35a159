use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context};
use docstream_core::{update, AppState, FileStatus, Msg, SelectedFile};
use docstream_engine::EngineHandle;
use engine_logging::{engine_debug, engine_info, engine_warn};

use super::cli::Cli;
use super::config::{AppConfig, LoadedConfig, DEFAULT_CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::render::{render_selected, Renderer};

const LOG_FILENAME: &str = "docstream.log";
const IDLE_TICK: Duration = Duration::from_millis(250);

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let loaded = AppConfig::load(&config_path)?;
    if cli.config.is_some() && matches!(loaded, LoadedConfig::Missing) {
        bail!("config file {} not found", config_path.display());
    }
    let invalid = match &loaded {
        LoadedConfig::Invalid { path, reason } => Some((path.clone(), reason.clone())),
        _ => None,
    };
    let mut config = loaded.into_config();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }

    engine_logging::initialize(
        cli.log.into(),
        config.log_level(cli.verbose),
        Path::new(LOG_FILENAME),
    );
    if let Some((path, reason)) = invalid {
        engine_warn!("Ignoring config {:?}, using defaults: {}", path, reason);
    }
    engine_info!(
        "docstream starting endpoint={} max_files={}",
        config.endpoint,
        config.max_files
    );

    let files = selected_files(&cli.files)?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let engine = EngineHandle::new(config.upload_settings());
    let mut session = Session {
        state: AppState::with_config(config.session_config()),
        renderer: Renderer::default(),
        runner: EffectRunner::new(engine, msg_tx),
    };

    session.dispatch(Msg::ViewModeChanged(cli.view.into()));
    session.dispatch(Msg::FilesSelected {
        files,
        prompt: cli.prompt.clone(),
    });

    while session.state.is_uploading() {
        match msg_rx.recv_timeout(IDLE_TICK) {
            Ok(msg) => session.dispatch(msg),
            Err(mpsc::RecvTimeoutError::Timeout) => session.dispatch(Msg::Tick),
            Err(mpsc::RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
        }
    }

    let failed = session.state.global_error().is_some();
    session.print_documents();
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn selected_files(paths: &[PathBuf]) -> anyhow::Result<Vec<SelectedFile>> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .with_context(|| format!("{} does not name a file", path.display()))?
                .to_string_lossy()
                .into_owned();
            Ok(SelectedFile::new(name, path.clone()))
        })
        .collect()
}

struct Session {
    state: AppState,
    renderer: Renderer,
    runner: EffectRunner,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let orphan = match &msg {
            Msg::FileResult { batch_id, result } => Some((*batch_id, result.file_name.clone())),
            _ => None,
        };

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        if let (Some((batch_id, file_name)), false) = (orphan, was_dirty) {
            engine_debug!("No pending entry for {file_name} in {batch_id}; result dropped");
        }
        if was_dirty {
            for line in self.renderer.render(&self.state.view()) {
                println!("{line}");
            }
        }
        self.runner.enqueue(effects);
    }

    /// Prints every file that produced data, selecting each in turn.
    fn print_documents(&mut self) {
        let succeeded: Vec<_> = self
            .state
            .view()
            .files
            .into_iter()
            .filter(|row| row.status == FileStatus::Succeeded)
            .map(|row| row.file_id)
            .collect();

        for file_id in succeeded {
            let state = std::mem::take(&mut self.state);
            let (state, _) = update(state, Msg::FileSelected { file_id });
            self.state = state;
            println!();
            println!("{}", render_selected(self.state.view().selected.as_ref()));
        }
    }
}
