//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::pipeline::{resolve_profile, Pipeline};
use crate::coerce::{coerce_table, resolve_headers};
use crate::config::UploaderConfig;
use crate::controller::{RunOptions, Step};
use crate::error::{Error, Result};
use crate::ingest::{AutoReader, TabularReader};
use crate::profile::{list_builtin, load_profile};
use crate::state::{FileRef, Session, StateManager};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Profiles => self.profiles(),
            Commands::Check => self.check().await,
            Commands::Preview {
                file,
                profile,
                rows,
            } => self.preview(file, profile, *rows),
            Commands::Enqueue {
                profile,
                files,
                cutoff,
                overwrite,
            } => self.enqueue(profile, files, *cutoff, *overwrite).await,
            Commands::Step => self.step().await,
            Commands::Run { max_files } => self.run_queue(*max_files).await,
            Commands::Status => self.status().await,
            Commands::Reset => self.reset().await,
            Commands::Serve { port } => {
                let config = crate::cli::ServerConfig {
                    uploader: self.load_config()?,
                    state_path: self.state_path()?,
                };
                crate::cli::serve(config, *port).await
            }
        }
    }

    /// Load configuration, falling back to defaults
    fn load_config(&self) -> Result<UploaderConfig> {
        UploaderConfig::load_or_default(self.cli.config.as_deref())
    }

    /// Session file: `--state` wins over the configured path
    fn state_path(&self) -> Result<PathBuf> {
        match &self.cli.state {
            Some(path) => Ok(path.clone()),
            None => Ok(self.load_config()?.state_path),
        }
    }

    fn load_state(&self) -> Result<StateManager> {
        StateManager::from_file(self.state_path()?)
    }

    /// List built-in profiles
    fn profiles(&self) -> Result<()> {
        let mut profiles = Vec::new();
        for name in list_builtin() {
            let profile = load_profile(name)?;
            profiles.push(json!({
                "name": profile.name,
                "kind": profile.kind,
                "title": profile.display_title(),
                "description": profile.description,
                "target_table": profile.target_table,
                "date_field": profile.date_field,
                "date_filter_enabled": profile.date_filter_enabled,
                "collision_check_enabled": profile.collision_check_enabled,
                "write_policy": profile.default_write_policy,
                "fields": profile.fields.iter().map(|f| &f.name).collect::<Vec<_>>(),
            }));
        }

        self.output_message(&json!({
            "type": "PROFILES",
            "profiles": profiles
        }));
        Ok(())
    }

    /// Preflight the active session
    async fn check(&self) -> Result<()> {
        let session = self.load_state()?.require_session().await?;
        let pipeline = Pipeline::open(self.load_config()?)?;
        let controller = pipeline.controller(session.profile, session.options)?;

        match controller.preflight().await {
            Ok(()) => self.output_message(&json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "message": "Warehouse and staging reachable"
                }
            })),
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": e.to_string()
                    }
                }));
                return Err(e);
            }
        }

        Ok(())
    }

    /// Read and coerce one file, showing the first rows
    fn preview(&self, file: &Path, profile: &str, rows: usize) -> Result<()> {
        let config = self.load_config()?;
        let profile = resolve_profile(&config, profile)?;

        let raw = AutoReader::new().read(file)?;
        let resolution = resolve_headers(&raw.headers, &profile);
        let typed = coerce_table(&raw, &profile);

        let missing: Vec<&str> = profile
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| typed.column_index(name).is_none())
            .collect();

        self.output_message(&json!({
            "type": "PREVIEW",
            "file": file.display().to_string(),
            "profile": profile.name,
            "target_table": profile.target_table,
            "rows": typed.num_rows(),
            "columns": typed.column_names(),
            "unmapped_headers": resolution.unmapped,
            "missing_fields": missing,
            "preview": typed.to_json_rows(rows)
        }));
        Ok(())
    }

    /// Start a fresh session over a queue of files
    async fn enqueue(
        &self,
        profile: &str,
        files: &[PathBuf],
        cutoff: Option<NaiveDate>,
        overwrite: bool,
    ) -> Result<()> {
        let config = self.load_config()?;
        let profile = resolve_profile(&config, profile)?;

        let mut options = RunOptions::new().with_overwrite(overwrite);
        if let Some(cutoff) = cutoff {
            options = options.with_cutoff(cutoff);
        }

        let pipeline = Pipeline::open(config)?;
        let controller = pipeline.controller(profile.clone(), options.clone())?;
        controller.preflight().await?;

        let queue: Vec<FileRef> = files.iter().map(FileRef::new).collect();
        for file in &queue {
            if !file.path().exists() {
                tracing::warn!(file = %file.name(), "Queued file does not exist yet");
            }
        }

        let state = self.load_state()?;
        state.start(Session::new(profile, options, queue)).await?;

        let session = state.require_session().await?;
        tracing::info!(
            profile = %session.profile.name,
            files = session.state.total(),
            run_id = %session.state.run_id,
            "Session started"
        );
        self.output_session(&session);
        Ok(())
    }

    /// One controller step
    async fn step(&self) -> Result<()> {
        let state = self.load_state()?;
        let session = state.require_session().await?;
        let pipeline = Pipeline::open(self.load_config()?)?;
        let controller = pipeline.controller(session.profile, session.options)?;

        let (next, step) = controller.step(session.state).await;
        state.update_state(next).await?;

        let session = state.require_session().await?;
        self.output_step(step, &session);
        Ok(())
    }

    /// Scheduler loop: step until done or halted
    async fn run_queue(&self, max_files: Option<usize>) -> Result<()> {
        let state = self.load_state()?;
        let session = state.require_session().await?;
        let pipeline = Pipeline::open(self.load_config()?)?;
        let controller = pipeline.controller(session.profile, session.options)?;
        controller.preflight().await?;

        let mut current = session.state;
        let mut processed = 0;

        loop {
            if max_files.is_some_and(|max| processed >= max) {
                tracing::info!(processed, "File limit reached, stopping");
                break;
            }

            let (next, step) = controller.step(current).await;
            state.update_state(next.clone()).await?;
            processed += 1;

            let session = state.require_session().await?;
            self.output_step(step, &session);

            match step {
                Step::Continue => current = next,
                Step::Done => break,
                Step::Halted => {
                    let reason = next
                        .log
                        .last()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    return Err(Error::Other(format!("Run halted: {reason}")));
                }
            }
        }

        Ok(())
    }

    /// Show session progress
    async fn status(&self) -> Result<()> {
        let state = self.load_state()?;
        match state.session().await {
            Some(session) => self.output_session(&session),
            None => self.output_message(&json!({
                "type": "STATE",
                "profile": Value::Null,
                "state": state.state().await.view()
            })),
        }
        Ok(())
    }

    /// Reset progress
    async fn reset(&self) -> Result<()> {
        let state = self.load_state()?;
        let fresh = state.reset().await?;
        tracing::info!(run_id = %fresh.run_id, "Session reset");

        self.output_message(&json!({
            "type": "STATE",
            "state": fresh.view()
        }));
        Ok(())
    }

    fn output_session(&self, session: &Session) {
        self.output_message(&json!({
            "type": "STATE",
            "profile": session.profile.name,
            "options": session.options,
            "state": session.state.view()
        }));
    }

    fn output_step(&self, step: Step, session: &Session) {
        self.output_message(&json!({
            "type": "STEP",
            "step": step,
            "profile": session.profile.name,
            "state": session.state.view()
        }));
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
