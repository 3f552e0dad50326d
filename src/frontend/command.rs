use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::process::Command;

use super::{FrontEnd, LoadMode, LoadRequest, LoadedUnit};
use crate::resolver::toolchain::run_command;

/// Default front-end executable, looked up on `PATH`
pub const DEFAULT_FRONTEND: &str = "godoc-frontend";

/// Front-end that shells out to an external program printing a
/// [`LoadedUnit`] as JSON on stdout
#[derive(Debug, Clone)]
pub struct CommandFrontEnd {
    program: PathBuf,
}

impl CommandFrontEnd {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn command(&self, request: &LoadRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        if request.mode == LoadMode::Full {
            cmd.arg("-types");
        }
        cmd.arg(&request.import_path)
            .current_dir(&request.dir)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

impl Default for CommandFrontEnd {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTEND)
    }
}

impl FrontEnd for CommandFrontEnd {
    async fn load(&self, request: &LoadRequest) -> Result<LoadedUnit> {
        let label = format!("{} {}", self.program.display(), request.import_path);
        tracing::debug!("running front-end: {} in {}", label, request.dir.display());

        let stdout = run_command(self.command(request), &label, &request.cancel).await?;

        serde_json::from_str(&stdout)
            .with_context(|| format!("Failed to parse front-end output for {}", request.import_path))
    }
}
