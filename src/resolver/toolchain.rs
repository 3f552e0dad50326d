//! External `go` toolchain invocation

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::error::CommandError;

/// Operations the resolver needs from the language toolchain
pub trait Toolchain: Send + Sync {
    /// Version string of the running toolchain, e.g. `go1.22.3`
    fn version(&self) -> impl Future<Output = Result<String, CommandError>> + Send;

    /// Root of the standard library sources (`GOROOT/src`)
    fn source_root(&self) -> impl Future<Output = Result<PathBuf, CommandError>> + Send;

    /// Environment every toolchain and front-end invocation runs with
    fn env(&self) -> Vec<(String, String)>;

    /// Runs the toolchain with `args` in `dir`, returning stdout
    fn run(
        &self,
        dir: &Path,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, CommandError>> + Send;
}

impl<T: Toolchain> Toolchain for Arc<T> {
    fn version(&self) -> impl Future<Output = Result<String, CommandError>> + Send {
        (**self).version()
    }

    fn source_root(&self) -> impl Future<Output = Result<PathBuf, CommandError>> + Send {
        (**self).source_root()
    }

    fn env(&self) -> Vec<(String, String)> {
        (**self).env()
    }

    fn run(
        &self,
        dir: &Path,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, CommandError>> + Send {
        (**self).run(dir, args, cancel)
    }
}

/// The `go` command found on `PATH` (or at an explicit location)
#[derive(Debug)]
pub struct GoToolchain {
    program: PathBuf,
    goos: Option<String>,
    goarch: Option<String>,
    version: OnceCell<String>,
    root: OnceCell<PathBuf>,
}

impl GoToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            goos: None,
            goarch: None,
            version: OnceCell::new(),
            root: OnceCell::new(),
        }
    }

    /// Cross-target the toolchain at another OS/architecture pair
    pub fn with_target(mut self, goos: Option<String>, goarch: Option<String>) -> Self {
        self.goos = goos.filter(|s| !s.trim().is_empty());
        self.goarch = goarch.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(dir)
            .envs(self.env());
        cmd
    }

    async fn go_env(&self, key: &str) -> Result<String, CommandError> {
        let out = self
            .run(Path::new("."), &["env", key], &CancellationToken::new())
            .await?;
        Ok(out.trim().to_string())
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Toolchain for GoToolchain {
    async fn version(&self) -> Result<String, CommandError> {
        self.version
            .get_or_try_init(|| self.go_env("GOVERSION"))
            .await
            .cloned()
    }

    async fn source_root(&self) -> Result<PathBuf, CommandError> {
        self.root
            .get_or_try_init(|| async {
                let goroot = self.go_env("GOROOT").await?;
                Ok(PathBuf::from(goroot).join("src"))
            })
            .await
            .cloned()
    }

    fn env(&self) -> Vec<(String, String)> {
        // Force module mode and ignore any parent go.work
        let mut env = vec![
            ("GO111MODULE".to_string(), "on".to_string()),
            ("GOWORK".to_string(), "off".to_string()),
        ];
        if let Some(goos) = &self.goos {
            env.push(("GOOS".to_string(), goos.clone()));
        }
        if let Some(goarch) = &self.goarch {
            env.push(("GOARCH".to_string(), goarch.clone()));
        }
        env
    }

    async fn run(
        &self,
        dir: &Path,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<String, CommandError> {
        let label = format!("go {}", args.join(" "));
        tracing::debug!("running {} in {}", label, dir.display());
        run_command(self.command(dir, args), &label, cancel).await
    }
}

/// Runs `cmd` to completion and returns its stdout.
///
/// The child is killed if `cancel` fires first. A non-zero exit carries the
/// trimmed stderr.
pub(crate) async fn run_command(
    mut cmd: Command,
    label: &str,
    cancel: &CancellationToken,
) -> Result<String, CommandError> {
    if cancel.is_cancelled() {
        return Err(CommandError::Cancelled {
            command: label.to_string(),
        });
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| CommandError::Spawn {
        command: label.to_string(),
        source,
    })?;

    let output = tokio::select! {
        output = child.wait_with_output() => output.map_err(|source| CommandError::Spawn {
            command: label.to_string(),
            source,
        })?,
        _ = cancel.cancelled() => {
            tracing::debug!("{} cancelled, killing child", label);
            return Err(CommandError::Cancelled {
                command: label.to_string(),
            });
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            command: label.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
