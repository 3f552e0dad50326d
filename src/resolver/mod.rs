//! Dependency resolution: where to load a package from
//!
//! A package is loaded from the current project, from the standard library
//! root, or from a throwaway module ("sandbox") that fetches it with
//! `go get`. A sandbox is removed when its [`Workspace`] is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::error::CommandError;

pub mod manifest;
pub mod toolchain;

pub use manifest::{GoMod, version_from_mod};
pub use toolchain::{GoToolchain, Toolchain};

/// Prefix of sandbox directory names under the system temp dir
pub const SANDBOX_PREFIX: &str = "godoc-";

/// Whether the first path segment looks like a domain (`github.com/...`)
pub fn is_remote_import_path(import_path: &str) -> bool {
    if import_path == "." {
        return false;
    }
    let first = import_path.split('/').next().unwrap_or_default();
    first.contains('.')
}

/// Single-segment standard library path such as `fmt`
fn is_std_root_path(import_path: &str) -> bool {
    import_path != "." && !import_path.contains('/') && !import_path.contains('.')
}

/// Whether an error chain was caused by a cancelled command
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<CommandError>()
            .is_some_and(CommandError::is_cancelled)
    })
}

/// Ephemeral module directory, removed on drop
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        tracing::debug!("removing sandbox {}", self.dir.path().display());
    }
}

/// Directory a package can be loaded from
#[derive(Debug)]
pub enum Workspace {
    /// The current project already requires the package
    Project(PathBuf),
    Sandbox(Sandbox),
}

impl Workspace {
    pub fn path(&self) -> &Path {
        match self {
            Workspace::Project(dir) => dir,
            Workspace::Sandbox(sandbox) => sandbox.path(),
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Workspace::Sandbox(_))
    }
}

pub struct DependencyResolver<T> {
    toolchain: Arc<T>,
    workdir: PathBuf,
    /// `import@version` -> whether the project's go.mod requires it
    probes: DashMap<String, bool>,
}

impl<T: Toolchain> DependencyResolver<T> {
    pub fn new(toolchain: Arc<T>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            workdir: workdir.into(),
            probes: DashMap::new(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Directory for the first, local load attempt
    pub async fn local_dir(&self, import_path: &str) -> Result<PathBuf, CommandError> {
        if is_std_root_path(import_path) {
            return self.toolchain.source_root().await;
        }
        Ok(self.workdir.clone())
    }

    /// Makes `import_path` loadable: reuses the project when its go.mod
    /// already requires a compatible version, otherwise builds a sandbox.
    pub async fn check_module_dep(
        &self,
        import_path: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<Workspace> {
        let version = version.trim();
        if self.project_requires(import_path, version).await {
            tracing::debug!("{} is required by {}/go.mod", import_path, self.workdir.display());
            return Ok(Workspace::Project(self.workdir.clone()));
        }

        let sandbox = self.create_sandbox(import_path, version, cancel).await?;
        Ok(Workspace::Sandbox(sandbox))
    }

    async fn project_requires(&self, import_path: &str, version: &str) -> bool {
        let key = format!("{import_path}@{version}");
        if let Some(known) = self.probes.get(&key).map(|entry| *entry) {
            return known;
        }

        let declared = match GoMod::read(&self.workdir).await {
            Ok(gomod) => gomod
                .required_version(import_path)
                .is_some_and(|required| version.is_empty() || required == version),
            Err(_) => false,
        };

        self.probes.insert(key, declared);
        declared
    }

    async fn create_sandbox(
        &self,
        import_path: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<Sandbox> {
        let dir = tempfile::Builder::new()
            .prefix(SANDBOX_PREFIX)
            .tempdir()
            .context("Failed to create sandbox directory")?;
        let sandbox = Sandbox { dir };

        let module_name = sandbox
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "godoc".to_string());

        tracing::info!("fetching {} in sandbox {}", import_path, sandbox.path().display());

        self.toolchain
            .run(sandbox.path(), &["mod", "init", &module_name], cancel)
            .await
            .context("go mod init failed")?;

        let target = if version.is_empty() {
            import_path.to_string()
        } else {
            format!("{import_path}@{version}")
        };

        self.toolchain
            .run(sandbox.path(), &["get", &target], cancel)
            .await
            .with_context(|| format!("go get {target:?} failed"))?;

        Ok(sandbox)
    }

    #[cfg(test)]
    fn probe_count(&self) -> usize {
        self.probes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records invocations and fails any command whose args contain `fail_on`
    #[derive(Default)]
    struct RecordingToolchain {
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
        fail_on: Option<&'static str>,
    }

    impl Toolchain for RecordingToolchain {
        async fn version(&self) -> Result<String, CommandError> {
            Ok("go1.22.0".into())
        }

        async fn source_root(&self) -> Result<PathBuf, CommandError> {
            Ok(PathBuf::from("/goroot/src"))
        }

        fn env(&self) -> Vec<(String, String)> {
            Vec::new()
        }

        async fn run(
            &self,
            dir: &Path,
            args: &[&str],
            _cancel: &CancellationToken,
        ) -> Result<String, CommandError> {
            self.calls.lock().unwrap().push((
                dir.to_path_buf(),
                args.iter().map(|a| a.to_string()).collect(),
            ));
            if self.fail_on.is_some_and(|needle| args.contains(&needle)) {
                return Err(CommandError::Failed {
                    command: format!("go {}", args.join(" ")),
                    status: "exit status: 1".into(),
                    stderr: "module not found".into(),
                });
            }
            Ok(String::new())
        }
    }

    #[test]
    fn test_remote_import_paths() {
        assert!(is_remote_import_path("github.com/pkg/errors"));
        assert!(is_remote_import_path("golang.org/x/mod/modfile"));
        assert!(!is_remote_import_path("fmt"));
        assert!(!is_remote_import_path("net/http"));
        assert!(!is_remote_import_path("."));
    }

    #[tokio::test]
    async fn test_local_dir_uses_goroot_for_single_segment_std() {
        let resolver = DependencyResolver::new(Arc::new(RecordingToolchain::default()), "/work");

        assert_eq!(resolver.local_dir("fmt").await.unwrap(), PathBuf::from("/goroot/src"));
        assert_eq!(resolver.local_dir("net/http").await.unwrap(), PathBuf::from("/work"));
        assert_eq!(resolver.local_dir(".").await.unwrap(), PathBuf::from("/work"));
        assert_eq!(
            resolver.local_dir("github.com/a/b").await.unwrap(),
            PathBuf::from("/work")
        );
    }

    #[tokio::test]
    async fn test_reuses_project_when_go_mod_requires_import() {
        let project = TempDir::new().unwrap();
        std::fs::write(
            project.path().join("go.mod"),
            "module example.com/app\n\nrequire github.com/pkg/errors v0.9.1\n",
        )
        .unwrap();

        let toolchain = Arc::new(RecordingToolchain::default());
        let resolver = DependencyResolver::new(toolchain.clone(), project.path());
        let cancel = CancellationToken::new();

        let ws = resolver
            .check_module_dep("github.com/pkg/errors", "", &cancel)
            .await
            .unwrap();
        assert!(!ws.is_sandbox());
        assert_eq!(ws.path(), project.path());

        let ws = resolver
            .check_module_dep("github.com/pkg/errors", " v0.9.1 ", &cancel)
            .await
            .unwrap();
        assert!(!ws.is_sandbox());

        assert!(toolchain.calls.lock().unwrap().is_empty());
        assert_eq!(resolver.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_version_mismatch_builds_sandbox() {
        let project = TempDir::new().unwrap();
        std::fs::write(
            project.path().join("go.mod"),
            "module example.com/app\n\nrequire github.com/pkg/errors v0.9.1\n",
        )
        .unwrap();

        let toolchain = Arc::new(RecordingToolchain::default());
        let resolver = DependencyResolver::new(toolchain.clone(), project.path());

        let ws = resolver
            .check_module_dep("github.com/pkg/errors", "v0.8.0", &CancellationToken::new())
            .await
            .unwrap();
        assert!(ws.is_sandbox());

        let sandbox_path = ws.path().to_path_buf();
        let dir_name = sandbox_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(dir_name.starts_with(SANDBOX_PREFIX));

        let calls = toolchain.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, vec!["mod", "init", dir_name.as_str()]);
        assert_eq!(calls[1].1, vec!["get", "github.com/pkg/errors@v0.8.0"]);
        assert!(calls.iter().all(|(dir, _)| dir == &sandbox_path));

        drop(ws);
        assert!(!sandbox_path.exists());
    }

    #[tokio::test]
    async fn test_failed_setup_removes_sandbox() {
        let project = TempDir::new().unwrap();
        let toolchain = Arc::new(RecordingToolchain {
            fail_on: Some("get"),
            ..Default::default()
        });
        let resolver = DependencyResolver::new(toolchain.clone(), project.path());

        let err = resolver
            .check_module_dep("example.com/missing", "", &CancellationToken::new())
            .await
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("go get \"example.com/missing\" failed"), "{msg}");
        assert!(msg.contains("module not found"), "{msg}");
        assert!(!is_cancellation(&err));

        let calls = toolchain.calls.lock().unwrap().clone();
        let sandbox_dir = &calls[0].0;
        assert!(!sandbox_dir.exists());
    }

    #[test]
    fn test_cancellation_detection_through_context() {
        let err = anyhow::Error::new(CommandError::Cancelled {
            command: "go get x".into(),
        })
        .context("go get \"x\" failed");
        assert!(is_cancellation(&err));
    }
}
