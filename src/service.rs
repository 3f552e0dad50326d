use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::{
    CacheConfig, CacheEntry, CacheMetadata, CachePayload, DocCache, cache_key, expected_version,
    uniq_keys,
};
use crate::docs::{
    DocResult, PackageDoc, SymbolDoc, SymbolIndex, build_symbol_index, requires_type_info,
    to_pkg_doc,
};
use crate::error::GodocError;
use crate::frontend::command::DEFAULT_FRONTEND;
use crate::frontend::{CommandFrontEnd, FrontEnd, LoadMode, LoadRequest, LoadedUnit};
use crate::resolver::{
    DependencyResolver, GoToolchain, Toolchain, is_cancellation, is_remote_import_path,
    version_from_mod,
};

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
        .expect("selector pattern is valid")
});

/// Parameters of a single documentation lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DocRequest {
    #[schemars(description = "Import path of the package, or \".\" for the current module")]
    pub import_path: String,
    #[schemars(description = "Optional symbol such as Type, Type.Method or Func")]
    #[serde(default)]
    pub symbol: String,
    #[schemars(description = "Optional module version, e.g. v1.2.3")]
    #[serde(default)]
    pub version: String,
}

/// Where the documentation cache comes from
#[derive(Debug, Clone, Default)]
pub enum CacheSource {
    /// `<user cache dir>/godoc/cache.json`
    #[default]
    Default,
    Config(CacheConfig),
    Shared(Arc<DocCache>),
}

/// Configuration for [`Godoc`]
#[derive(Debug, Clone)]
pub struct GodocOptions {
    pub goos: Option<String>,
    pub goarch: Option<String>,
    /// Project directory used for local loads (default `.`)
    pub workdir: PathBuf,
    pub cache: CacheSource,
    /// Upper bound for a single `load` call
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
    pub go_program: PathBuf,
    pub frontend_program: PathBuf,
}

impl Default for GodocOptions {
    fn default() -> Self {
        Self {
            goos: None,
            goarch: None,
            workdir: PathBuf::from("."),
            cache: CacheSource::Default,
            timeout: None,
            cancel: CancellationToken::new(),
            go_program: PathBuf::from("go"),
            frontend_program: PathBuf::from(DEFAULT_FRONTEND),
        }
    }
}

impl GodocOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goos(mut self, goos: impl Into<String>) -> Self {
        self.goos = Some(goos.into());
        self
    }

    pub fn goarch(mut self, goarch: impl Into<String>) -> Self {
        self.goarch = Some(goarch.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = CacheSource::Config(config);
        self
    }

    pub fn shared_cache(mut self, cache: Arc<DocCache>) -> Self {
        self.cache = CacheSource::Shared(cache);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn go_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.go_program = program.into();
        self
    }

    pub fn frontend_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.frontend_program = program.into();
        self
    }

    fn open_cache(&self) -> Result<Arc<DocCache>, GodocError> {
        Ok(match &self.cache {
            CacheSource::Default => Arc::new(DocCache::open_default()?),
            CacheSource::Config(config) => Arc::new(DocCache::open(config.clone())?),
            CacheSource::Shared(cache) => Arc::clone(cache),
        })
    }
}

/// Checks an import path and selector before any other work happens
pub fn validate_inputs(import_path: &str, symbol: &str) -> Result<(), GodocError> {
    if import_path.trim().is_empty() {
        return Err(GodocError::EmptyImportPath);
    }
    if import_path.contains("..") {
        return Err(GodocError::InvalidImportPath("cannot contain '..'"));
    }
    if import_path.starts_with('/') {
        return Err(GodocError::InvalidImportPath("cannot start with '/'"));
    }
    if !symbol.is_empty() && !SELECTOR_RE.is_match(symbol) {
        return Err(GodocError::InvalidSelector(symbol.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Package,
    Symbol,
}

impl Want {
    fn matches(self, payload: &CachePayload) -> bool {
        matches!(
            (self, payload),
            (Want::Package, CachePayload::Package(_)) | (Want::Symbol, CachePayload::Symbol(_))
        )
    }
}

/// Output of one resolution + extraction pass
struct Built {
    package: PackageDoc,
    symbols: SymbolIndex,
    pkg_path: String,
    actual_version: String,
    meta: CacheMetadata,
}

/// Documentation loader: cache first, then local resolution, then a
/// throwaway module sandbox
pub struct Godoc<F = CommandFrontEnd, T = GoToolchain> {
    frontend: F,
    resolver: DependencyResolver<T>,
    cache: Arc<DocCache>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Godoc {
    /// Loader backed by the `go` command and the command front-end
    pub fn new(options: GodocOptions) -> Result<Self, GodocError> {
        let toolchain = GoToolchain::new(&options.go_program)
            .with_target(options.goos.clone(), options.goarch.clone());
        let frontend = CommandFrontEnd::new(&options.frontend_program);
        Self::with_parts(frontend, toolchain, options)
    }
}

impl<F: FrontEnd, T: Toolchain> Godoc<F, T> {
    /// Loader with an explicit front-end and toolchain. Target settings
    /// (`GOOS`/`GOARCH`) come from the toolchain, not from `options`.
    pub fn with_parts(frontend: F, toolchain: T, options: GodocOptions) -> Result<Self, GodocError> {
        let cache = options.open_cache()?;
        Ok(Self {
            frontend,
            resolver: DependencyResolver::new(Arc::new(toolchain), options.workdir),
            cache,
            timeout: options.timeout,
            cancel: options.cancel,
        })
    }

    pub fn cache(&self) -> &Arc<DocCache> {
        &self.cache
    }

    pub fn workdir(&self) -> &Path {
        self.resolver.workdir()
    }

    pub async fn load_request(&self, request: &DocRequest) -> Result<DocResult, GodocError> {
        self.load(&request.import_path, &request.symbol, &request.version)
            .await
    }

    /// Loads documentation for a package, or for one symbol when `symbol`
    /// is non-empty. `version` pins a module version for remote packages.
    pub async fn load(
        &self,
        import_path: &str,
        symbol: &str,
        version: &str,
    ) -> Result<DocResult, GodocError> {
        validate_inputs(import_path, symbol)?;

        let token = self.cancel.child_token();
        let pipeline = async {
            match self.timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.run(import_path, symbol, version, &token))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(GodocError::TimedOut(limit)),
                    }
                }
                None => self.run(import_path, symbol, version, &token).await,
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(GodocError::Cancelled(format!("load of {import_path}"))),
            result = pipeline => result,
        }
    }

    async fn run(
        &self,
        import_path: &str,
        symbol: &str,
        version: &str,
        token: &CancellationToken,
    ) -> Result<DocResult, GodocError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            let (mut pkg, pkg_path) = self.get_or_load_pkg(import_path, version, token).await?;
            if pkg.import_path.is_empty() {
                pkg.import_path = pkg_path;
            }
            return Ok(DocResult::Package(pkg));
        }

        let (mut sym, pkg_path) = self
            .get_or_load_symbol(import_path, symbol, version, token)
            .await?;
        if sym.import_path.is_empty() {
            sym.import_path = pkg_path;
        }
        Ok(DocResult::Symbol(sym))
    }

    async fn toolchain_version(&self) -> Result<String, GodocError> {
        self.resolver
            .toolchain()
            .version()
            .await
            .map_err(GodocError::Toolchain)
    }

    /// Primary key for a request: the expected version depends on whether the
    /// package is the current project, standard/local, or remote
    async fn primary_key(
        &self,
        import_path: &str,
        version: &str,
        symbol: &str,
    ) -> Result<String, GodocError> {
        let toolchain_version = if import_path != "." && !is_remote_import_path(import_path) {
            self.toolchain_version().await?
        } else {
            String::new()
        };
        let expected = expected_version(import_path, version, &toolchain_version);
        Ok(cache_key(import_path, &expected, symbol))
    }

    /// Cached payload for `key` if it has the wanted kind and is still fresh
    async fn lookup(
        &self,
        key: &str,
        import_path: &str,
        want: Want,
    ) -> Result<Option<CachePayload>, GodocError> {
        let Some(entry) = self.cache.get(key) else {
            tracing::debug!("cache miss for {} ({})", import_path, key);
            return Ok(None);
        };
        if !want.matches(&entry.payload) {
            tracing::debug!("cache entry {} holds a different payload kind", key);
            return Ok(None);
        }
        if is_remote_import_path(import_path)
            || entry.meta.go_version == self.toolchain_version().await?
        {
            tracing::debug!("cache hit for {} ({})", import_path, key);
            return Ok(Some(entry.payload));
        }
        tracing::debug!("stale cache entry for {} ({})", import_path, key);
        Ok(None)
    }

    async fn get_or_load_pkg(
        &self,
        import_path: &str,
        version: &str,
        token: &CancellationToken,
    ) -> Result<(PackageDoc, String), GodocError> {
        let key = self.primary_key(import_path, version, "").await?;
        if let Some(CachePayload::Package(pkg)) = self.lookup(&key, import_path, Want::Package).await? {
            let pkg_path = cached_pkg_path(&pkg.import_path, import_path);
            return Ok((pkg, pkg_path));
        }

        let built = self.build_doc(import_path, version, false, token).await?;
        let keys = write_keys(key, import_path, &built.actual_version, "");
        self.cache
            .set(&CacheEntry::package(built.package.clone(), built.meta), &keys)?;
        Ok((built.package, built.pkg_path))
    }

    async fn get_or_load_symbol(
        &self,
        import_path: &str,
        symbol: &str,
        version: &str,
        token: &CancellationToken,
    ) -> Result<(SymbolDoc, String), GodocError> {
        let key = self.primary_key(import_path, version, symbol).await?;
        if let Some(CachePayload::Symbol(sym)) = self.lookup(&key, import_path, Want::Symbol).await? {
            let pkg_path = cached_pkg_path(&sym.import_path, import_path);
            return Ok((sym, pkg_path));
        }

        let mut built = self.build_doc(import_path, version, true, token).await?;
        let Some(sym) = built.symbols.remove(symbol) else {
            return Err(GodocError::SymbolNotFound {
                symbol: symbol.to_string(),
                import_path: built.pkg_path,
            });
        };

        let keys = write_keys(key, import_path, &built.actual_version, symbol);
        self.cache.set(&CacheEntry::symbol(sym.clone(), built.meta), &keys)?;
        Ok((sym, built.pkg_path))
    }

    /// Resolves and extracts `import_path`, trying the local project first
    /// and a module sandbox second
    async fn build_doc(
        &self,
        import_path: &str,
        version: &str,
        need_symbols: bool,
        token: &CancellationToken,
    ) -> Result<Built, GodocError> {
        let version = version.trim();
        let remote = is_remote_import_path(import_path);

        let local = match self.resolver.local_dir(import_path).await {
            Ok(dir) => self.load_unit(&dir, import_path, token).await,
            Err(e) => Err(anyhow::Error::new(e)),
        };

        let local_err = match local {
            Ok(unit) => {
                tracing::info!("loaded {} locally", import_path);
                let toolchain_version = self.toolchain_version().await?;
                let meta =
                    CacheMetadata::derive(unit.module.as_ref(), version, &toolchain_version, remote);
                return Ok(finish(unit, need_symbols, version.to_string(), meta));
            }
            Err(e) if is_cancellation(&e) => return Err(GodocError::Cancelled(format!("{e:#}"))),
            Err(e) => e,
        };

        tracing::info!(
            "local load of {} failed, resolving module dependency: {:#}",
            import_path,
            local_err
        );

        let workspace = match self
            .resolver
            .check_module_dep(import_path, version, token)
            .await
        {
            Ok(workspace) => workspace,
            Err(setup) if is_cancellation(&setup) => {
                return Err(GodocError::Cancelled(format!("{setup:#}")));
            }
            Err(setup) => {
                return Err(GodocError::Resolution {
                    local: local_err,
                    setup,
                });
            }
        };

        let unit = match self.load_unit(workspace.path(), import_path, token).await {
            Ok(unit) => unit,
            Err(e) if is_cancellation(&e) => return Err(GodocError::Cancelled(format!("{e:#}"))),
            Err(e) => return Err(GodocError::SandboxLoad(e)),
        };

        let mut actual_version = version_from_mod(workspace.path(), import_path).await;
        if actual_version.is_empty() {
            actual_version = version.to_string();
        }
        tracing::info!(
            "loaded {} from {} at version {:?}",
            import_path,
            workspace.path().display(),
            actual_version
        );

        let toolchain_version = self.toolchain_version().await?;
        let meta =
            CacheMetadata::derive(unit.module.as_ref(), &actual_version, &toolchain_version, remote);
        Ok(finish(unit, need_symbols, actual_version, meta))
    }

    /// Loads syntax first and reloads with type information only when an
    /// interface embeds another element
    async fn load_unit(
        &self,
        dir: &Path,
        import_path: &str,
        token: &CancellationToken,
    ) -> anyhow::Result<LoadedUnit> {
        let request = LoadRequest {
            dir: dir.to_path_buf(),
            import_path: import_path.to_string(),
            mode: LoadMode::Syntax,
            env: self.resolver.toolchain().env(),
            cancel: token.clone(),
        };

        let unit = self.frontend.load(&request).await?;
        if unit.types.is_none() && requires_type_info(&unit.package) {
            tracing::debug!("reloading {} with type information", import_path);
            return self.frontend.load(&request.with_mode(LoadMode::Full)).await;
        }
        Ok(unit)
    }
}

fn finish(unit: LoadedUnit, need_symbols: bool, actual_version: String, meta: CacheMetadata) -> Built {
    let symbols = if need_symbols {
        build_symbol_index(&unit)
    } else {
        SymbolIndex::new()
    };
    Built {
        package: to_pkg_doc(&unit),
        symbols,
        pkg_path: unit.pkg_path,
        actual_version,
        meta,
    }
}

/// Import path reported for a cache hit; legacy entries stored an empty one
fn cached_pkg_path(cached: &str, requested: &str) -> String {
    if cached.is_empty() {
        requested.to_string()
    } else {
        cached.to_string()
    }
}

/// Requested key, version-agnostic key and resolved-version key
fn write_keys(primary: String, import_path: &str, actual_version: &str, symbol: &str) -> Vec<String> {
    let mut keys = vec![primary, cache_key(import_path, "", symbol)];
    if !actual_version.is_empty() {
        keys.push(cache_key(import_path, actual_version, symbol));
    }
    uniq_keys(keys)
}
