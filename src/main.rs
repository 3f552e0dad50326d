use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use go_docs::cache::CacheConfig;
use go_docs::cache::store::SNAPSHOT_FILE;
use go_docs::docs::to_markdown;
use go_docs::frontend::command::DEFAULT_FRONTEND;
use go_docs::{DocRequest, Godoc, GodocOptions};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Go package documentation viewer with a persistent cache
///
/// Targets: `<pkg>`, `<sym>[.<member>]`, `<pkg>.<sym>[.<member>]` or
/// `<pkg> <sym>[.<member>]`. With no target the current directory is used.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// Target operating system (e.g. linux, darwin, windows)
    #[arg(long)]
    goos: Option<String>,

    /// Target architecture (e.g. amd64, arm64)
    #[arg(long)]
    goarch: Option<String>,

    /// Working directory for package resolution
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Module version (e.g. v1.2.3, latest)
    #[arg(long, default_value = "")]
    version: String,

    /// Cache directory (defaults to the user cache dir)
    #[arg(long, env = "GODOC_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Abort the lookup after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output raw JSON
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Output rendered HTML of the doc comment
    #[arg(long)]
    html: bool,

    /// Language front-end program
    #[arg(long, env = "GODOC_FRONTEND", default_value = DEFAULT_FRONTEND)]
    frontend: PathBuf,

    /// Go toolchain program
    #[arg(long = "go", env = "GODOC_GO", default_value = "go")]
    go_program: PathBuf,

    /// Package and/or symbol to document
    #[arg(value_name = "TARGET")]
    targets: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let (import_path, symbol) = parse_targets(&args.targets)?;
    tracing::debug!("resolved target {:?} symbol {:?}", import_path, symbol);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let request = DocRequest {
        import_path,
        symbol,
        version: args.version.clone(),
    };
    let godoc = Godoc::new(options(&args, cancel))?;
    let result = godoc
        .load_request(&request)
        .await
        .context("Failed to load documentation")?;

    if args.json {
        println!("{}", result.to_json_pretty());
    } else if args.html {
        print!("{}", result.html());
    } else {
        print!("{}", to_markdown(&result));
    }
    Ok(())
}

fn options(args: &Args, cancel: CancellationToken) -> GodocOptions {
    let mut options = GodocOptions::new()
        .go_program(&args.go_program)
        .frontend_program(&args.frontend)
        .cancellation_token(cancel);

    if let Some(goos) = args.goos.as_deref().filter(|s| !s.is_empty()) {
        options = options.goos(goos);
    }
    if let Some(goarch) = args.goarch.as_deref().filter(|s| !s.is_empty()) {
        options = options.goarch(goarch);
    }
    if let Some(dir) = &args.workdir {
        options = options.workdir(dir);
    }
    if let Some(dir) = &args.cache_dir {
        tracing::info!("Using custom cache directory: {}", dir.display());
        options = options.cache_config(CacheConfig::default().with_path(dir.join(SNAPSHOT_FILE)));
    }
    if let Some(secs) = args.timeout_secs {
        options = options.timeout(Duration::from_secs(secs));
    }
    options
}

/// Splits the positional arguments into `(import_path, symbol)`
fn parse_targets(targets: &[String]) -> Result<(String, String)> {
    match targets {
        [] => Ok((".".to_string(), String::new())),
        [single] => parse_single(single),
        [pkg, sym] => {
            if sym.is_empty() {
                bail!("selector must not be empty");
            }
            let pkg = match normalize_package(pkg) {
                p if p.is_empty() => ".".to_string(),
                p => p,
            };
            Ok((pkg, sym.clone()))
        }
        _ => bail!("too many arguments; expected `<pkg> [<sym>]`"),
    }
}

fn parse_single(arg: &str) -> Result<(String, String)> {
    if arg.is_empty() {
        bail!("argument must not be empty");
    }
    if normalize_package(arg) == "." {
        return Ok((".".to_string(), String::new()));
    }

    // The selector starts at the first dot after the last slash
    if let Some(slash) = arg.rfind('/') {
        let suffix = &arg[slash + 1..];
        return Ok(match suffix.find('.') {
            None => (normalize_package(arg), String::new()),
            Some(dot) => (
                normalize_package(&arg[..slash + 1 + dot]),
                suffix[dot + 1..].to_string(),
            ),
        });
    }

    let Some((prefix, sel)) = arg.split_once('.') else {
        if is_exported(arg) {
            return Ok((".".to_string(), arg.to_string()));
        }
        return Ok((normalize_package(arg), String::new()));
    };

    if sel.is_empty() {
        return Ok((normalize_package(prefix), String::new()));
    }
    if is_exported(prefix) {
        // `Type.Method` in the current package
        return Ok((".".to_string(), arg.to_string()));
    }
    Ok((normalize_package(prefix), sel.to_string()))
}

fn normalize_package(arg: &str) -> String {
    let mut arg = arg;
    while arg.len() > 1 && arg.ends_with('/') {
        arg = &arg[..arg.len() - 1];
    }
    if arg == "./" {
        return ".".to_string();
    }
    arg.to_string()
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (String, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_targets(&args).unwrap()
    }

    fn pair(pkg: &str, sym: &str) -> (String, String) {
        (pkg.to_string(), sym.to_string())
    }

    #[test]
    fn test_no_args_is_current_package() {
        assert_eq!(parse(&[]), pair(".", ""));
    }

    #[test]
    fn test_single_arg_forms() {
        assert_eq!(parse(&["fmt"]), pair("fmt", ""));
        assert_eq!(parse(&["fmt.Println"]), pair("fmt", "Println"));
        assert_eq!(parse(&["fmt."]), pair("fmt", ""));
        assert_eq!(parse(&["Buffer"]), pair(".", "Buffer"));
        assert_eq!(parse(&["Buffer.Len"]), pair(".", "Buffer.Len"));
        assert_eq!(parse(&["./"]), pair(".", ""));
        assert_eq!(parse(&["net/http/"]), pair("net/http", ""));
        assert_eq!(parse(&["net/http.Client.Do"]), pair("net/http", "Client.Do"));
        assert_eq!(
            parse(&["github.com/user/repo.Thing"]),
            pair("github.com/user/repo", "Thing")
        );
        assert_eq!(
            parse(&["github.com/user/repo"]),
            pair("github.com/user/repo", "")
        );
    }

    #[test]
    fn test_two_args() {
        assert_eq!(parse(&["net/http/", "Client.Do"]), pair("net/http", "Client.Do"));
        assert_eq!(parse(&["", "Buffer"]), pair(".", "Buffer"));
    }

    #[test]
    fn test_rejected_args() {
        let bad = |args: &[&str]| {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            parse_targets(&args).is_err()
        };
        assert!(bad(&[""]));
        assert!(bad(&["fmt", ""]));
        assert!(bad(&["a", "b", "c"]));
    }

    #[test]
    fn test_cli_flags() {
        let args = Args::try_parse_from([
            "go-docs",
            "--goos",
            "linux",
            "--version",
            "v1.2.3",
            "--json",
            "github.com/user/repo",
            "Thing",
        ])
        .unwrap();
        assert_eq!(args.goos.as_deref(), Some("linux"));
        assert_eq!(args.version, "v1.2.3");
        assert!(args.json);
        assert_eq!(args.targets, vec!["github.com/user/repo", "Thing"]);

        assert!(Args::try_parse_from(["go-docs", "--json", "--html", "fmt"]).is_err());
    }
}
