//! Minimal `go.mod` reading: the module path and its `require` directives

use std::path::Path;

use anyhow::{Context, Result};

pub const GO_MOD: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
}

/// Parsed subset of a `go.mod` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: Option<String>,
    pub requires: Vec<Requirement>,
}

impl GoMod {
    pub fn parse(contents: &str) -> Self {
        let mut module = None;
        let mut requires = Vec::new();
        let mut in_require_block = false;

        for raw in contents.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if in_require_block {
                if line == ")" {
                    in_require_block = false;
                } else if let Some(req) = parse_requirement(line) {
                    requires.push(req);
                }
                continue;
            }

            let mut words = line.splitn(2, char::is_whitespace);
            let directive = words.next().unwrap_or_default();
            let rest = words.next().unwrap_or_default().trim();

            match directive {
                "module" => module = Some(unquote(rest).to_string()),
                "require" if rest == "(" => in_require_block = true,
                "require" => requires.extend(parse_requirement(rest)),
                _ => {}
            }
        }

        Self { module, requires }
    }

    /// Reads and parses `<dir>/go.mod`
    pub async fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(GO_MOD);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Version required for exactly `module_path`
    pub fn required_version(&self, module_path: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|r| r.path == module_path)
            .map(|r| r.version.as_str())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

fn parse_requirement(line: &str) -> Option<Requirement> {
    let mut parts = line.split_whitespace();
    let path = unquote(parts.next()?);
    let version = parts.next()?;
    if path.is_empty() || parts.next().is_some() {
        return None;
    }

    Some(Requirement {
        path: path.to_string(),
        version: version.to_string(),
    })
}

/// Version of `import_path` required by `<dir>/go.mod`, empty when the file
/// is missing, unreadable or does not require it
pub async fn version_from_mod(dir: &Path, import_path: &str) -> String {
    match GoMod::read(dir).await {
        Ok(gomod) => gomod
            .required_version(import_path)
            .unwrap_or_default()
            .trim()
            .to_string(),
        Err(e) => {
            tracing::debug!("{:#}", e);
            String::new()
        }
    }
}
