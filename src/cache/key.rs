//! Cache key construction

use std::collections::HashSet;

use crate::resolver::is_remote_import_path;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Fingerprint of `(import_path, version, symbol)` as lower-case hex
pub fn cache_key(import_path: &str, version: &str, symbol: &str) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    hash = fnv1a(hash, import_path.as_bytes());
    hash = fnv1a(hash, &[0]);
    hash = fnv1a(hash, version.as_bytes());
    hash = fnv1a(hash, &[0]);
    hash = fnv1a(hash, symbol.as_bytes());
    format!("{hash:x}")
}

/// Drops empty keys and repeats, keeping the first occurrence of each
pub fn uniq_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .map(Into::into)
        .filter(|key| !key.is_empty() && seen.insert(key.clone()))
        .collect()
}

/// Version component of the primary cache key.
///
/// Empty for the current project, the toolchain version for standard and
/// local packages, the requested version for remote packages.
pub fn expected_version(import_path: &str, requested: &str, toolchain_version: &str) -> String {
    if import_path == "." {
        return String::new();
    }
    if !is_remote_import_path(import_path) {
        return toolchain_version.to_string();
    }
    requested.trim().to_string()
}
