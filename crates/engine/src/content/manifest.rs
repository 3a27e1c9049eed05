use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::database::EntityArchetype;

pub(crate) const CACHE_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct CacheManifest {
    pub format_version: u16,
    pub compiler_version: String,
    pub game_version: String,
    pub enabled_mods: Vec<String>,
    pub cache_key_sha256_hex: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct CachedDefs {
    pub cache_key_sha256_hex: String,
    pub defs: Vec<EntityArchetype>,
}

#[derive(Debug, Clone)]
pub(crate) enum ManifestReadState {
    Missing,
    Unreadable,
    Present(CacheManifest),
}

pub(crate) fn read_manifest(path: &Path) -> ManifestReadState {
    let Ok(raw) = fs::read_to_string(path) else {
        return if path.exists() {
            ManifestReadState::Unreadable
        } else {
            ManifestReadState::Missing
        };
    };
    match serde_json::from_str::<CacheManifest>(&raw) {
        Ok(manifest) => ManifestReadState::Present(manifest),
        Err(_) => ManifestReadState::Unreadable,
    }
}

pub(crate) fn read_cached_defs(path: &Path) -> Option<CachedDefs> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

pub(crate) fn content_cache_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("content")
}

pub(crate) fn manifest_path(cache_dir: &Path) -> PathBuf {
    content_cache_dir(cache_dir).join("manifest.json")
}

pub(crate) fn defs_path(cache_dir: &Path) -> PathBuf {
    content_cache_dir(cache_dir).join("defs.json")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_and_garbage_manifests_are_distinguished() {
        let temp = TempDir::new().expect("temp");
        let path = manifest_path(temp.path());
        assert!(matches!(read_manifest(&path), ManifestReadState::Missing));

        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{not json").expect("write");
        assert!(matches!(read_manifest(&path), ManifestReadState::Unreadable));
    }

    #[test]
    fn manifest_reads_back_what_was_written() {
        let temp = TempDir::new().expect("temp");
        let path = manifest_path(temp.path());
        let manifest = CacheManifest {
            format_version: CACHE_FORMAT_VERSION,
            compiler_version: "1".to_string(),
            game_version: "2".to_string(),
            enabled_mods: vec!["fast".to_string()],
            cache_key_sha256_hex: "abc".to_string(),
        };
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, serde_json::to_string(&manifest).expect("json")).expect("write");
        let ManifestReadState::Present(read) = read_manifest(&path) else {
            panic!("expected manifest");
        };
        assert_eq!(read, manifest);
    }
}
