use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::AppPaths;

use super::atomic_io::write_text_atomic;
use super::compiler::{compile_sources, ContentCompileError};
use super::database::DefDatabase;
use super::discovery::{discover_mod_sources, ModSource};
use super::hashing::{hash_mod_xml_inputs, hash_parts};
use super::manifest::{
    defs_path, manifest_path, read_cached_defs, read_manifest, CacheManifest, CachedDefs,
    ManifestReadState, CACHE_FORMAT_VERSION,
};
use super::types::{ContentPlanError, ContentPlanRequest};

#[derive(Debug, Error)]
pub enum ContentPipelineError {
    #[error(transparent)]
    Plan(#[from] ContentPlanError),
    #[error(transparent)]
    Compile(#[from] ContentCompileError),
    #[error("failed to write content cache {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode content cache: {0}")]
    CacheEncode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    ManifestMissing,
    ManifestUnreadable,
    KeyMismatch,
    DefsUnreadable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Hit,
    Rebuilt { reason: RebuildReason },
}

pub fn build_or_load_def_database(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<DefDatabase, ContentPipelineError> {
    load_or_compile_def_database(app_paths, request).map(|(database, _)| database)
}

/// Loads the compiled def cache when its key matches the current inputs, otherwise recompiles
/// every source and rewrites the cache.
pub fn load_or_compile_def_database(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<(DefDatabase, CacheDecision), ContentPipelineError> {
    let sources = discover_mod_sources(app_paths, request)?;
    let cache_key = compute_cache_key(&sources, request)?;
    let manifest_path = manifest_path(&app_paths.cache_dir);
    let defs_path = defs_path(&app_paths.cache_dir);

    let reason = match read_manifest(&manifest_path) {
        ManifestReadState::Missing => RebuildReason::ManifestMissing,
        ManifestReadState::Unreadable => RebuildReason::ManifestUnreadable,
        ManifestReadState::Present(manifest)
            if manifest.format_version != CACHE_FORMAT_VERSION
                || manifest.cache_key_sha256_hex != cache_key =>
        {
            RebuildReason::KeyMismatch
        }
        ManifestReadState::Present(_) => match read_cached_defs(&defs_path) {
            Some(cached) if cached.cache_key_sha256_hex == cache_key => {
                info!(
                    def_count = cached.defs.len(),
                    source_count = sources.len(),
                    cache_key = %cache_key,
                    "content_cache_hit"
                );
                return Ok((
                    DefDatabase::from_entity_defs(cached.defs),
                    CacheDecision::Hit,
                ));
            }
            _ => RebuildReason::DefsUnreadable,
        },
    };

    if reason != RebuildReason::ManifestMissing {
        warn!(reason = ?reason, cache_key = %cache_key, "content_cache_invalid_rebuilding");
    }

    let database = compile_sources(&sources)?;
    write_cache(app_paths, request, &cache_key, &database)?;
    info!(
        def_count = database.entity_defs().len(),
        source_count = sources.len(),
        reason = ?reason,
        cache_key = %cache_key,
        "content_compiled"
    );
    Ok((database, CacheDecision::Rebuilt { reason }))
}

fn compute_cache_key(
    sources: &[ModSource],
    request: &ContentPlanRequest,
) -> Result<String, ContentPlanError> {
    let mut parts = vec![
        CACHE_FORMAT_VERSION.to_string(),
        request.compiler_version.clone(),
        request.game_version.clone(),
    ];
    for source in sources {
        let input = hash_mod_xml_inputs(&source.source_dir)?;
        parts.push(source.mod_id.clone());
        parts.push(input.xml_file_count.to_string());
        parts.push(input.hash_hex);
    }
    Ok(hash_parts(parts.iter().map(String::as_str)))
}

fn write_cache(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
    cache_key: &str,
    database: &DefDatabase,
) -> Result<(), ContentPipelineError> {
    let defs = CachedDefs {
        cache_key_sha256_hex: cache_key.to_string(),
        defs: database.entity_defs().to_vec(),
    };
    let manifest = CacheManifest {
        format_version: CACHE_FORMAT_VERSION,
        compiler_version: request.compiler_version.clone(),
        game_version: request.game_version.clone(),
        enabled_mods: request.enabled_mods.clone(),
        cache_key_sha256_hex: cache_key.to_string(),
    };

    // Defs land before the manifest so a crash in between only forces a rebuild.
    let defs_path = defs_path(&app_paths.cache_dir);
    write_text_atomic(&defs_path, &serde_json::to_string(&defs)?).map_err(|source| {
        ContentPipelineError::CacheIo {
            path: defs_path.clone(),
            source,
        }
    })?;
    let manifest_path = manifest_path(&app_paths.cache_dir);
    write_text_atomic(&manifest_path, &serde_json::to_string_pretty(&manifest)?).map_err(
        |source| ContentPipelineError::CacheIo {
            path: manifest_path.clone(),
            source,
        },
    )
}
