use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
mod sprite_keys;

pub use app::{
    run_app, run_app_with_metrics, screen_to_world_px, world_to_screen_px, Adornment, AppError,
    Camera2D, Entity, EntityId, EntityVisual, HotkeySet, HudSnapshot, InputAction, InputSnapshot,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, Particle, RenderLayer, RenderableDesc,
    RenderableKind, Renderer, Scene, SceneCommand, SceneWorld, Transform, Vec2, Viewport,
    MAX_PARTICLES, PIXELS_PER_WORLD, SLOW_FRAME_ENV_VAR,
};
pub use content::{
    build_or_load_def_database, compile_def_database, load_or_compile_def_database,
    write_text_atomic, CacheDecision, ContentCompileError, ContentErrorCode, ContentPipelineError,
    ContentPlanError, ContentPlanRequest, DefDatabase, EntityArchetype, EntityDefId,
    RebuildReason, SourceLocation,
};
pub use sprite_keys::SpriteKeyError;

pub const ROOT_ENV_VAR: &str = "IDLE_ANTS_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub mods_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub saves_dir: PathBuf,
}

impl AppPaths {
    /// Lays out the standard directories under `root` without touching the disk.
    pub fn under_root(root: &Path) -> Self {
        let cache_dir = root.join("cache");
        Self {
            root: root.to_path_buf(),
            base_content_dir: root.join("assets").join("base"),
            mods_dir: root.join("mods"),
            saves_dir: cache_dir.join("saves"),
            cache_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{env_var} is set but does not point to a colony root: {path}\n\
A colony root contains Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "no colony root found above {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Point {env_var} at the checkout, e.g. `export {env_var}=/path/to/idle-ants`"
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let paths = AppPaths::under_root(&root);
    for dir in [&paths.cache_dir, &paths.saves_dir] {
        fs::create_dir_all(dir).map_err(|source| StartupError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let candidate = canonical_or_raw(Path::new(&value));
            if looks_like_root(&candidate) {
                Ok(candidate)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: candidate,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| looks_like_root(candidate))
                .map(canonical_or_raw)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: canonical_or_raw(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn looks_like_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && (path.join("crates").is_dir() || path.join("assets").is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
