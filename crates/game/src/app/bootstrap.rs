use ants_engine::{resolve_app_paths, ContentPlanRequest, LoopConfig, Scene, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay;

const ENABLED_MODS_ENV_VAR: &str = "IDLE_ANTS_ENABLED_MODS";
const AUTOSAVE_ENV_VAR: &str = "IDLE_ANTS_AUTOSAVE_SECS";
const DEFAULT_AUTOSAVE_SECONDS: f32 = 30.0;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Idle Ants Startup ===");

    let paths = resolve_app_paths()?;
    let autosave_seconds = parse_autosave_seconds(std::env::var(AUTOSAVE_ENV_VAR).ok().as_deref());
    info!(
        root = %paths.root.display(),
        saves_dir = %paths.saves_dir.display(),
        autosave_seconds,
        "app_paths_resolved"
    );
    let scene = gameplay::build_colony_scene(paths.saves_dir, autosave_seconds);
    let config = LoopConfig {
        content_plan_request: ContentPlanRequest {
            enabled_mods: parse_enabled_mods(std::env::var(ENABLED_MODS_ENV_VAR).ok().as_deref()),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
            game_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        ..LoopConfig::default()
    };

    Ok(AppWiring { config, scene })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_enabled_mods(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

/// `0` disables autosave; unset or unparsable values use the default interval.
fn parse_autosave_seconds(raw: Option<&str>) -> f32 {
    let Some(raw) = raw else {
        return DEFAULT_AUTOSAVE_SECONDS;
    };
    match raw.trim().parse::<f32>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds,
        _ => {
            warn!(
                var = AUTOSAVE_ENV_VAR,
                value = raw,
                default = DEFAULT_AUTOSAVE_SECONDS,
                "invalid_autosave_interval"
            );
            DEFAULT_AUTOSAVE_SECONDS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_mods_are_trimmed_and_empty_entries_dropped() {
        assert_eq!(
            parse_enabled_mods(Some(" bigger_ants , ,night_mode,")),
            vec!["bigger_ants".to_string(), "night_mode".to_string()]
        );
        assert!(parse_enabled_mods(None).is_empty());
    }

    #[test]
    fn autosave_interval_parses_and_falls_back() {
        assert_eq!(parse_autosave_seconds(None), DEFAULT_AUTOSAVE_SECONDS);
        assert_eq!(parse_autosave_seconds(Some("0")), 0.0);
        assert_eq!(parse_autosave_seconds(Some(" 12.5 ")), 12.5);
        assert_eq!(parse_autosave_seconds(Some("-3")), DEFAULT_AUTOSAVE_SECONDS);
        assert_eq!(parse_autosave_seconds(Some("soon")), DEFAULT_AUTOSAVE_SECONDS);
    }
}
