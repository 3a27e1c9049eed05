#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SavedCamera {
    x: f32,
    y: f32,
    zoom: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SavedUnitCounts {
    worker: u32,
    flying: u32,
    fire: u32,
    car: u32,
}

impl SavedUnitCounts {
    fn from_counts(counts: &ColonyCounts) -> Self {
        let count = |kind| counts.of(kind).min(u32::MAX as usize) as u32;
        Self {
            worker: count(UnitKind::Worker),
            flying: count(UnitKind::Flying),
            fire: count(UnitKind::Fire),
            car: count(UnitKind::Car),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (UnitKind, u32)> {
        [
            (UnitKind::Worker, self.worker),
            (UnitKind::Flying, self.flying),
            (UnitKind::Fire, self.fire),
            (UnitKind::Car, self.car),
        ]
        .into_iter()
    }

    fn total(&self) -> u64 {
        self.iter().map(|(_, count)| u64::from(count)).sum()
    }
}

/// Economy snapshot; units are restored by count, not by position or state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SaveGame {
    save_version: u32,
    food: u64,
    total_food_collected: u64,
    food_multiplier: f32,
    bosses_defeated: u32,
    next_boss_threshold: u64,
    upgrades: UpgradeLevels,
    unit_counts: SavedUnitCounts,
    queen_alive: bool,
    camera: SavedCamera,
}

#[derive(Debug, Error)]
enum SaveError {
    #[error("failed to read save {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write save {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse save json{}: {message}", at_path(.path))]
    Parse { path: String, message: String },
    #[error("validation failed at {path}: {message}")]
    Invalid { path: &'static str, message: String },
}

impl SaveError {
    /// The file was readable but its contents were refused.
    fn is_rejected_content(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Invalid { .. })
    }
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

fn save_file_path(saves_dir: &Path) -> PathBuf {
    saves_dir.join(SAVE_FILE_NAME)
}

fn rejected_save_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(REJECTED_SAVE_SUFFIX);
    PathBuf::from(name)
}

fn write_save_file(path: &Path, save: &SaveGame) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(save).map_err(SaveError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_save_file(path: &Path) -> Result<SaveGame, SaveError> {
    let raw = fs::read_to_string(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let save = parse_save_game_json(&raw)?;
    validate_save_game(&save)?;
    Ok(save)
}

fn parse_save_game_json(raw: &str) -> Result<SaveGame, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        SaveError::Parse {
            path,
            message: error.into_inner().to_string(),
        }
    })
}

fn invalid(path: &'static str, expected: impl Display, actual: impl Display) -> SaveError {
    SaveError::Invalid {
        path,
        message: format!("expected {expected}, got {actual}"),
    }
}

fn validate_save_game(save: &SaveGame) -> Result<(), SaveError> {
    if save.save_version != SAVE_VERSION {
        return Err(invalid("save_version", SAVE_VERSION, save.save_version));
    }
    if !save.food_multiplier.is_finite() || save.food_multiplier < 1.0 {
        return Err(invalid(
            "food_multiplier",
            "finite number >= 1",
            save.food_multiplier,
        ));
    }
    if save.next_boss_threshold == 0 {
        return Err(invalid("next_boss_threshold", "value > 0", 0));
    }
    for (path, kind, level) in [
        ("upgrades.speed", UpgradeKind::Speed, save.upgrades.speed),
        ("upgrades.capacity", UpgradeKind::Capacity, save.upgrades.capacity),
        ("upgrades.food_tier", UpgradeKind::FoodTier, save.upgrades.food_tier),
        ("upgrades.spawn_rate", UpgradeKind::SpawnRate, save.upgrades.spawn_rate),
    ] {
        let max_level = kind.max_level().unwrap_or(SAVED_UPGRADE_LEVEL_LIMIT);
        if level > max_level {
            return Err(invalid(path, format!("level <= {max_level}"), level));
        }
    }
    let queen = u64::from(save.queen_alive);
    if save.unit_counts.total() + queen > MAX_UNITS as u64 {
        return Err(invalid(
            "unit_counts",
            format!("at most {MAX_UNITS} units"),
            save.unit_counts.total() + queen,
        ));
    }
    if !save.camera.x.is_finite() {
        return Err(invalid("camera.x", "finite number", save.camera.x));
    }
    if !save.camera.y.is_finite() {
        return Err(invalid("camera.y", "finite number", save.camera.y));
    }
    if !save.camera.zoom.is_finite() || save.camera.zoom <= 0.0 {
        return Err(invalid("camera.zoom", "finite number > 0", save.camera.zoom));
    }
    Ok(())
}
