#[derive(Debug, Clone, PartialEq)]
enum CinematicAction {
    PanCamera { to: Vec2 },
    ReturnCamera,
    ShowBanner(String),
    HideBanner,
    Burst { at: Vec2, color: [u8; 3] },
    SpawnBoss { at: Vec2 },
    Hold,
    EngageBoss,
}

#[derive(Debug, Clone, PartialEq)]
struct CinematicStep {
    action: CinematicAction,
    duration_ticks: u32,
}

/// Everything that happened in one `advance` call.
#[derive(Debug, Clone, Default, PartialEq)]
struct CinematicFrame {
    /// Actions whose step began this tick, in step order.
    fired: Vec<CinematicAction>,
    /// The timed step in progress after this tick and how far through it is, `0.0..=1.0`.
    active: Option<(CinematicAction, f32)>,
    finished: bool,
}

/// Linear list of timed steps advanced by the simulation tick. A step fires on the tick after
/// the previous timed step ends; zero-length steps complete at once and fire together with
/// the steps that follow them.
#[derive(Debug, Clone, PartialEq)]
struct CinematicSequence {
    name: &'static str,
    steps: Vec<CinematicStep>,
    current: usize,
    ticks_in_step: u32,
}

impl CinematicSequence {
    fn new(name: &'static str, steps: Vec<CinematicStep>) -> Self {
        Self {
            name,
            steps,
            current: 0,
            ticks_in_step: 0,
        }
    }

    fn is_finished(&self) -> bool {
        self.current >= self.steps.len()
    }

    fn advance(&mut self) -> CinematicFrame {
        let mut frame = CinematicFrame::default();
        while let Some(step) = self.steps.get(self.current) {
            if self.ticks_in_step == 0 {
                frame.fired.push(step.action.clone());
            }
            if step.duration_ticks == 0 {
                self.current += 1;
                continue;
            }
            self.ticks_in_step += 1;
            let progress = self.ticks_in_step as f32 / step.duration_ticks as f32;
            frame.active = Some((step.action.clone(), progress.min(1.0)));
            if self.ticks_in_step >= step.duration_ticks {
                self.current += 1;
                self.ticks_in_step = 0;
            }
            break;
        }
        frame.finished = self.is_finished();
        frame
    }
}

fn seconds_to_ticks(seconds: f32, fixed_dt_seconds: f32) -> u32 {
    if fixed_dt_seconds <= 0.0 {
        return 0;
    }
    (seconds / fixed_dt_seconds).round().max(0.0) as u32
}

const BOSS_INTRO_BANNER: &str = "AN ANTEATER APPROACHES!";
const BOSS_BURST_COLOR: [u8; 3] = [255, 170, 60];
const BOSS_DEFEAT_BURST_COLOR: [u8; 3] = [255, 230, 120];

fn boss_intro_sequence(entry: Vec2, fixed_dt_seconds: f32) -> CinematicSequence {
    let step = |action, seconds| CinematicStep {
        action,
        duration_ticks: seconds_to_ticks(seconds, fixed_dt_seconds),
    };
    CinematicSequence::new(
        "boss_intro",
        vec![
            step(CinematicAction::PanCamera { to: entry }, 1.5),
            step(CinematicAction::ShowBanner(BOSS_INTRO_BANNER.to_string()), 2.0),
            step(
                CinematicAction::Burst {
                    at: entry,
                    color: BOSS_BURST_COLOR,
                },
                0.0,
            ),
            step(CinematicAction::SpawnBoss { at: entry }, 0.0),
            step(CinematicAction::Hold, 1.0),
            step(CinematicAction::HideBanner, 0.0),
            step(CinematicAction::ReturnCamera, 1.0),
            step(CinematicAction::EngageBoss, 0.0),
        ],
    )
}

fn boss_defeat_sequence(at: Vec2, reward: u64, fixed_dt_seconds: f32) -> CinematicSequence {
    let step = |action, seconds| CinematicStep {
        action,
        duration_ticks: seconds_to_ticks(seconds, fixed_dt_seconds),
    };
    CinematicSequence::new(
        "boss_defeat",
        vec![
            step(
                CinematicAction::Burst {
                    at,
                    color: BOSS_DEFEAT_BURST_COLOR,
                },
                0.0,
            ),
            step(
                CinematicAction::ShowBanner(format!("ANTEATER DEFEATED! +{reward} FOOD")),
                2.5,
            ),
            step(CinematicAction::HideBanner, 0.0),
        ],
    )
}

fn burst_particles(at: Vec2, color: [u8; 3], rng: &mut SimRng) -> Vec<Particle> {
    (0..48)
        .map(|_| {
            let angle = rng.range_f32(0.0, std::f32::consts::TAU);
            let speed = rng.range_f32(3.0, 9.0);
            Particle {
                position: at,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                ttl_seconds: rng.range_f32(0.6, 1.4),
                size_px: 2 + rng.below(3) as i32,
            }
        })
        .collect()
}
