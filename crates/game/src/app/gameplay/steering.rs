/// Steps `position` toward `target` by at most `speed * dt` and never past it.
/// Returns true once the position is within `arrival_radius` of the target.
fn move_towards(
    position: &mut Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_radius: f32,
) -> bool {
    let delta = target - *position;
    let distance = delta.length();
    if distance <= arrival_radius {
        return true;
    }
    let step = (speed * fixed_dt_seconds).max(0.0);
    if step >= distance {
        *position = target;
        return true;
    }
    *position += delta * (step / distance);
    distance - step <= arrival_radius
}

fn clamp_to_arena(position: Vec2) -> Vec2 {
    Vec2::new(
        position.x.clamp(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH),
        position.y.clamp(-ARENA_HALF_HEIGHT, ARENA_HALF_HEIGHT),
    )
}

/// Seeded xorshift64* generator. Each scene owns one so runs are reproducible.
#[derive(Debug, Clone)]
struct SimRng {
    state: u64,
}

impl SimRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(bound)) as u32
    }

    fn point_within(&mut self, center: Vec2, radius: f32) -> Vec2 {
        let angle = self.range_f32(0.0, std::f32::consts::TAU);
        let distance = radius * self.next_f32().sqrt();
        clamp_to_arena(center + Vec2::new(angle.cos(), angle.sin()) * distance)
    }

    fn point_in_arena_outside(&mut self, keep_out_center: Vec2, keep_out_radius: f32) -> Vec2 {
        for _ in 0..8 {
            let candidate = Vec2::new(
                self.range_f32(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH),
                self.range_f32(-ARENA_HALF_HEIGHT, ARENA_HALF_HEIGHT),
            );
            if candidate.distance(keep_out_center) > keep_out_radius {
                return candidate;
            }
        }
        keep_out_center + Vec2::new(keep_out_radius + 1.0, 0.0)
    }
}
