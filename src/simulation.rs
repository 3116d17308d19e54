// --- File: simulation.rs ---
use crate::config::TankConfig;
use crate::fish::{Fish, FishKind, FishRecord, calc_target_height};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type SimRng = StdRng;

/// Sole owner of every fish in the tank. Sizes are in logical pixels.
pub struct FishTank {
    fishes: Vec<Fish>,
    rng: SimRng,
    width: f32,
    height: f32,
    pub config: TankConfig,
}

impl FishTank {
    pub fn new(width: f32, height: f32, config: TankConfig) -> Self {
        Self::with_rng(width, height, config, SimRng::from_entropy())
    }

    /// Deterministic tank for reproducible runs and tests.
    pub fn with_seed(width: f32, height: f32, config: TankConfig, seed: u64) -> Self {
        Self::with_rng(width, height, config, SimRng::seed_from_u64(seed))
    }

    fn with_rng(width: f32, height: f32, config: TankConfig, rng: SimRng) -> Self {
        Self {
            fishes: Vec::new(),
            rng,
            width,
            height,
            config,
        }
    }

    // --- Spawning ---

    fn random_speed(rng: &mut SimRng, config: &TankConfig) -> f32 {
        if config.max_speed > config.min_speed {
            rng.gen_range(config.min_speed..=config.max_speed)
        } else {
            config.min_speed
        }
    }

    fn random_y(rng: &mut SimRng, config: &TankConfig, tank_height: f32) -> f32 {
        let (top, bottom) = config.vertical_band(tank_height);
        if bottom > top {
            rng.gen_range(top..bottom)
        } else {
            top
        }
    }

    fn spawn(&mut self, kind: FishKind, likes: u32) -> usize {
        let rng = &mut self.rng;
        let config = &self.config;
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let x = if self.width > 0.0 {
            rng.gen_range(0.0..self.width)
        } else {
            0.0
        };
        let y = Self::random_y(rng, config, self.height);
        let vx = Self::random_speed(rng, config) * direction;
        let tail_phase = rng.gen_range(0.0..config.phase_range);
        let float_phase = rng.gen_range(0.0..config.phase_range);
        let float_amp = if config.max_float_amp > config.min_float_amp {
            rng.gen_range(config.min_float_amp..config.max_float_amp)
        } else {
            config.min_float_amp
        };

        self.fishes.push(Fish {
            kind,
            position: Vec2::new(x, y),
            vx,
            tail_phase,
            float_phase,
            float_amp,
            likes,
            target_height: calc_target_height(likes),
            paused: false,
            saved_vx: vx,
        });
        self.fishes.len() - 1
    }

    /// Adds a user-drawn fish and returns its index in creation order.
    pub fn add_fish(&mut self, record: FishRecord) -> usize {
        let kind = FishKind::User {
            fish_id: record.fish_id,
            texture_index: record.texture_index,
            img_width: record.img_width,
            img_height: record.img_height,
            swim_mode: record.swim_mode,
        };
        let index = self.spawn(kind, record.likes);
        log::debug!("added user fish #{index} with {} likes", record.likes);
        index
    }

    pub fn add_ambient_fish(&mut self, preset_index: usize) -> usize {
        let scale = if self.config.ambient_max_scale > self.config.ambient_min_scale {
            self.rng
                .gen_range(self.config.ambient_min_scale..self.config.ambient_max_scale)
        } else {
            self.config.ambient_min_scale
        };
        let kind = FishKind::Ambient {
            preset_index,
            size: self.config.ambient_size,
            scale,
        };
        self.spawn(kind, 0)
    }

    // --- Queries ---

    pub fn fishes(&self) -> &[Fish] {
        &self.fishes
    }

    pub fn fish_count(&self) -> usize {
        self.fishes.len()
    }

    pub fn get_fish_by_id(&self, fish_id: &str) -> Option<&Fish> {
        self.fishes.iter().find(|f| f.fish_id() == Some(fish_id))
    }

    fn fish_by_id_mut(&mut self, fish_id: &str) -> Option<&mut Fish> {
        self.fishes.iter_mut().find(|f| f.fish_id() == Some(fish_id))
    }

    /// Topmost user fish under a logical point. Later fish are drawn on top,
    /// so they win on overlap.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&Fish> {
        let point = Vec2::new(x, y);
        self.fishes
            .iter()
            .rev()
            .filter(|f| f.is_user_fish())
            .find(|f| f.contains(point))
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    // --- Mutation by id ---

    pub fn update_likes(&mut self, fish_id: &str, likes: u32) -> bool {
        match self.fish_by_id_mut(fish_id) {
            Some(fish) => {
                fish.set_likes(likes);
                true
            }
            None => {
                log::debug!("update_likes: no fish '{fish_id}'");
                false
            }
        }
    }

    pub fn pause(&mut self, fish_id: &str) -> bool {
        let Some(fish) = self.fish_by_id_mut(fish_id) else {
            return false;
        };
        if !fish.paused {
            fish.saved_vx = fish.vx;
            fish.vx = 0.0;
            fish.paused = true;
        }
        true
    }

    pub fn resume(&mut self, fish_id: &str) -> bool {
        let Some(fish) = self.fish_by_id_mut(fish_id) else {
            return false;
        };
        if fish.paused {
            fish.paused = false;
            fish.vx = fish.saved_vx;
        }
        true
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Drops every fish. Used when the renderer is torn down.
    pub fn clear(&mut self) {
        self.fishes.clear();
    }

    // --- Per-tick update ---

    /// Integrates every fish, then pushes overlapping pairs apart.
    pub fn step(&mut self) {
        self.update();
        self.separate();
    }

    pub fn update(&mut self) {
        let (width, height) = (self.width, self.height);
        for fish in self.fishes.iter_mut() {
            Self::update_fish(fish, &mut self.rng, &self.config, width, height);
        }
    }

    fn update_fish(fish: &mut Fish, rng: &mut SimRng, config: &TankConfig, width: f32, height: f32) {
        if fish.paused {
            return;
        }
        fish.position.x += fish.vx;
        fish.tail_phase += config.tail_phase_step;
        fish.float_phase += config.float_phase_step;
        fish.position.y += fish.float_phase.sin() * fish.float_amp * config.float_scale;

        let margin = fish.margin();
        let past_right = fish.vx > 0.0 && fish.position.x > width + margin;
        let past_left = fish.vx < 0.0 && fish.position.x < -margin;
        if !(past_right || past_left) {
            return;
        }

        let speed = Self::random_speed(rng, config);
        let reflect = rng.gen_bool(0.5);
        let (x, vx) = match (past_right, reflect) {
            // Turn around at the edge it left through.
            (true, true) => (width + margin, -speed),
            (false, true) => (-margin, speed),
            // Re-enter from the opposite edge, same heading.
            (true, false) => (-margin, speed),
            (false, false) => (width + margin, -speed),
        };
        fish.position.x = x;
        fish.vx = vx;
        fish.position.y = Self::random_y(rng, config, height);
    }

    /// One relaxation pass over all pairs. Overlap is split between two moving
    /// fish; a paused fish stays put and its neighbor takes the whole push.
    pub fn separate(&mut self) {
        let factor = self.config.radius_factor;
        let floor = self.config.separation_floor;
        let n = self.fishes.len();
        for i in 0..n {
            let (head, tail) = self.fishes.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                let min_dist = a.collision_radius(factor) + b.collision_radius(factor);
                let delta = b.position - a.position;
                let dist = delta.length();
                if dist >= min_dist || dist <= floor {
                    continue;
                }
                let normal = delta / dist;
                let overlap = min_dist - dist;
                match (a.paused, b.paused) {
                    (false, false) => {
                        a.position -= normal * (overlap / 2.0);
                        b.position += normal * (overlap / 2.0);
                    }
                    (true, false) => b.position += normal * overlap,
                    (false, true) => a.position -= normal * overlap,
                    (true, true) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::SwimMode;

    fn record(id: &str, likes: u32) -> FishRecord {
        FishRecord {
            fish_id: Some(id.to_string()),
            texture_index: 0,
            img_width: 100.0,
            img_height: 200.0,
            likes,
            swim_mode: SwimMode::Wave,
        }
    }

    fn tank() -> FishTank {
        FishTank::with_seed(800.0, 600.0, TankConfig::default(), 7)
    }

    #[test]
    fn spawn_respects_ranges() {
        let mut tank = tank();
        for i in 0..50 {
            tank.add_fish(record(&format!("f{i}"), i));
        }
        for fish in tank.fishes() {
            let speed = fish.vx.abs();
            assert!((0.3..=0.8).contains(&speed), "speed {speed}");
            assert!((0.0..800.0).contains(&fish.position.x));
            assert!((80.0..480.0).contains(&fish.position.y));
            assert!((2.0..5.0).contains(&fish.float_amp));
            assert!((0.0..std::f32::consts::TAU).contains(&fish.tail_phase));
        }
    }

    #[test]
    fn overlapping_pair_is_fully_separated() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        tank.add_fish(record("b", 0));
        tank.fishes[0].position = Vec2::new(100.0, 100.0);
        tank.fishes[1].position = Vec2::new(120.0, 100.0);

        tank.separate();

        // Radii 22.5 each, so 45 apart; each moved half of the 25 overlap.
        let (a, b) = (tank.fishes[0].position, tank.fishes[1].position);
        assert!((a.distance(b) - 45.0).abs() < 1e-4);
        assert!((a.x - 87.5).abs() < 1e-4);
        assert!((b.x - 132.5).abs() < 1e-4);
    }

    #[test]
    fn paused_fish_does_not_move_during_separation() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        tank.add_fish(record("b", 0));
        tank.fishes[0].position = Vec2::new(100.0, 100.0);
        tank.fishes[1].position = Vec2::new(100.0, 130.0);
        assert!(tank.pause("a"));

        tank.separate();

        assert_eq!(tank.fishes[0].position, Vec2::new(100.0, 100.0));
        assert!((tank.fishes[1].position.y - 145.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_fish_are_left_alone() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        tank.add_fish(record("b", 0));
        tank.fishes[0].position = Vec2::new(50.0, 50.0);
        tank.fishes[1].position = Vec2::new(50.0, 50.0);
        tank.separate();
        assert_eq!(tank.fishes[0].position, tank.fishes[1].position);
    }

    #[test]
    fn hit_test_prefers_latest_user_fish() {
        let mut tank = tank();
        tank.add_fish(record("first", 0));
        tank.add_fish(record("second", 0));
        tank.add_ambient_fish(0);
        for fish in tank.fishes.iter_mut() {
            fish.position = Vec2::new(300.0, 300.0);
        }

        let hit = tank.hit_test(300.0, 300.0).and_then(Fish::fish_id);
        assert_eq!(hit, Some("second"));
        // Scale 0.5: half-width 50 along x, half-height 25 along y.
        assert!(tank.hit_test(349.0, 300.0).is_some());
        assert!(tank.hit_test(300.0, 326.0).is_none());
        assert!(tank.hit_test(10.0, 10.0).is_none());
    }

    #[test]
    fn ambient_fish_are_never_hit() {
        let mut tank = tank();
        tank.add_ambient_fish(2);
        tank.fishes[0].position = Vec2::new(200.0, 200.0);
        assert!(tank.hit_test(200.0, 200.0).is_none());
    }

    #[test]
    fn pause_freezes_and_resume_restores_velocity() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        let before = tank.fishes[0].clone();
        tank.pause("a");
        assert_eq!(tank.fishes[0].vx, 0.0);
        for _ in 0..10 {
            tank.update();
        }
        let frozen = &tank.fishes[0];
        assert_eq!(frozen.position, before.position);
        assert_eq!(frozen.tail_phase, before.tail_phase);
        assert_eq!(frozen.faces_left(), before.faces_left());

        tank.resume("a");
        assert_eq!(tank.fishes[0].vx, before.vx);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut tank = tank();
        tank.add_fish(record("a", 3));
        assert!(tank.get_fish_by_id("missing").is_none());
        assert!(!tank.update_likes("missing", 10));
        assert!(!tank.pause("missing"));
        assert!(!tank.resume("missing"));
    }

    #[test]
    fn likes_resize_immediately() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        tank.update_likes("a", 30);
        let fish = tank.get_fish_by_id("a").expect("fish a");
        assert_eq!(fish.likes, 30);
        assert_eq!(fish.target_height, 120.0);
    }

    #[test]
    fn fish_stays_within_margin_after_every_step() {
        let mut tank = tank();
        for i in 0..6 {
            tank.add_fish(record(&format!("u{i}"), i * 7));
            tank.add_ambient_fish(i as usize % 5);
        }
        for _ in 0..5000 {
            tank.update();
            for fish in tank.fishes() {
                let margin = fish.margin();
                // One tick of travel may overshoot the margin before it wraps.
                assert!(fish.position.x >= -margin - 1.0);
                assert!(fish.position.x <= 800.0 + margin + 1.0);
            }
        }
    }

    #[test]
    fn leaving_the_right_edge_wraps_or_reflects() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        let margin = tank.fishes[0].margin();
        tank.fishes[0].vx = 0.5;
        tank.fishes[0].position.x = 800.0 + margin;
        tank.update();

        let fish = &tank.fishes[0];
        let reflected = fish.position.x == 800.0 + margin && fish.vx < 0.0;
        let teleported = fish.position.x == -margin && fish.vx > 0.0;
        assert!(reflected || teleported);
        assert!((80.0..480.0).contains(&fish.position.y));
    }

    #[test]
    fn leaving_the_left_edge_wraps_or_reflects() {
        let mut tank = tank();
        tank.add_fish(record("a", 0));
        let margin = tank.fishes[0].margin();
        tank.fishes[0].vx = -0.5;
        tank.fishes[0].position.x = -margin;
        tank.update();

        let fish = &tank.fishes[0];
        let reflected = fish.position.x == -margin && fish.vx > 0.0;
        let teleported = fish.position.x == 800.0 + margin && fish.vx < 0.0;
        assert!(reflected || teleported);
        assert!((0.3..=0.8).contains(&fish.vx.abs()));
    }
}
// --- End of File: simulation.rs ---
