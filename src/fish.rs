// --- File: fish.rs ---
use crate::constants::{LIKES_FOR_MAX, MAX_TARGET_H, MIN_TARGET_H};
use glam::Vec2;

/// On-screen height for a like count: linear from `MIN_TARGET_H` at zero
/// likes to `MAX_TARGET_H` at `LIKES_FOR_MAX`, clamped above.
pub fn calc_target_height(likes: u32) -> f32 {
    let t = (likes as f32 / LIKES_FOR_MAX as f32).min(1.0);
    MIN_TARGET_H + (MAX_TARGET_H - MIN_TARGET_H) * t
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SwimMode {
    Wave,
    #[default]
    Pulse,
}

/// What the listing collaborator hands over for a user-drawn fish.
#[derive(Debug, Clone, PartialEq)]
pub struct FishRecord {
    pub fish_id: Option<String>,
    pub texture_index: usize,
    pub img_width: f32,
    pub img_height: f32,
    pub likes: u32,
    pub swim_mode: SwimMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FishKind {
    /// Preset sprite; not interactive.
    Ambient {
        preset_index: usize,
        size: f32,
        scale: f32,
    },
    User {
        fish_id: Option<String>,
        texture_index: usize,
        img_width: f32,
        img_height: f32,
        swim_mode: SwimMode,
    },
}

#[derive(Debug, Clone)]
pub struct Fish {
    pub kind: FishKind,
    pub position: Vec2,
    pub vx: f32,
    pub tail_phase: f32,
    pub float_phase: f32,
    pub float_amp: f32,
    pub likes: u32,
    pub target_height: f32,
    pub paused: bool,
    pub saved_vx: f32,
}

impl Fish {
    pub fn is_user_fish(&self) -> bool {
        matches!(self.kind, FishKind::User { .. })
    }

    pub fn fish_id(&self) -> Option<&str> {
        match &self.kind {
            FishKind::User { fish_id, .. } => fish_id.as_deref(),
            FishKind::Ambient { .. } => None,
        }
    }

    /// Heading survives a pause, which zeroes `vx`.
    pub fn faces_left(&self) -> bool {
        let vx = if self.paused { self.saved_vx } else { self.vx };
        vx < 0.0
    }

    pub fn set_likes(&mut self, likes: u32) {
        self.likes = likes;
        self.target_height = calc_target_height(likes);
    }

    /// Horizontal overshoot allowed past either tank edge before wrapping.
    pub fn margin(&self) -> f32 {
        match self.kind {
            FishKind::Ambient { size, scale, .. } => size * scale,
            FishKind::User { .. } => self.target_height,
        }
    }

    pub fn collision_radius(&self, radius_factor: f32) -> f32 {
        self.target_height * radius_factor
    }

    /// Logical hit rectangle half-extents `(half_w, half_h)`. User sprites are
    /// drawn rotated a quarter turn, so the authored height spans x.
    pub fn hit_half_extents(&self) -> Option<(f32, f32)> {
        match self.kind {
            FishKind::User {
                img_width,
                img_height,
                ..
            } if img_width > 0.0 => {
                let scale = self.target_height / img_width;
                Some((img_height * scale / 2.0, img_width * scale / 2.0))
            }
            _ => None,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.hit_half_extents().is_some_and(|(half_w, half_h)| {
            let d = point - self.position;
            d.x.abs() <= half_w && d.y.abs() <= half_h
        })
    }
}

// --- End of File: fish.rs ---
