mod hit_test;
mod shot;

pub use hit_test::{HitTest, RayHitTest};
pub use shot::{HIT_DAMAGE, SCORE_PER_HIT, SHOT_TTL_SECONDS, Shot, ShotLedger, ShotWatermark};
