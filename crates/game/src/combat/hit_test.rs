use serde::{Deserialize, Serialize};

use crate::snapshot::{ClientId, Transform};

/// Decides which remote entity, if any, a shot fired from `origin` strikes.
pub trait HitTest {
    fn cast(&self, origin: &Transform, targets: &[(ClientId, Transform)]) -> Option<ClientId>;
}

/// Forward ray against a sphere around each target; nearest intersection wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayHitTest {
    pub radius: f32,
    pub range: f32,
}

impl Default for RayHitTest {
    fn default() -> Self {
        Self {
            radius: 0.5,
            range: 100.0,
        }
    }
}

impl RayHitTest {
    fn distance_to(&self, origin: &Transform, target: &Transform) -> Option<f32> {
        let direction = origin.forward().normalize_or_zero();
        let offset = target.position - origin.position;
        let along = offset.dot(direction);
        if along < 0.0 {
            return None;
        }
        let miss_squared = offset.length_squared() - along * along;
        let radius_squared = self.radius * self.radius;
        if miss_squared > radius_squared {
            return None;
        }
        let distance = (along - (radius_squared - miss_squared).sqrt()).max(0.0);
        (distance <= self.range).then_some(distance)
    }
}

impl HitTest for RayHitTest {
    fn cast(&self, origin: &Transform, targets: &[(ClientId, Transform)]) -> Option<ClientId> {
        targets
            .iter()
            .filter_map(|(id, target)| self.distance_to(origin, target).map(|d| (*id, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    fn at(x: f32, z: f32) -> Transform {
        Transform::new(Vec3::new(x, 0.0, z), Quat::IDENTITY)
    }

    #[test]
    fn nearest_target_in_front_is_hit() {
        let ray = RayHitTest::default();
        let targets = [
            (ClientId(1), at(0.0, 10.0)),
            (ClientId(2), at(0.2, 5.0)),
            (ClientId(3), at(0.0, -3.0)),
        ];
        assert_eq!(ray.cast(&Transform::default(), &targets), Some(ClientId(2)));
    }

    #[test]
    fn misses_outside_radius_or_range() {
        let ray = RayHitTest {
            radius: 0.5,
            range: 20.0,
        };
        let targets = [(ClientId(1), at(2.0, 5.0)), (ClientId(2), at(0.0, 30.0))];
        assert_eq!(ray.cast(&Transform::default(), &targets), None);
    }

    #[test]
    fn follows_orientation() {
        let ray = RayHitTest::default();
        let facing_x = Transform::new(
            Vec3::ZERO,
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let targets = [(ClientId(1), at(0.0, 5.0)), (ClientId(2), at(5.0, 0.0))];
        assert_eq!(ray.cast(&facing_x, &targets), Some(ClientId(2)));
    }
}
