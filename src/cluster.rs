use crate::field::SpatialField;
use crate::settings::ClusterSettings;
use glam::Vec3;
use rand::Rng;

/// Cubic ease-out: fast start, gentle arrival
pub fn ease_out_cubic(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Target layout for the load-in animation
pub struct ClusterLayout {
    centers: [Vec3; 3],
    spread: f32,
}

impl ClusterLayout {
    pub fn new(settings: &ClusterSettings) -> Self {
        Self {
            centers: settings.centers,
            spread: settings.spread.max(0.0),
        }
    }

    /// Give every particle a jittered target around its category's center,
    /// clamped into the field's boundary box.
    pub fn assign_targets(&self, field: &mut SpatialField, rng: &mut impl Rng) {
        let half = self.spread / 2.0;
        let bound = Vec3::splat(field.bound());

        for i in 0..field.len() {
            let Some(category) = field.category(i) else {
                continue;
            };
            let jitter = if half > 0.0 {
                Vec3::new(
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                )
            } else {
                Vec3::ZERO
            };
            let target = (self.centers[category.index()] + jitter).clamp(-bound, bound);
            field.set_cluster_target(i, target);
        }
    }

    /// Write interpolated positions for `progress` in [0, 1].
    /// Returns true once the layout has settled (progress reached 1).
    pub fn apply(&self, field: &mut SpatialField, progress: f32) -> bool {
        if progress >= 1.0 {
            field.pin_to_targets();
            true
        } else {
            field.place_toward_targets(ease_out_cubic(progress));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryFilter;
    use crate::settings::SpaceSettings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (ClusterLayout, SpatialField) {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = SpatialField::new(
            &SpaceSettings {
                particle_count: 120,
                ..Default::default()
            },
            &CategoryFilter::default(),
            &mut rng,
        );
        let layout = ClusterLayout::new(&ClusterSettings::default());
        layout.assign_targets(&mut field, &mut rng);
        field.collapse_to_origin();
        (layout, field)
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_targets_stay_near_category_center() {
        let (_, field) = setup();
        let settings = ClusterSettings::default();
        for i in 0..field.len() {
            let center = settings.centers[field.category(i).unwrap().index()];
            let offset = (field.cluster_targets()[i] - center).abs().max_element();
            assert!(offset <= settings.spread / 2.0);
        }
    }

    #[test]
    fn test_load_in_converges_exactly() {
        let (layout, mut field) = setup();
        for step in 0..10 {
            assert!(!layout.apply(&mut field, step as f32 / 10.0));
        }
        assert!(layout.apply(&mut field, 1.0));
        assert_eq!(field.positions(), field.cluster_targets());
    }

    #[test]
    fn test_interpolation_is_deterministic() {
        let (layout, mut a) = setup();
        let mut b = a.clone();
        layout.apply(&mut a, 0.37);
        layout.apply(&mut b, 0.37);
        assert_eq!(a.positions(), b.positions());
    }
}
