use crate::category::{Category, CategoryFilter};
use crate::settings::{ReflectionPolicy, SpaceSettings};
use glam::Vec3;
use rand::Rng;

/// Particle attribute buffers, one entry per particle.
///
/// Struct-of-arrays so renderers can take contiguous slices of positions
/// and sizes without copying.
#[derive(Debug, Clone)]
pub struct SpatialField {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    categories: Vec<Category>,
    base_sizes: Vec<f32>,
    current_sizes: Vec<f32>,
    target_sizes: Vec<f32>,
    cluster_targets: Vec<Vec3>,
    /// Index into the category's content pool
    content_slots: Vec<usize>,
    pulse_phases: Vec<f32>,
    bound: f32,
}

impl SpatialField {
    /// Create `settings.particle_count` particles with categories drawn from
    /// the filter. Positions are scattered through the boundary box.
    pub fn new(settings: &SpaceSettings, filter: &CategoryFilter, rng: &mut impl Rng) -> Self {
        let count = settings.particle_count;
        let bound = settings.bound.max(0.0);
        let mut field = Self {
            positions: Vec::with_capacity(count),
            velocities: Vec::with_capacity(count),
            categories: Vec::with_capacity(count),
            base_sizes: Vec::with_capacity(count),
            current_sizes: Vec::with_capacity(count),
            target_sizes: Vec::with_capacity(count),
            cluster_targets: vec![Vec3::ZERO; count],
            content_slots: Vec::with_capacity(count),
            pulse_phases: Vec::with_capacity(count),
            bound,
        };

        let mut next_slot = [0usize; 3];
        let speed = settings.initial_speed.abs();
        let (size_lo, size_hi) = if settings.size_max > settings.size_min {
            (settings.size_min, settings.size_max)
        } else {
            (settings.size_min, settings.size_min + f32::EPSILON)
        };

        for _ in 0..count {
            let category = filter.sample(rng);
            let slot = &mut next_slot[category.index()];
            field.content_slots.push(*slot);
            *slot += 1;
            field.categories.push(category);

            field.positions.push(random_in_cube(rng, bound));
            field.velocities.push(random_in_cube(rng, speed));

            let size = rng.gen_range(size_lo..size_hi);
            field.base_sizes.push(size);
            field.current_sizes.push(size);
            field.target_sizes.push(size);
            field.pulse_phases.push(rng.gen_range(0.0..std::f32::consts::TAU));
        }

        field
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bound(&self) -> f32 {
        self.bound
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[cfg(test)]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn current_sizes(&self) -> &[f32] {
        &self.current_sizes
    }

    #[cfg(test)]
    pub fn target_sizes(&self) -> &[f32] {
        &self.target_sizes
    }

    #[cfg(test)]
    pub fn base_sizes(&self) -> &[f32] {
        &self.base_sizes
    }

    #[cfg(test)]
    pub fn cluster_targets(&self) -> &[Vec3] {
        &self.cluster_targets
    }

    pub fn pulse_phases(&self) -> &[f32] {
        &self.pulse_phases
    }

    pub fn category(&self, index: usize) -> Option<Category> {
        self.categories.get(index).copied()
    }

    pub fn content_slot(&self, index: usize) -> Option<usize> {
        self.content_slots.get(index).copied()
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied()
    }

    /// Pin every particle to the origin (load-in start state)
    pub fn collapse_to_origin(&mut self) {
        self.positions.fill(Vec3::ZERO);
    }

    pub fn set_cluster_target(&mut self, index: usize, target: Vec3) {
        if let Some(slot) = self.cluster_targets.get_mut(index) {
            *slot = target;
        }
    }

    /// Load-in interpolation: position = target * eased
    pub fn place_toward_targets(&mut self, eased: f32) {
        for (pos, target) in self.positions.iter_mut().zip(&self.cluster_targets) {
            *pos = *target * eased;
        }
    }

    /// Snap exactly onto cluster targets
    pub fn pin_to_targets(&mut self) {
        self.positions.copy_from_slice(&self.cluster_targets);
    }

    /// Add a velocity delta to one particle
    pub fn nudge(&mut self, index: usize, delta: Vec3) {
        if let Some(v) = self.velocities.get_mut(index) {
            *v += delta;
        }
    }

    /// Raise the target size of a particle to `multiplier * base`
    pub fn set_boost(&mut self, index: usize, multiplier: f32) {
        if let (Some(target), Some(base)) = (self.target_sizes.get_mut(index), self.base_sizes.get(index)) {
            *target = *base * multiplier;
        }
    }

    /// Restore the target size of a particle to its base size
    pub fn clear_boost(&mut self, index: usize) {
        if let (Some(target), Some(base)) = (self.target_sizes.get_mut(index), self.base_sizes.get(index)) {
            *target = *base;
        }
    }

    /// Advance every particle by one frame.
    ///
    /// `displacements` holds one additive position offset per particle (ripple
    /// contributions); a shorter slice leaves the remaining particles untouched.
    pub fn step(&mut self, speed: f32, damping: f32, smoothing: f32, policy: ReflectionPolicy, displacements: &[Vec3]) {
        let bound = self.bound;

        for i in 0..self.positions.len() {
            let v = &mut self.velocities[i];
            *v *= damping;

            let p = &mut self.positions[i];
            *p += *v * speed;
            if let Some(offset) = displacements.get(i) {
                *p += *offset;
            }

            reflect(p, v, bound, policy);

            let current = &mut self.current_sizes[i];
            *current += (self.target_sizes[i] - *current) * smoothing;
        }
    }
}

/// Clamp `p` into `[-bound, bound]` per axis and send the velocity back inside.
fn reflect(p: &mut Vec3, v: &mut Vec3, bound: f32, policy: ReflectionPolicy) {
    for axis in 0..3 {
        let coord = p[axis];
        if coord.abs() <= bound {
            continue;
        }
        let inward = -coord.signum();
        p[axis] = bound * coord.signum();

        match policy {
            ReflectionPolicy::PerAxis => v[axis] = v[axis].abs() * inward,
            ReflectionPolicy::FirstAxis => v.x = -v.x,
        }
    }
}

fn random_in_cube(rng: &mut impl Rng, half: f32) -> Vec3 {
    if half <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
    )
}
