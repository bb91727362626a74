use crate::settings::RippleSettings;
use glam::Vec3;
use std::collections::VecDeque;

/// A radially expanding, decaying impulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub origin: Vec3,
    pub radius: f32,
    pub strength: f32,
    /// Frames since emission
    pub age: u32,
}

/// Bounded FIFO of live ripples
#[derive(Debug, Clone)]
pub struct RippleField {
    ripples: VecDeque<Ripple>,
    settings: RippleSettings,
}

impl RippleField {
    pub fn new(settings: &RippleSettings) -> Self {
        Self {
            ripples: VecDeque::with_capacity(settings.capacity),
            settings: settings.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.ripples.iter()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.ripples.clear();
    }

    /// Start a ripple at `origin`. Evicts the oldest when full.
    pub fn emit(&mut self, origin: Vec3, strength: f32) {
        if self.settings.capacity == 0 {
            return;
        }
        while self.ripples.len() >= self.settings.capacity {
            self.ripples.pop_front();
        }
        self.ripples.push_back(Ripple {
            origin,
            radius: 0.0,
            strength,
            age: 0,
        });
    }

    /// Grow, decay and age every ripple; drop the spent ones
    pub fn advance(&mut self) {
        let RippleSettings {
            growth,
            decay,
            floor,
            max_age,
            ..
        } = self.settings;

        for ripple in self.ripples.iter_mut() {
            ripple.radius += growth;
            ripple.strength *= decay;
            ripple.age += 1;
        }
        self.ripples
            .retain(|r| r.strength >= floor && r.age <= max_age);
    }

    /// Fill `out` with the summed wavefront displacement for each position.
    pub fn displacements(&self, positions: &[Vec3], out: &mut Vec<Vec3>) {
        out.clear();
        out.resize(positions.len(), Vec3::ZERO);
        if self.ripples.is_empty() {
            return;
        }

        let width = self.settings.width;
        if width <= 0.0 {
            return;
        }
        let scale = self.settings.scale;

        for ripple in &self.ripples {
            for (pos, offset) in positions.iter().zip(out.iter_mut()) {
                let delta = *pos - ripple.origin;
                let dist = delta.length();
                // Coincident with the origin: no direction to push along
                if dist <= f32::EPSILON {
                    continue;
                }
                let from_front = (dist - ripple.radius).abs();
                if from_front > width {
                    continue;
                }
                let falloff = 1.0 - from_front / width;
                *offset += (delta / dist) * falloff * ripple.strength * scale;
            }
        }
    }
}
