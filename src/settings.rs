use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Particle count for full-capability sessions
pub const FULL_PARTICLE_COUNT: usize = 500;
/// Particle count for constrained-capability sessions
pub const LITE_PARTICLE_COUNT: usize = 150;

/// How boundary violations flip velocity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ReflectionPolicy {
    /// Invert only the component of the axis that left the box
    #[default]
    PerAxis,
    /// Invert the X component whichever axis left the box (legacy look)
    FirstAxis,
}

impl ReflectionPolicy {
    pub fn name(&self) -> &str {
        match self {
            ReflectionPolicy::PerAxis => "Per-axis",
            ReflectionPolicy::FirstAxis => "First-axis",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ReflectionPolicy::PerAxis => ReflectionPolicy::FirstAxis,
            ReflectionPolicy::FirstAxis => ReflectionPolicy::PerAxis,
        }
    }
}

/// Device class, detected once per session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Hover, attractor and click
    #[default]
    Pointer,
    /// Tap only
    Touch,
}

/// Particle buffer and integration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceSettings {
    pub particle_count: usize,
    /// Half-extent of the cubic boundary box
    pub bound: f32,
    /// Per-frame velocity multiplier (< 1)
    pub damping: f32,
    /// Half-range of initial velocity components
    pub initial_speed: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Exponential smoothing factor for current -> target size
    pub size_smoothing: f32,
    pub reflection: ReflectionPolicy,
    /// Field rotation per frame around X and Y (radians)
    pub spin: [f32; 2],
    /// Breathing period in seconds
    pub breath_cycle: f32,
    pub breath_amplitude: f32,
    /// Shortest size pulse period in seconds; index mod 3 adds whole seconds
    pub pulse_cycle: f32,
    pub pulse_amplitude: f32,
}

impl Default for SpaceSettings {
    fn default() -> Self {
        Self {
            particle_count: FULL_PARTICLE_COUNT,
            bound: 30.0,
            damping: 0.98,
            initial_speed: 0.01,
            size_min: 2.0,
            size_max: 5.0,
            size_smoothing: 0.1,
            reflection: ReflectionPolicy::PerAxis,
            spin: [0.0001, 0.0002],
            breath_cycle: 10.0,
            breath_amplitude: 0.08,
            pulse_cycle: 5.0,
            pulse_amplitude: 0.10,
        }
    }
}

/// Proximity graph parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub connect_distance: f32,
    pub max_edges: usize,
    /// Brightness multiplier for ordinary edges
    pub connect_opacity: f32,
    /// Fixed brightness for edges touching a highlighted particle
    pub active_brightness: f32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            connect_distance: 15.0,
            max_edges: 300,
            connect_opacity: 0.15,
            active_brightness: 0.6,
        }
    }
}

/// Load-in cluster volumes, one per category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Cluster centers indexed by `Category::index()`
    pub centers: [Vec3; 3],
    /// Full edge length of the jitter cube around each center
    pub spread: f32,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            centers: [
                Vec3::new(-18.0, 6.0, 0.0),
                Vec3::new(18.0, 6.0, 0.0),
                Vec3::new(0.0, -14.0, 0.0),
            ],
            spread: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    pub initial_strength: f32,
    /// Radius increment per frame
    pub growth: f32,
    /// Strength multiplier per frame (< 1)
    pub decay: f32,
    /// Ripples weaker than this are removed
    pub floor: f32,
    /// Ripples older than this many frames are removed
    pub max_age: u32,
    pub capacity: usize,
    /// Half-thickness of the displacement shell
    pub width: f32,
    pub scale: f32,
    /// Strength factor for the ripple of an ignored touch
    pub subtle_factor: f32,
}

impl Default for RippleSettings {
    fn default() -> Self {
        Self {
            initial_strength: 2.0,
            growth: 0.5,
            decay: 0.985,
            floor: 0.05,
            max_age: 300,
            capacity: 8,
            width: 3.0,
            scale: 0.05,
            subtle_factor: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Max world distance between pick ray and particle
    pub probe_threshold: f32,
    pub boost_multiplier: f32,
    /// Seconds a highlight (and its size boost) lasts
    pub highlight_secs: f32,
    /// Probability that a touch after the first one gets a response
    pub touch_response_prob: f32,
    pub related_prob: f32,
    pub related_max: usize,
    pub attractor_radius: f32,
    pub attractor_strength: f32,
    pub attract_share: f32,
    pub repel_share: f32,
    /// Half-range of the velocity kick for an ignored touch
    pub ignored_kick: f32,
    /// Seconds between spontaneous highlight rolls
    pub active_display_secs: f32,
    pub active_display_prob: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            probe_threshold: 3.0,
            boost_multiplier: 1.5,
            highlight_secs: 3.0,
            touch_response_prob: 0.65,
            related_prob: 0.45,
            related_max: 3,
            attractor_radius: 15.0,
            attractor_strength: 0.008,
            attract_share: 0.30,
            repel_share: 0.30,
            ignored_kick: 0.05,
            active_display_secs: 45.0,
            active_display_prob: 0.25,
        }
    }
}

impl InteractionSettings {
    pub fn highlight_duration(&self) -> Duration {
        Duration::from_secs_f32(self.highlight_secs.max(0.0))
    }

    pub fn active_display_interval(&self) -> Duration {
        Duration::from_secs_f32(self.active_display_secs.max(0.1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Play the load-in animation at session start
    pub load_in: bool,
    pub load_secs: f32,
    /// Session seconds before slow motion kicks in
    pub idle_secs: f32,
    pub reduced_speed: f32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            load_in: true,
            load_secs: 3.0,
            idle_secs: 60.0,
            reduced_speed: 0.3,
        }
    }
}

/// Every tunable of the thought field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub space: SpaceSettings,
    pub graph: GraphSettings,
    pub cluster: ClusterSettings,
    pub ripple: RippleSettings,
    pub interaction: InteractionSettings,
    pub clock: ClockSettings,
}

impl FieldSettings {
    /// Constrained-capability session (fewer particles)
    pub fn lite() -> Self {
        let mut settings = Self::default();
        settings.space.particle_count = LITE_PARTICLE_COUNT;
        settings
    }

    /// Adjust connection distance within bounds
    pub fn adjust_connect_distance(&mut self, delta: f32) {
        self.graph.connect_distance = (self.graph.connect_distance + delta).clamp(2.0, 40.0);
    }

    /// Adjust edge cap within bounds
    pub fn adjust_max_edges(&mut self, delta: i32) {
        self.graph.max_edges = (self.graph.max_edges as i32 + delta).clamp(0, 2000) as usize;
    }

    /// Adjust damping within bounds (always < 1)
    pub fn adjust_damping(&mut self, delta: f32) {
        self.space.damping = (self.space.damping + delta).clamp(0.80, 0.999);
    }

    /// Adjust initial ripple strength within bounds
    pub fn adjust_ripple_strength(&mut self, delta: f32) {
        self.ripple.initial_strength = (self.ripple.initial_strength + delta).clamp(0.1, 6.0);
    }

    /// Adjust attractor radius within bounds
    pub fn adjust_attractor_radius(&mut self, delta: f32) {
        self.interaction.attractor_radius =
            (self.interaction.attractor_radius + delta).clamp(0.0, 60.0);
    }

    /// Adjust related-highlight probability within bounds
    pub fn adjust_related_prob(&mut self, delta: f32) {
        self.interaction.related_prob = (self.interaction.related_prob + delta).clamp(0.0, 1.0);
    }

    /// Adjust touch response probability within bounds
    pub fn adjust_touch_response(&mut self, delta: f32) {
        self.interaction.touch_response_prob =
            (self.interaction.touch_response_prob + delta).clamp(0.0, 1.0);
    }

    pub fn cycle_reflection(&mut self) {
        self.space.reflection = self.space.reflection.next();
    }
}
