use crate::settings::ClockSettings;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Steady,
}

impl Phase {
    pub fn name(&self) -> &str {
        match self {
            Phase::Loading => "LOADING",
            Phase::Steady => "RUNNING",
        }
    }
}

/// What the pipeline should do for the frame just advanced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStep {
    /// Nothing may mutate this frame
    Frozen,
    /// Load-in interpolation only; `progress` is in [0, 1]
    Loading { progress: f32 },
    /// Full pipeline at this speed multiplier
    Steady { speed: f32 },
}

/// Frame driver: phase, pause flag and speed multiplier.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    phase: Phase,
    /// Unpaused seconds since session start
    elapsed: f32,
    /// Seconds spent in the load-in phase
    load_elapsed: f32,
    /// Wall seconds since session start, paused or not
    session: f32,
    paused: bool,
    speed: f32,
    /// Set once the idle threshold has passed
    slowed: bool,
    settings: ClockSettings,
}

impl AnimationClock {
    pub fn new(settings: &ClockSettings) -> Self {
        let phase = if settings.load_in && settings.load_secs > 0.0 {
            Phase::Loading
        } else {
            Phase::Steady
        };
        Self {
            phase,
            elapsed: 0.0,
            load_elapsed: 0.0,
            session: 0.0,
            paused: false,
            speed: 1.0,
            slowed: false,
            settings: settings.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[cfg(test)]
    pub fn session(&self) -> f32 {
        self.session
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed
    }

    pub fn is_slow_motion(&self) -> bool {
        self.slowed
    }

    /// Load-in progress in [0, 1]; 1 once steady
    pub fn load_progress(&self) -> f32 {
        match self.phase {
            Phase::Steady => 1.0,
            Phase::Loading => (self.load_elapsed / self.settings.load_secs).min(1.0),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    #[cfg(test)]
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance by one frame of `dt` wall time
    pub fn advance(&mut self, dt: Duration) -> FrameStep {
        let dt = dt.as_secs_f32();
        self.session += dt;

        if !self.slowed && self.session > self.settings.idle_secs {
            self.slowed = true;
            self.speed = self.settings.reduced_speed;
            info!(session = self.session, speed = self.speed, "idle threshold passed, slow motion");
        }

        if self.paused {
            return FrameStep::Frozen;
        }
        self.elapsed += dt;

        match self.phase {
            Phase::Loading => {
                self.load_elapsed += dt;
                let progress = self.load_progress();
                if progress >= 1.0 {
                    self.phase = Phase::Steady;
                    info!(elapsed = self.elapsed, "load-in finished");
                }
                FrameStep::Loading { progress }
            }
            Phase::Steady => FrameStep::Steady { speed: self.speed },
        }
    }
}
