use crate::camera::{Camera, FieldTransform};
use crate::category::{Category, CategoryFilter};
use crate::clock::{AnimationClock, FrameStep, Phase};
use crate::cluster::ClusterLayout;
use crate::content::ContentLibrary;
use crate::field::SpatialField;
use crate::interaction::{ClickTargets, InteractionController, SelectionSink};
use crate::probe::{pointer_to_local_plane, PointerProbe};
use crate::proximity::{Edge, ProximityGraph};
use crate::ripple::RippleField;
use crate::settings::{FieldSettings, InputMode};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};
use tracing::info;

/// Read-only view of one rendered frame
pub struct FrameView<'a> {
    /// Field-local positions; apply `transform` for world space
    pub positions: &'a [Vec3],
    /// Current size with the per-particle pulse applied
    pub render_sizes: &'a [f32],
    pub categories: &'a [Category],
    pub edges: &'a [Edge],
    pub transform: FieldTransform,
    pub hovered: Option<usize>,
    /// One flag per particle
    pub highlighted: &'a [bool],
}

/// The whole simulation context: particle buffers, effects, timers and camera.
pub struct ThoughtSimulation {
    settings: FieldSettings,
    filter: CategoryFilter,
    rng: StdRng,
    field: SpatialField,
    cluster: ClusterLayout,
    ripples: RippleField,
    graph: ProximityGraph,
    clock: AnimationClock,
    interaction: InteractionController,
    camera: Camera,
    transform: FieldTransform,
    rotation: Vec2,
    content: ContentLibrary,
    /// Canvas size in pixels (braille dots)
    viewport: Vec2,
    displacements: Vec<Vec3>,
    render_sizes: Vec<f32>,
    highlight_mask: Vec<bool>,
}

impl ThoughtSimulation {
    pub fn new(
        settings: FieldSettings,
        filter: CategoryFilter,
        mode: InputMode,
        content: ContentLibrary,
        seed: Option<u64>,
        viewport: Vec2,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let field = SpatialField::new(&settings.space, &filter, &mut rng);
        let viewport = viewport.max(Vec2::ONE);

        let mut sim = Self {
            cluster: ClusterLayout::new(&settings.cluster),
            ripples: RippleField::new(&settings.ripple),
            graph: ProximityGraph::new(),
            clock: AnimationClock::new(&settings.clock),
            interaction: InteractionController::new(&settings, mode),
            camera: Camera::new(viewport.x / viewport.y),
            transform: FieldTransform::default(),
            rotation: Vec2::ZERO,
            displacements: Vec::new(),
            render_sizes: Vec::new(),
            highlight_mask: Vec::new(),
            settings,
            filter,
            rng,
            field,
            content,
            viewport,
        };
        sim.seed_layout();
        sim
    }

    /// Start-of-session layout: cluster targets and, for load-in, the collapse
    fn seed_layout(&mut self) {
        self.cluster.assign_targets(&mut self.field, &mut self.rng);
        if self.clock.phase() == Phase::Loading {
            self.field.collapse_to_origin();
        }
        self.render_sizes = self.field.current_sizes().to_vec();
        self.highlight_mask = vec![false; self.field.len()];
        info!(
            particles = self.field.len(),
            categories = self.filter.active_count(),
            load_in = self.clock.phase() == Phase::Loading,
            "session started"
        );
    }

    /// Re-initialise every buffer and start a new session
    pub fn reset(&mut self, sink: &mut dyn SelectionSink) {
        self.interaction.reset(sink);
        self.interaction = InteractionController::new(&self.settings, self.interaction.mode());
        self.field = SpatialField::new(&self.settings.space, &self.filter, &mut self.rng);
        self.cluster = ClusterLayout::new(&self.settings.cluster);
        self.ripples = RippleField::new(&self.settings.ripple);
        self.graph.clear();
        self.clock = AnimationClock::new(&self.settings.clock);
        self.transform = FieldTransform::default();
        self.rotation = Vec2::ZERO;
        self.seed_layout();
    }

    /// Replace all settings (preset or import) and reset
    pub fn apply_settings(&mut self, settings: FieldSettings, sink: &mut dyn SelectionSink) {
        self.settings = settings;
        self.reset(sink);
    }

    /// Live tuning; takes effect on the next frame without a reset
    pub fn tune(&mut self, f: impl FnOnce(&mut FieldSettings)) {
        f(&mut self.settings);
        self.interaction.apply_settings(&self.settings);
    }

    /// Toggle a category and re-seed. Returns false if the filter refused.
    pub fn toggle_category(&mut self, category: Category, sink: &mut dyn SelectionSink) -> bool {
        if !self.filter.toggle(category) {
            return false;
        }
        info!(category = category.name(), active = self.filter.is_active(category), "category filter changed");
        self.reset(sink);
        true
    }

    /// New canvas size in pixels
    pub fn resize(&mut self, viewport: Vec2) {
        let viewport = viewport.max(Vec2::ONE);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.camera.set_aspect(viewport.x / viewport.y);
        self.cluster.assign_targets(&mut self.field, &mut self.rng);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.interaction.pointer_moved(x, y);
    }

    pub fn pointer_left(&mut self) {
        self.interaction.pointer_left();
    }

    pub fn pointer_pressed(&mut self, x: f32, y: f32) {
        self.interaction.pointer_pressed(x, y);
    }

    pub fn dismiss(&mut self, sink: &mut dyn SelectionSink) {
        self.interaction.dismiss(sink);
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    /// Run one frame of the pipeline. `now` drives the wall-clock timers.
    pub fn tick(&mut self, dt: Duration, now: Instant, sink: &mut dyn SelectionSink) {
        let step = self.clock.advance(dt);

        match step {
            FrameStep::Frozen => {
                // Hover still tracks the pointer; clicks made while paused are dropped
                if self.clock.phase() == Phase::Steady {
                    self.resolve_hover(sink);
                }
                self.interaction.discard_clicks();
            }
            FrameStep::Loading { progress } => {
                self.interaction.discard_clicks();
                self.cluster.apply(&mut self.field, progress);
            }
            FrameStep::Steady { speed } => {
                self.resolve_hover(sink);
                self.resolve_clicks(now, sink);
                self.interaction.apply_attractor(&mut self.field);
                self.ripples.advance();
                self.ripples
                    .displacements(self.field.positions(), &mut self.displacements);

                let space = &self.settings.space;
                self.field.step(
                    speed,
                    space.damping,
                    space.size_smoothing,
                    space.reflection,
                    &self.displacements,
                );
                self.rotation += Vec2::from(space.spin) * speed;
            }
        }

        self.interaction
            .fire_timers(now, &mut self.field, &mut self.rng);
        self.refresh_highlights();

        if self.clock.phase() == Phase::Steady {
            let mask = &self.highlight_mask;
            self.graph.rebuild(self.field.positions(), &self.settings.graph, |i| {
                mask.get(i).copied().unwrap_or(false)
            });
        } else {
            self.graph.clear();
        }

        self.update_transform();
        self.update_render_sizes();
    }

    fn resolve_hover(&mut self, sink: &mut dyn SelectionSink) {
        let probe = PointerProbe {
            camera: &self.camera,
            transform: &self.transform,
            positions: self.field.positions(),
            viewport: self.viewport,
            threshold: self.settings.interaction.probe_threshold,
        };
        let (camera, transform, viewport) = (&self.camera, &self.transform, self.viewport);
        self.interaction.resolve_pointer(
            &probe,
            |x, y| pointer_to_local_plane(camera, transform, x, y, viewport),
            sink,
        );
    }

    fn resolve_clicks(&mut self, now: Instant, sink: &mut dyn SelectionSink) {
        let probe = PointerProbe {
            camera: &self.camera,
            transform: &self.transform,
            positions: self.field.positions(),
            viewport: self.viewport,
            threshold: self.settings.interaction.probe_threshold,
        };
        let hits = self.interaction.take_clicks(&probe);

        for hit in hits {
            self.interaction.handle_click(
                hit,
                ClickTargets {
                    field: &mut self.field,
                    ripples: &mut self.ripples,
                    content: &self.content,
                },
                &mut self.rng,
                now,
                sink,
            );
        }
    }

    fn refresh_highlights(&mut self) {
        self.highlight_mask.clear();
        self.highlight_mask.resize(self.field.len(), false);
        for index in self.interaction.highlighted() {
            if let Some(flag) = self.highlight_mask.get_mut(index) {
                *flag = true;
            }
        }
    }

    fn update_transform(&mut self) {
        let space = &self.settings.space;
        let t = self.clock.elapsed();
        let breath = if space.breath_cycle > 0.0 {
            (t / space.breath_cycle * TAU).sin() * space.breath_amplitude
        } else {
            0.0
        };
        self.transform = FieldTransform {
            rotation: self.rotation,
            scale: 1.0 + breath,
        };
    }

    fn update_render_sizes(&mut self) {
        let space = &self.settings.space;
        let t = self.clock.elapsed();
        self.render_sizes.clear();
        self.render_sizes.extend(
            self.field
                .current_sizes()
                .iter()
                .zip(self.field.pulse_phases())
                .enumerate()
                .map(|(i, (size, phase))| {
                    let cycle = space.pulse_cycle + (i % 3) as f32;
                    let pulse = if cycle > 0.0 {
                        (t / cycle * TAU + phase).sin() * space.pulse_amplitude
                    } else {
                        0.0
                    };
                    size * (1.0 + pulse)
                }),
        );
    }

    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            positions: self.field.positions(),
            render_sizes: &self.render_sizes,
            categories: self.field.categories(),
            edges: self.graph.edges(),
            transform: self.transform,
            hovered: self.interaction.hovered(),
            highlighted: &self.highlight_mask,
        }
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    #[cfg(test)]
    pub fn field(&self) -> &SpatialField {
        &self.field
    }

    pub fn ripples(&self) -> &RippleField {
        &self.ripples
    }

    pub fn graph(&self) -> &ProximityGraph {
        &self.graph
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[cfg(test)]
    pub fn transform(&self) -> &FieldTransform {
        &self.transform
    }

    #[cfg(test)]
    pub fn content(&self) -> &ContentLibrary {
        &self.content
    }

    #[cfg(test)]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn particle_count(&self) -> usize {
        self.field.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Selection;
    use crate::settings::{ClockSettings, SpaceSettings};

    const FRAME: Duration = Duration::from_millis(16);
    const VIEWPORT: Vec2 = Vec2::new(240.0, 120.0);

    #[derive(Default)]
    struct Recorder {
        selections: Vec<Selection>,
        dismissed: usize,
    }

    impl SelectionSink for Recorder {
        fn on_select(&mut self, selection: &Selection) {
            self.selections.push(selection.clone());
        }

        fn on_dismiss(&mut self) {
            self.dismissed += 1;
        }
    }

    fn settings(count: usize, load_in: bool) -> FieldSettings {
        FieldSettings {
            space: SpaceSettings {
                particle_count: count,
                ..Default::default()
            },
            clock: ClockSettings {
                load_in,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sim(count: usize, load_in: bool) -> ThoughtSimulation {
        ThoughtSimulation::new(
            settings(count, load_in),
            CategoryFilter::default(),
            InputMode::Pointer,
            ContentLibrary::builtin(),
            Some(42),
            VIEWPORT,
        )
    }

    fn run(sim: &mut ThoughtSimulation, frames: usize, start: Instant, sink: &mut Recorder) -> Instant {
        let mut now = start;
        for _ in 0..frames {
            now += FRAME;
            sim.tick(FRAME, now, sink);
        }
        now
    }

    #[test]
    fn test_load_in_converges_to_cluster_targets() {
        let mut sim = sim(120, true);
        let mut sink = Recorder::default();
        assert!(sim.field().positions().iter().all(|p| *p == Vec3::ZERO));

        let mut now = Instant::now();
        let mut frames = 0;
        while sim.clock().phase() == Phase::Loading {
            now += FRAME;
            sim.tick(FRAME, now, &mut sink);
            frames += 1;
            assert!(frames < 1000, "load-in never finished");
            if sim.clock().phase() == Phase::Loading {
                assert!(sim.graph().edges().is_empty());
            }
        }

        assert_eq!(sim.field().positions(), sim.field().cluster_targets());
        let half = sim.settings().cluster.spread / 2.0;
        for i in 0..sim.particle_count() {
            let center = sim.settings().cluster.centers[sim.field().category(i).unwrap().index()];
            let offset = sim.field().position(i).unwrap() - center;
            assert!(offset.abs().max_element() <= half + 1e-4);
        }
    }

    #[test]
    fn test_clicks_during_load_in_are_ignored() {
        let mut sim = sim(50, true);
        let mut sink = Recorder::default();
        sim.pointer_pressed(120.0, 60.0);
        run(&mut sim, 5, Instant::now(), &mut sink);
        assert!(sink.selections.is_empty());
        assert!(sim.ripples().is_empty());
    }

    #[test]
    fn test_pause_freezes_simulation_state() {
        let mut sim = sim(200, false);
        let mut sink = Recorder::default();
        let now = run(&mut sim, 30, Instant::now(), &mut sink);
        sim.pointer_pressed(120.0, 60.0);
        let now = run(&mut sim, 1, now, &mut sink);

        sim.toggle_pause();
        let positions = sim.field().positions().to_vec();
        let velocities = sim.field().velocities().to_vec();
        let sizes = sim.field().current_sizes().to_vec();
        let ripples: Vec<_> = sim.ripples().iter().copied().collect();
        let transform = *sim.transform();

        run(&mut sim, 60, now, &mut sink);

        assert_eq!(sim.field().positions(), positions.as_slice());
        assert_eq!(sim.field().velocities(), velocities.as_slice());
        assert_eq!(sim.field().current_sizes(), sizes.as_slice());
        assert_eq!(sim.ripples().iter().copied().collect::<Vec<_>>(), ripples);
        assert_eq!(*sim.transform(), transform);
    }

    fn screen_of(sim: &ThoughtSimulation, index: usize) -> crate::camera::ScreenPoint {
        let world = sim.transform().to_world(sim.field().position(index).unwrap());
        sim.camera()
            .project(world, &sim.camera().view_projection(), VIEWPORT)
            .unwrap()
    }

    struct Snapshot {
        positions: Vec<Vec3>,
        velocities: Vec<Vec3>,
        current: Vec<f32>,
        targets: Vec<f32>,
        ripples: Vec<crate::ripple::Ripple>,
    }

    impl Snapshot {
        fn of(sim: &ThoughtSimulation) -> Self {
            Self {
                positions: sim.field().positions().to_vec(),
                velocities: sim.field().velocities().to_vec(),
                current: sim.field().current_sizes().to_vec(),
                targets: sim.field().target_sizes().to_vec(),
                ripples: sim.ripples().iter().copied().collect(),
            }
        }

        fn assert_unchanged(&self, sim: &ThoughtSimulation) {
            assert_eq!(sim.field().positions(), self.positions.as_slice());
            assert_eq!(sim.field().velocities(), self.velocities.as_slice());
            assert_eq!(sim.field().current_sizes(), self.current.as_slice());
            assert_eq!(sim.field().target_sizes(), self.targets.as_slice());
            assert_eq!(sim.ripples().iter().copied().collect::<Vec<_>>(), self.ripples);
        }
    }

    #[test]
    fn test_pointer_input_while_paused_leaves_state_untouched() {
        let mut sim = sim(200, false);
        let mut sink = Recorder::default();
        let now = run(&mut sim, 20, Instant::now(), &mut sink);

        sim.toggle_pause();
        let before = Snapshot::of(&sim);
        let target = screen_of(&sim, 5);
        sim.pointer_moved(target.x, target.y);
        sim.pointer_pressed(target.x, target.y);
        let now = run(&mut sim, 20, now, &mut sink);

        before.assert_unchanged(&sim);
        assert!(sink.selections.is_empty());
        assert!(sim.frame().hovered.is_some());
        assert!(sim.interaction().attractor().is_some());

        sim.toggle_pause();
        run(&mut sim, 1, now, &mut sink);
        assert!(sink.selections.is_empty());
        assert!(!sim.interaction().is_selection_open());
    }

    #[test]
    fn test_ignored_touch_while_paused_has_no_effect() {
        let mut settings = settings(1, false);
        settings.interaction.touch_response_prob = 0.0;
        let mut sim = ThoughtSimulation::new(
            settings,
            CategoryFilter::default(),
            InputMode::Touch,
            ContentLibrary::builtin(),
            Some(7),
            VIEWPORT,
        );
        let mut sink = Recorder::default();
        let mut now = Instant::now();

        let target = screen_of(&sim, 0);
        sim.pointer_pressed(target.x, target.y);
        now = run(&mut sim, 1, now, &mut sink);
        assert_eq!(sink.selections.len(), 1);

        sim.pointer_pressed(0.0, 0.0);
        now = run(&mut sim, 1, now, &mut sink);
        assert_eq!(sink.dismissed, 1);

        // Any further touch would now be ignored and nudge the particle
        sim.toggle_pause();
        let before = Snapshot::of(&sim);
        let target = screen_of(&sim, 0);
        sim.pointer_pressed(target.x, target.y);
        run(&mut sim, 10, now, &mut sink);

        before.assert_unchanged(&sim);
        assert_eq!(sink.selections.len(), 1);
        assert_eq!(sink.dismissed, 1);
    }

    #[test]
    fn test_click_scenario_selects_and_ripples_at_particle() {
        let mut sim = sim(1, false);
        let mut sink = Recorder::default();

        let local = sim.field().position(0).unwrap();
        let world = sim.transform().to_world(local);
        let screen = sim
            .camera()
            .project(world, &sim.camera().view_projection(), VIEWPORT)
            .unwrap();

        sim.pointer_pressed(screen.x, screen.y);
        sim.tick(FRAME, Instant::now(), &mut sink);

        assert_eq!(sink.selections.len(), 1);
        let selection = &sink.selections[0];
        assert_eq!(selection.particle, 0);
        assert_eq!(Some(selection.category), sim.field().category(0));
        assert_eq!(sim.ripples().len(), 1);
        assert_eq!(sim.ripples().iter().next().unwrap().origin, local);
        assert!(sim.interaction().is_selection_open());
        assert!(sim.frame().highlighted[0]);
    }

    #[test]
    fn test_boost_reverts_while_paused() {
        let mut sim = sim(1, false);
        let mut sink = Recorder::default();
        let local = sim.field().position(0).unwrap();
        let screen = sim
            .camera()
            .project(local, &sim.camera().view_projection(), VIEWPORT)
            .unwrap();
        let start = Instant::now();
        sim.pointer_pressed(screen.x, screen.y);
        sim.tick(FRAME, start, &mut sink);
        sim.toggle_pause();

        let base = sim.field().base_sizes()[0];
        assert!(sim.field().target_sizes()[0] > base);
        sim.tick(FRAME, start + Duration::from_secs(4), &mut sink);
        assert_eq!(sim.field().target_sizes()[0], base);
        assert!(!sim.frame().highlighted[0]);
    }

    #[test]
    fn test_category_toggle_reseeds_from_active_set() {
        let mut sim = sim(300, false);
        let mut sink = Recorder::default();
        assert!(sim.toggle_category(Category::B, &mut sink));
        assert_eq!(sim.particle_count(), 300);
        assert!(sim.field().categories().iter().all(|c| *c != Category::B));

        assert!(sim.toggle_category(Category::A, &mut sink));
        assert!(!sim.toggle_category(Category::C, &mut sink));
        assert!(sim.field().categories().iter().all(|c| *c == Category::C));
    }

    #[test]
    fn test_resize_keeps_steady_positions() {
        let mut sim = sim(50, false);
        let mut sink = Recorder::default();
        run(&mut sim, 3, Instant::now(), &mut sink);
        let positions = sim.field().positions().to_vec();
        let targets = sim.field().cluster_targets().to_vec();
        sim.resize(Vec2::new(400.0, 100.0));
        assert_eq!(sim.field().positions(), positions.as_slice());
        assert_ne!(sim.field().cluster_targets(), targets.as_slice());
        assert!((sim.camera().aspect - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_edges_respect_cap_and_threshold() {
        let mut sim = sim(500, false);
        let mut sink = Recorder::default();
        run(&mut sim, 2, Instant::now(), &mut sink);
        let frame = sim.frame();
        assert!(frame.edges.len() <= sim.settings().graph.max_edges);
        for edge in frame.edges {
            let d = frame.positions[edge.a].distance(frame.positions[edge.b]);
            assert!(d < sim.settings().graph.connect_distance);
        }
    }

    #[test]
    fn test_render_sizes_stay_near_current() {
        let mut sim = sim(30, false);
        let mut sink = Recorder::default();
        run(&mut sim, 100, Instant::now(), &mut sink);
        let amp = sim.settings().space.pulse_amplitude;
        for (render, current) in sim.frame().render_sizes.iter().zip(sim.field().current_sizes()) {
            assert!(*render >= current * (1.0 - amp) - 1e-4);
            assert!(*render <= current * (1.0 + amp) + 1e-4);
        }
    }
}
