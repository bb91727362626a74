//! Hover, selection, attractor and highlight timers.

use crate::category::Category;
use crate::content::{ContentLibrary, Thought};
use crate::field::SpatialField;
use crate::probe::Probe;
use crate::ripple::RippleField;
use crate::settings::{FieldSettings, InputMode, InteractionSettings};
use glam::{Vec2, Vec3};
use rand::Rng;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Per-index multiplier for the attractor reaction hash
const GOLDEN_FRACTION: f32 = 0.618;

/// A particle chosen by the user, with its resolved content
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub particle: usize,
    pub category: Category,
    pub item: Thought,
    pub slot: usize,
}

/// Receives selection events from the controller
pub trait SelectionSink {
    fn on_select(&mut self, selection: &Selection);
    fn on_hover_change(&mut self, _hovered: Option<usize>) {}
    fn on_dismiss(&mut self);
}

/// How a particle responds to the standing attractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Attract,
    Repel,
    Ignore,
}

/// Stable reaction class for a particle index
pub fn reaction_for(index: usize, settings: &InteractionSettings) -> Reaction {
    let hash = (index as f32 * GOLDEN_FRACTION).fract();
    if hash < settings.attract_share {
        Reaction::Attract
    } else if hash < settings.attract_share + settings.repel_share {
        Reaction::Repel
    } else {
        Reaction::Ignore
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerMove {
    At(Vec2),
    Left,
}

/// What a click turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(usize),
    Ignored(usize),
    Dismissed,
    Missed,
}

/// Mutable simulation parts a click may touch
pub struct ClickTargets<'a> {
    pub field: &'a mut SpatialField,
    pub ripples: &'a mut RippleField,
    pub content: &'a ContentLibrary,
}

pub struct InteractionController {
    mode: InputMode,
    settings: InteractionSettings,
    ripple_strength: f32,
    subtle_factor: f32,
    hovered: Option<usize>,
    /// Standing attractor in field-local coordinates
    attractor: Option<Vec3>,
    pending_move: Option<PointerMove>,
    pending_clicks: Vec<Vec2>,
    selection_open: bool,
    touched_once: bool,
    /// Highlighted particle -> expiry
    highlights: HashMap<usize, Instant>,
    next_active_display: Option<Instant>,
}

impl InteractionController {
    pub fn new(settings: &FieldSettings, mode: InputMode) -> Self {
        Self {
            mode,
            settings: settings.interaction.clone(),
            ripple_strength: settings.ripple.initial_strength,
            subtle_factor: settings.ripple.subtle_factor,
            hovered: None,
            attractor: None,
            pending_move: None,
            pending_clicks: Vec::new(),
            selection_open: false,
            touched_once: false,
            highlights: HashMap::new(),
            next_active_display: None,
        }
    }

    /// Pick up tuned parameters without touching interaction state
    pub fn apply_settings(&mut self, settings: &FieldSettings) {
        self.settings = settings.interaction.clone();
        self.ripple_strength = settings.ripple.initial_strength;
        self.subtle_factor = settings.ripple.subtle_factor;
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    #[cfg(test)]
    pub fn attractor(&self) -> Option<Vec3> {
        self.attractor
    }

    #[cfg(test)]
    pub fn is_selection_open(&self) -> bool {
        self.selection_open
    }

    #[cfg(test)]
    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlights.contains_key(&index)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = usize> + '_ {
        self.highlights.keys().copied()
    }

    #[cfg(test)]
    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
    }

    /// Record a pointer position; resolved on the next tick
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if self.mode == InputMode::Pointer {
            self.pending_move = Some(PointerMove::At(Vec2::new(x, y)));
        }
    }

    pub fn pointer_left(&mut self) {
        self.pending_move = Some(PointerMove::Left);
    }

    /// Record a click or tap; resolved on the next tick
    pub fn pointer_pressed(&mut self, x: f32, y: f32) {
        self.pending_clicks.push(Vec2::new(x, y));
    }

    /// Drop queued clicks (load-in ignores them)
    pub fn discard_clicks(&mut self) {
        self.pending_clicks.clear();
    }

    /// Apply the latest pointer move: hover probe and attractor placement.
    /// `plane` maps a pixel to the field-local attractor point.
    pub fn resolve_pointer(
        &mut self,
        probe: &dyn Probe,
        plane: impl Fn(f32, f32) -> Option<Vec3>,
        sink: &mut dyn SelectionSink,
    ) {
        let Some(pointer) = self.pending_move.take() else {
            return;
        };
        let (hovered, attractor) = match pointer {
            PointerMove::At(p) => (probe.probe(p.x, p.y), plane(p.x, p.y)),
            PointerMove::Left => (None, None),
        };
        self.attractor = attractor;
        self.set_hovered(hovered, sink);
    }

    /// Probe every queued click, oldest first
    pub fn take_clicks(&mut self, probe: &dyn Probe) -> Vec<Option<usize>> {
        self.pending_clicks
            .drain(..)
            .map(|p| probe.probe(p.x, p.y))
            .collect()
    }

    /// Clear hover and attractor without a pointer event (e.g. after a reset)
    pub fn clear_pointer(&mut self, sink: &mut dyn SelectionSink) {
        self.attractor = None;
        self.set_hovered(None, sink);
    }

    fn set_hovered(&mut self, hovered: Option<usize>, sink: &mut dyn SelectionSink) {
        if hovered != self.hovered {
            self.hovered = hovered;
            sink.on_hover_change(hovered);
        }
    }

    /// Resolve one probed click against the scene
    pub fn handle_click(
        &mut self,
        hit: Option<usize>,
        targets: ClickTargets<'_>,
        rng: &mut impl Rng,
        now: Instant,
        sink: &mut dyn SelectionSink,
    ) -> ClickOutcome {
        if self.selection_open {
            self.dismiss(sink);
            return ClickOutcome::Dismissed;
        }
        let Some(index) = hit else {
            return ClickOutcome::Missed;
        };
        let (Some(category), Some(slot), Some(position)) = (
            targets.field.category(index),
            targets.field.content_slot(index),
            targets.field.position(index),
        ) else {
            return ClickOutcome::Missed;
        };

        let responds = !self.touched_once || rng.gen::<f32>() < self.settings.touch_response_prob;
        if !responds {
            let kick = self.settings.ignored_kick.abs();
            if kick > 0.0 {
                let dv = Vec3::new(
                    rng.gen_range(-kick..=kick),
                    rng.gen_range(-kick..=kick),
                    rng.gen_range(-kick..=kick),
                );
                targets.field.nudge(index, dv);
            }
            targets
                .ripples
                .emit(position, self.ripple_strength * self.subtle_factor);
            debug!(particle = index, "touch ignored");
            return ClickOutcome::Ignored(index);
        }
        self.touched_once = true;

        self.highlight(index, targets.field, now);
        targets.ripples.emit(position, self.ripple_strength);

        let selection = Selection {
            particle: index,
            category,
            item: targets.content.resolve(category, slot),
            slot,
        };
        info!(particle = index, category = category.name(), slot, "particle selected");
        self.selection_open = true;
        sink.on_select(&selection);

        if rng.gen::<f32>() < self.settings.related_prob {
            self.highlight_related(index, targets.field, rng, now);
        }

        ClickOutcome::Selected(index)
    }

    pub fn dismiss(&mut self, sink: &mut dyn SelectionSink) {
        if self.selection_open {
            self.selection_open = false;
            sink.on_dismiss();
        }
    }

    fn highlight(&mut self, index: usize, field: &mut SpatialField, now: Instant) {
        if index >= field.len() {
            return;
        }
        field.set_boost(index, self.settings.boost_multiplier);
        self.highlights
            .insert(index, now + self.settings.highlight_duration());
    }

    fn highlight_related(&mut self, index: usize, field: &mut SpatialField, rng: &mut impl Rng, now: Instant) {
        let n = field.len();
        if n < 2 || self.settings.related_max == 0 {
            return;
        }
        let count = rng.gen_range(1..=self.settings.related_max);
        for _ in 0..count {
            let other = rng.gen_range(0..n);
            if other != index {
                self.highlight(other, field, now);
            }
        }
        debug!(particle = index, count, "related highlights");
    }

    /// Velocity nudges from the standing attractor, in the local x-y plane
    pub fn apply_attractor(&self, field: &mut SpatialField) {
        let Some(center) = self.attractor else {
            return;
        };
        let radius = self.settings.attractor_radius;
        if radius <= 0.0 {
            return;
        }

        for i in 0..field.len() {
            let reaction = reaction_for(i, &self.settings);
            if reaction == Reaction::Ignore {
                continue;
            }
            let p = field.positions()[i];
            let delta = Vec2::new(p.x - center.x, p.y - center.y);
            let dist = delta.length();
            if dist >= radius || dist <= f32::EPSILON {
                continue;
            }
            let strength = self.settings.attractor_strength * (1.0 - dist / radius);
            let push = (delta / dist * strength).extend(0.0);
            match reaction {
                Reaction::Attract => field.nudge(i, -push),
                Reaction::Repel => field.nudge(i, push),
                Reaction::Ignore => {}
            }
        }
    }

    /// Wall-clock timers: highlight expiry (with boost revert) and the
    /// spontaneous highlight. Runs whether or not the clock is paused.
    pub fn fire_timers(&mut self, now: Instant, field: &mut SpatialField, rng: &mut impl Rng) {
        let expired: Vec<usize> = self
            .highlights
            .iter()
            .filter(|(_, expiry)| now >= **expiry)
            .map(|(index, _)| *index)
            .collect();
        for index in expired {
            self.highlights.remove(&index);
            field.clear_boost(index);
        }

        let interval = self.settings.active_display_interval();
        let due = *self.next_active_display.get_or_insert(now + interval);
        if now < due {
            return;
        }
        self.next_active_display = Some(now + interval);
        if self.selection_open || field.is_empty() {
            return;
        }
        if rng.gen::<f32>() < self.settings.active_display_prob {
            let index = rng.gen_range(0..field.len());
            self.highlight(index, field, now);
            debug!(particle = index, "spontaneous highlight");
        }
    }

    /// Forget highlights and pointer state after the buffer is re-seeded
    pub fn reset(&mut self, sink: &mut dyn SelectionSink) {
        self.highlights.clear();
        self.pending_clicks.clear();
        self.dismiss(sink);
        self.clear_pointer(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryFilter;
    use crate::settings::SpaceSettings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    /// Always reports the same particle
    struct FixedProbe(Option<usize>);

    impl Probe for FixedProbe {
        fn probe(&self, _x: f32, _y: f32) -> Option<usize> {
            self.0
        }
    }

    #[derive(Default)]
    struct Recorder {
        selections: Vec<Selection>,
        hovers: Vec<Option<usize>>,
        dismissed: usize,
    }

    impl SelectionSink for Recorder {
        fn on_select(&mut self, selection: &Selection) {
            self.selections.push(selection.clone());
        }

        fn on_hover_change(&mut self, hovered: Option<usize>) {
            self.hovers.push(hovered);
        }

        fn on_dismiss(&mut self) {
            self.dismissed += 1;
        }
    }

    fn scene(count: usize) -> (FieldSettings, SpatialField, RippleField, StdRng) {
        let settings = FieldSettings {
            space: SpaceSettings {
                particle_count: count,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let field = SpatialField::new(&settings.space, &CategoryFilter::default(), &mut rng);
        let ripples = RippleField::new(&settings.ripple);
        (settings, field, ripples, rng)
    }

    #[test]
    fn test_reaction_is_stable_and_mixed() {
        let s = InteractionSettings::default();
        let first: Vec<Reaction> = (0..100).map(|i| reaction_for(i, &s)).collect();
        let second: Vec<Reaction> = (0..100).map(|i| reaction_for(i, &s)).collect();
        assert_eq!(first, second);
        assert_eq!(reaction_for(0, &s), Reaction::Attract);
        for kind in [Reaction::Attract, Reaction::Repel, Reaction::Ignore] {
            assert!(first.contains(&kind));
        }
    }

    #[test]
    fn test_related_highlights_span_categories() {
        let (mut settings, mut field, mut ripples, mut rng) = scene(60);
        settings.interaction.related_prob = 1.0;
        settings.interaction.related_max = 3;
        let content = ContentLibrary::builtin();
        let target = (0..field.len())
            .find(|i| field.category(*i) == Some(Category::A))
            .unwrap();

        let mut other_category = false;
        for _ in 0..20 {
            let mut controller = InteractionController::new(&settings, InputMode::Pointer);
            let mut sink = Recorder::default();
            controller.handle_click(
                Some(target),
                ClickTargets {
                    field: &mut field,
                    ripples: &mut ripples,
                    content: &content,
                },
                &mut rng,
                Instant::now(),
                &mut sink,
            );
            let related: Vec<usize> = controller.highlighted().filter(|i| *i != target).collect();
            assert!(related.len() <= settings.interaction.related_max);
            other_category |= related.iter().any(|i| field.category(*i) != Some(Category::A));
        }
        assert!(other_category);
    }

    #[test]
    fn test_click_selects_once_and_emits_one_ripple() {
        let (settings, mut field, mut ripples, mut rng) = scene(20);
        let content = ContentLibrary {
            a: vec![Thought::new("first a")],
            b: vec![Thought::new("first b")],
            c: vec![Thought::new("first c")],
        };
        let target = (0..field.len())
            .find(|i| field.category(*i) == Some(Category::A))
            .unwrap();
        let before = field.position(target).unwrap();

        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        controller.pointer_pressed(10.0, 10.0);
        let hits = controller.take_clicks(&FixedProbe(Some(target)));
        assert_eq!(hits, vec![Some(target)]);

        let outcome = controller.handle_click(
            hits[0],
            ClickTargets {
                field: &mut field,
                ripples: &mut ripples,
                content: &content,
            },
            &mut rng,
            Instant::now(),
            &mut sink,
        );

        assert_eq!(outcome, ClickOutcome::Selected(target));
        assert_eq!(sink.selections.len(), 1);
        let selection = &sink.selections[0];
        assert_eq!(selection.category, Category::A);
        assert_eq!(selection.item.text, content.resolve(Category::A, selection.slot).text);
        assert_eq!(ripples.len(), 1);
        assert_eq!(ripples.iter().next().unwrap().origin, before);
        assert!(controller.is_selection_open());
        assert!(controller.is_highlighted(target));
    }

    #[test]
    fn test_click_with_open_panel_dismisses() {
        let (settings, mut field, mut ripples, mut rng) = scene(5);
        let content = ContentLibrary::builtin();
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        let now = Instant::now();

        for _ in 0..2 {
            controller.handle_click(
                Some(0),
                ClickTargets {
                    field: &mut field,
                    ripples: &mut ripples,
                    content: &content,
                },
                &mut rng,
                now,
                &mut sink,
            );
        }
        assert_eq!(sink.selections.len(), 1);
        assert_eq!(sink.dismissed, 1);
        assert!(!controller.is_selection_open());
        assert_eq!(ripples.len(), 1);
    }

    #[test]
    fn test_click_on_empty_space_is_noop() {
        let (settings, mut field, mut ripples, mut rng) = scene(5);
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        let outcome = controller.handle_click(
            None,
            ClickTargets {
                field: &mut field,
                ripples: &mut ripples,
                content: &ContentLibrary::builtin(),
            },
            &mut rng,
            Instant::now(),
            &mut sink,
        );
        assert_eq!(outcome, ClickOutcome::Missed);
        assert!(ripples.is_empty());
        assert!(sink.selections.is_empty());
    }

    #[test]
    fn test_ignored_touch_gives_subtle_ripple() {
        let (mut settings, mut field, mut ripples, mut rng) = scene(5);
        settings.interaction.touch_response_prob = 0.0;
        let content = ContentLibrary::builtin();
        let mut controller = InteractionController::new(&settings, InputMode::Touch);
        let mut sink = Recorder::default();
        let now = Instant::now();

        let mut click = |controller: &mut InteractionController, sink: &mut Recorder| {
            controller.handle_click(
                Some(1),
                ClickTargets {
                    field: &mut field,
                    ripples: &mut ripples,
                    content: &content,
                },
                &mut rng,
                now,
                sink,
            )
        };

        // First touch always responds
        assert_eq!(click(&mut controller, &mut sink), ClickOutcome::Selected(1));
        assert_eq!(click(&mut controller, &mut sink), ClickOutcome::Dismissed);
        assert_eq!(click(&mut controller, &mut sink), ClickOutcome::Ignored(1));
        assert_eq!(sink.selections.len(), 1);

        let strengths: Vec<f32> = ripples.iter().map(|r| r.strength).collect();
        assert_eq!(strengths.len(), 2);
        let expected = settings.ripple.initial_strength * settings.ripple.subtle_factor;
        assert!((strengths[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_boost_reverts_on_wall_clock() {
        let (settings, mut field, mut ripples, mut rng) = scene(5);
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        let start = Instant::now();
        controller.handle_click(
            Some(2),
            ClickTargets {
                field: &mut field,
                ripples: &mut ripples,
                content: &ContentLibrary::builtin(),
            },
            &mut rng,
            start,
            &mut sink,
        );
        let base = field.base_sizes()[2];
        assert!((field.target_sizes()[2] - base * 1.5).abs() < 1e-6);

        controller.fire_timers(start + Duration::from_secs(1), &mut field, &mut rng);
        assert!(controller.is_highlighted(2));
        controller.fire_timers(start + Duration::from_secs(4), &mut field, &mut rng);
        assert!(!controller.is_highlighted(2));
        assert_eq!(field.target_sizes()[2], base);
    }

    #[test]
    fn test_spontaneous_highlight_waits_for_interval() {
        let (mut settings, mut field, _, mut rng) = scene(10);
        settings.interaction.active_display_prob = 1.0;
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let start = Instant::now();

        controller.fire_timers(start, &mut field, &mut rng);
        controller.fire_timers(start + Duration::from_secs(44), &mut field, &mut rng);
        assert_eq!(controller.highlight_count(), 0);
        controller.fire_timers(start + Duration::from_secs(45), &mut field, &mut rng);
        assert_eq!(controller.highlight_count(), 1);
    }

    #[test]
    fn test_hover_reports_changes_only() {
        let (settings, ..) = scene(1);
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        let plane = |_: f32, _: f32| Some(Vec3::ZERO);

        for _ in 0..3 {
            controller.pointer_moved(5.0, 5.0);
            controller.resolve_pointer(&FixedProbe(Some(4)), plane, &mut sink);
        }
        controller.pointer_left();
        controller.resolve_pointer(&FixedProbe(Some(4)), plane, &mut sink);

        assert_eq!(sink.hovers, vec![Some(4), None]);
        assert_eq!(controller.attractor(), None);
    }

    #[test]
    fn test_touch_mode_ignores_movement() {
        let (settings, ..) = scene(1);
        let mut controller = InteractionController::new(&settings, InputMode::Touch);
        let mut sink = Recorder::default();
        controller.pointer_moved(5.0, 5.0);
        controller.resolve_pointer(&FixedProbe(Some(0)), |_, _| Some(Vec3::ZERO), &mut sink);
        assert_eq!(controller.hovered(), None);
        assert_eq!(controller.attractor(), None);
    }

    #[test]
    fn test_attractor_moves_attracted_particle_inward() {
        let (settings, mut field, _, _) = scene(1);
        // Index 0 hashes to Attract
        let mut controller = InteractionController::new(&settings, InputMode::Pointer);
        let mut sink = Recorder::default();
        let p = field.position(0).unwrap();
        let center = p + Vec3::new(5.0, 0.0, 0.0);
        controller.pointer_moved(0.0, 0.0);
        controller.resolve_pointer(&FixedProbe(None), |_, _| Some(center), &mut sink);

        let before = field.velocities()[0];
        controller.apply_attractor(&mut field);
        let after = field.velocities()[0];
        assert!(after.x > before.x);
        assert_eq!(after.z, before.z);
    }
}
