use crate::braille;
use crate::capture::{self, GifRecorder, MAX_RECORDING_FRAMES, RECORDING_SIZE, SNAPSHOT_SIZE};
use crate::category::Category;
use crate::config::{AppConfig, CONFIG_VERSION};
use crate::interaction::{Selection, SelectionSink};
use crate::presets::{Preset, PresetManager};
use crate::simulation::ThoughtSimulation;
use crate::ui;
use glam::Vec2;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Longest frame step fed to the simulation (after stalls or suspends)
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);
const STATUS_LIFETIME: Duration = Duration::from_secs(4);

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    // Alphabetical order
    Attractor,
    Damping,
    Edges,
    Link,
    Reflection,
    Related,
    Ripple,
    Touch,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Attractor,
            Focus::Attractor => Focus::Damping,
            Focus::Damping => Focus::Edges,
            Focus::Edges => Focus::Link,
            Focus::Link => Focus::Reflection,
            Focus::Reflection => Focus::Related,
            Focus::Related => Focus::Ripple,
            Focus::Ripple => Focus::Touch,
            Focus::Touch => Focus::Attractor, // Loop back
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Touch,
            Focus::Attractor => Focus::Touch, // Loop back
            Focus::Damping => Focus::Attractor,
            Focus::Edges => Focus::Damping,
            Focus::Link => Focus::Edges,
            Focus::Reflection => Focus::Link,
            Focus::Related => Focus::Reflection,
            Focus::Ripple => Focus::Related,
            Focus::Touch => Focus::Ripple,
        }
    }

    /// Get the line index in the parameters box for this focus
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::Attractor => 0,
            Focus::Damping => 1,
            Focus::Edges => 2,
            Focus::Link => 3,
            Focus::Reflection => 4,
            Focus::Related => 5,
            Focus::Ripple => 6,
            Focus::Touch => 7,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Side panel fed by the simulation's selection events
#[derive(Debug, Default)]
pub struct SelectionPanel {
    pub selection: Option<Selection>,
    pub show_detail: bool,
    pub hovered: Option<usize>,
    /// Selections delivered this run
    pub opened: usize,
}

impl SelectionSink for SelectionPanel {
    fn on_select(&mut self, selection: &Selection) {
        self.selection = Some(selection.clone());
        self.show_detail = false;
        self.opened += 1;
    }

    fn on_hover_change(&mut self, hovered: Option<usize>) {
        self.hovered = hovered;
    }

    fn on_dismiss(&mut self) {
        self.selection = None;
        self.show_detail = false;
    }
}

pub struct StatusMessage {
    pub text: String,
    pub at: Instant,
}

/// Main application state
pub struct App {
    pub simulation: ThoughtSimulation,
    pub panel: SelectionPanel,
    pub presets: PresetManager,
    pub preset_index: Option<usize>,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub show_stars: bool,
    pub stars: Vec<Vec2>,
    pub export_path: PathBuf,
    pub thoughts_path: Option<PathBuf>,
    pub status: Option<StatusMessage>,
    recorder: Option<GifRecorder>,
    capture_skip: bool,
    terminal_size: (u16, u16),
    last_tick: Option<Instant>,
}

impl App {
    pub fn new(simulation: ThoughtSimulation, presets: PresetManager, stars: Vec<Vec2>, export_path: PathBuf) -> Self {
        Self {
            simulation,
            panel: SelectionPanel::default(),
            presets,
            preset_index: None,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            show_stars: true,
            stars,
            export_path,
            thoughts_path: None,
            status: None,
            recorder: None,
            capture_skip: false,
            terminal_size: (0, 0),
            last_tick: None,
        }
    }

    /// Run one simulation frame
    pub fn tick(&mut self, now: Instant) {
        let dt = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::from_millis(16))
            .min(MAX_FRAME_STEP);
        self.last_tick = Some(now);

        self.simulation.tick(dt, now, &mut self.panel);
        self.capture_recording_frame();

        if self
            .status
            .as_ref()
            .is_some_and(|s| now.saturating_duration_since(s.at) > STATUS_LIFETIME)
        {
            self.status = None;
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            at: Instant::now(),
        });
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1.0);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1.0);
    }

    fn adjust_focused(&mut self, dir: f32) {
        let focus = self.focus;
        self.simulation.tune(|s| match focus {
            Focus::None | Focus::Controls => {}
            Focus::Attractor => s.adjust_attractor_radius(dir),
            Focus::Damping => s.adjust_damping(0.005 * dir),
            Focus::Edges => s.adjust_max_edges(50 * dir as i32),
            Focus::Link => s.adjust_connect_distance(dir),
            Focus::Reflection => s.cycle_reflection(),
            Focus::Related => s.adjust_related_prob(0.05 * dir),
            Focus::Ripple => s.adjust_ripple_strength(0.25 * dir),
            Focus::Touch => s.adjust_touch_response(0.05 * dir),
        });
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.simulation.toggle_pause();
    }

    /// Reset simulation
    pub fn reset(&mut self) {
        self.simulation.reset(&mut self.panel);
        self.set_status("Field reset");
    }

    /// Toggle a category filter (1-3 keys)
    pub fn toggle_category(&mut self, category: Category) {
        if !self.simulation.toggle_category(category, &mut self.panel) {
            self.set_status(format!("{} is the last active category", category.label()));
        }
    }

    /// Show or hide the selection's long detail
    pub fn toggle_detail(&mut self) {
        let has_detail = self
            .panel
            .selection
            .as_ref()
            .is_some_and(|s| s.item.detail.is_some());
        if has_detail {
            self.panel.show_detail = !self.panel.show_detail;
        }
    }

    /// Esc: close help, leave parameter focus, or dismiss the selection
    pub fn escape(&mut self) {
        if self.show_help {
            self.toggle_help();
        } else if self.panel.selection.is_some() {
            self.simulation.dismiss(&mut self.panel);
        } else if self.focus.is_param() {
            self.focus = Focus::Controls;
        }
    }

    /// Configuration as it would be exported right now
    pub fn current_config(&self) -> AppConfig {
        AppConfig {
            version: CONFIG_VERSION,
            settings: self.simulation.settings().clone(),
            filter: *self.simulation.filter(),
            input_mode: Some(self.simulation.interaction().mode()),
            thoughts: self.thoughts_path.clone(),
            show_stars: self.show_stars,
        }
    }

    pub fn export_config(&mut self) {
        let path = self.export_path.clone();
        match self.current_config().save_to_file(&path) {
            Ok(()) => self.set_status(format!("Exported {}", path.display())),
            Err(e) => {
                warn!(error = %e, "config export failed");
                self.set_status(format!("Export failed: {}", e));
            }
        }
    }

    /// Apply the next preset in the list (P key)
    pub fn next_preset(&mut self) {
        if self.presets.is_empty() {
            return;
        }
        let index = self
            .preset_index
            .map(|i| (i + 1) % self.presets.len())
            .unwrap_or(0);
        self.apply_preset(index);
    }

    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = self.presets.get(index) else {
            return;
        };
        let (name, settings) = (preset.name.clone(), preset.settings.clone());
        info!(preset = %name, "preset applied");
        self.simulation.apply_settings(settings, &mut self.panel);
        self.preset_index = Some(index);
        self.set_status(format!("Preset: {}", name));
    }

    /// Save the current settings as a new user preset (U key)
    pub fn save_user_preset(&mut self) {
        let mut n = self.presets.user.len() + 1;
        while self.presets.find(&format!("User {}", n)).is_some() {
            n += 1;
        }
        let name = format!("User {}", n);
        let preset = Preset::new(name.clone(), "Saved from a running session", self.simulation.settings().clone());
        match self.presets.save_preset(preset) {
            Ok(()) => {
                info!(preset = %name, "user preset saved");
                self.preset_index = Some(self.presets.len() - 1);
                self.set_status(format!("Saved preset {}", name));
            }
            Err(e) => {
                warn!(error = %e, "preset save failed");
                self.set_status(format!("Preset save failed: {}", e));
            }
        }
    }

    /// Delete the current preset if it is a user preset (Backspace)
    pub fn delete_user_preset(&mut self) {
        let user = self
            .preset_index
            .and_then(|i| i.checked_sub(self.presets.builtin.len()))
            .and_then(|i| self.presets.user.get(i));
        let Some(name) = user.map(|p| p.name.clone()) else {
            self.set_status("No user preset selected");
            return;
        };
        match self.presets.delete_preset(&name) {
            Ok(()) => {
                info!(preset = %name, "user preset deleted");
                self.preset_index = None;
                self.set_status(format!("Deleted preset {}", name));
            }
            Err(e) => {
                warn!(error = %e, "preset delete failed");
                self.set_status(format!("Preset delete failed: {}", e));
            }
        }
    }

    pub fn preset_name(&self) -> &str {
        self.preset_index
            .and_then(|i| self.presets.get(i))
            .map(|p| p.name.as_str())
            .unwrap_or("Custom")
    }

    /// Write a PNG of the current frame (X key)
    pub fn snapshot(&mut self) {
        let path = PathBuf::from(format!("thought-field-{}.png", timestamp()));
        let image = capture::render_rgba(
            &self.simulation.frame(),
            self.simulation.camera(),
            self.visible_stars(),
            SNAPSHOT_SIZE.0,
            SNAPSHOT_SIZE.1,
        );
        match capture::save_png(&image, &path) {
            Ok(()) => self.set_status(format!("Saved {}", path.display())),
            Err(e) => {
                warn!(error = %e, "snapshot failed");
                self.set_status(format!("Snapshot failed: {}", e));
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn recorded_frames(&self) -> usize {
        self.recorder.as_ref().map_or(0, |r| r.len())
    }

    /// Start or stop a GIF recording (G key)
    pub fn toggle_recording(&mut self) {
        match self.recorder.take() {
            None => {
                self.recorder = Some(GifRecorder::new(RECORDING_SIZE.0, RECORDING_SIZE.1, MAX_RECORDING_FRAMES));
                self.set_status("Recording...");
            }
            Some(recorder) => self.finish_recording(recorder),
        }
    }

    fn finish_recording(&mut self, recorder: GifRecorder) {
        let path = PathBuf::from(format!("thought-field-{}.gif", timestamp()));
        match recorder.finish(&path) {
            Ok(frames) => self.set_status(format!("Saved {} ({} frames)", path.display(), frames)),
            Err(e) => {
                warn!(error = %e, "recording failed");
                self.set_status(format!("Recording failed: {}", e));
            }
        }
    }

    fn capture_recording_frame(&mut self) {
        // Every other frame keeps the recording near 30 fps
        self.capture_skip = !self.capture_skip;
        if self.capture_skip {
            return;
        }
        let Some(recorder) = &mut self.recorder else {
            return;
        };
        let stars: &[Vec2] = if self.show_stars { &self.stars } else { &[] };
        let image = capture::render_rgba(
            &self.simulation.frame(),
            self.simulation.camera(),
            stars,
            recorder.width(),
            recorder.height(),
        );
        recorder.push(image);
        if recorder.is_full() {
            if let Some(recorder) = self.recorder.take() {
                self.finish_recording(recorder);
            }
        }
    }

    pub fn toggle_stars(&mut self) {
        self.show_stars = !self.show_stars;
    }

    pub fn visible_stars(&self) -> &[Vec2] {
        if self.show_stars {
            &self.stars
        } else {
            &[]
        }
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
        let (width, height) = self.terminal_size;
        self.resize(width, height);
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// New terminal size; refits the canvas viewport
    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        let (canvas_width, canvas_height) = ui::get_canvas_size(self.frame_rect(), self.fullscreen_mode);
        self.simulation
            .resize(braille::calculate_viewport(canvas_width, canvas_height));
    }

    fn frame_rect(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.terminal_size.0,
            height: self.terminal_size.1,
        }
    }

    /// Terminal cell to canvas dot coordinates, if the cell is on the canvas
    pub fn canvas_dot(&self, col: u16, row: u16) -> Option<Vec2> {
        let canvas = ui::get_canvas_rect(self.frame_rect(), self.fullscreen_mode);
        if col < canvas.x || row < canvas.y || col >= canvas.x + canvas.width || row >= canvas.y + canvas.height {
            return None;
        }
        Some(braille::cell_to_dot(col - canvas.x, row - canvas.y))
    }

    pub fn handle_mouse_move(&mut self, col: u16, row: u16) {
        if self.show_help {
            return;
        }
        match self.canvas_dot(col, row) {
            Some(dot) => self.simulation.pointer_moved(dot.x, dot.y),
            None => self.simulation.pointer_left(),
        }
    }

    pub fn handle_mouse_down(&mut self, col: u16, row: u16) {
        if self.show_help {
            return;
        }
        if let Some(dot) = self.canvas_dot(col, row) {
            self.simulation.pointer_pressed(dot.x, dot.y);
        }
    }
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryFilter;
    use crate::content::ContentLibrary;
    use crate::settings::{FieldSettings, InputMode};
    use tempfile::tempdir;

    fn app(count: usize, export_path: PathBuf) -> App {
        app_with_presets(count, PresetManager::with_dir(None), export_path)
    }

    fn app_with_presets(count: usize, presets: PresetManager, export_path: PathBuf) -> App {
        let mut settings = FieldSettings::default();
        settings.space.particle_count = count;
        settings.clock.load_in = false;
        let simulation = ThoughtSimulation::new(
            settings,
            CategoryFilter::default(),
            InputMode::Pointer,
            ContentLibrary::builtin(),
            Some(3),
            Vec2::new(160.0, 160.0),
        );
        let mut app = App::new(simulation, presets, Vec::new(), export_path);
        app.resize(102, 42);
        app
    }

    #[test]
    fn test_focus_cycle_wraps() {
        let mut focus = Focus::Controls;
        for _ in 0..8 {
            focus = focus.next();
            assert!(focus.is_param());
        }
        assert_eq!(focus, Focus::Touch);
        assert_eq!(focus.next(), Focus::Attractor);
        assert_eq!(Focus::Attractor.prev(), Focus::Touch);
    }

    #[test]
    fn test_adjust_focused_param() {
        let mut app = app(10, PathBuf::from("unused.json"));
        app.focus = Focus::Link;
        let before = app.simulation.settings().graph.connect_distance;
        app.adjust_focused_up();
        assert_eq!(app.simulation.settings().graph.connect_distance, before + 1.0);
        app.adjust_focused_down();
        assert_eq!(app.simulation.settings().graph.connect_distance, before);
    }

    #[test]
    fn test_sidebar_cells_are_off_canvas() {
        let app = app(1, PathBuf::from("unused.json"));
        assert_eq!(app.canvas_dot(0, 5), None);
        let canvas = ui::get_canvas_rect(app.frame_rect(), false);
        assert_eq!(app.canvas_dot(canvas.x, canvas.y), Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_mouse_click_opens_panel() {
        let mut app = app(1, PathBuf::from("unused.json"));
        let sim = &app.simulation;
        let local = sim.field().position(0).unwrap();
        let screen = sim
            .camera()
            .project(sim.transform().to_world(local), &sim.camera().view_projection(), sim.viewport())
            .unwrap();
        // Clamp to the visible canvas so the click lands on a cell
        let viewport = sim.viewport();
        let dot = Vec2::new(screen.x.clamp(0.0, viewport.x - 1.0), screen.y.clamp(0.0, viewport.y - 1.0));
        let canvas = ui::get_canvas_rect(app.frame_rect(), false);
        let col = canvas.x + (dot.x / 2.0) as u16;
        let row = canvas.y + (dot.y / 4.0) as u16;

        app.handle_mouse_down(col, row);
        app.tick(Instant::now());
        let selection = app.panel.selection.as_ref().expect("particle selected");
        assert_eq!(selection.particle, 0);

        app.escape();
        assert!(app.panel.selection.is_none());
    }

    #[test]
    fn test_export_writes_current_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.json");
        let mut app = app(5, path.clone());
        app.simulation.tune(|s| s.graph.max_edges = 42);
        app.export_config();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.settings.graph.max_edges, 42);
        assert_eq!(loaded.input_mode, Some(InputMode::Pointer));
    }

    #[test]
    fn test_user_preset_save_and_delete() {
        let dir = tempdir().unwrap();
        let presets_dir = dir.path().join("presets");
        let presets = PresetManager::with_dir(Some(presets_dir.clone()));
        let mut app = app_with_presets(5, presets, dir.path().join("export.json"));
        app.simulation.tune(|s| s.graph.max_edges = 77);

        app.save_user_preset();
        assert_eq!(app.preset_name(), "User 1");
        assert!(presets_dir.join("User_1.json").exists());
        let reloaded = PresetManager::with_dir(Some(presets_dir.clone()));
        assert_eq!(reloaded.find("User 1").unwrap().settings.graph.max_edges, 77);

        app.save_user_preset();
        assert_eq!(app.preset_name(), "User 2");

        app.delete_user_preset();
        assert_eq!(app.preset_name(), "Custom");
        assert!(!presets_dir.join("User_2.json").exists());
        let reloaded = PresetManager::with_dir(Some(presets_dir));
        assert_eq!(reloaded.user.len(), 1);
        assert!(reloaded.find("User 2").is_none());
    }

    #[test]
    fn test_user_preset_save_without_config_dir() {
        let mut app = app(5, PathBuf::from("unused.json"));
        app.save_user_preset();
        assert!(app.presets.user.is_empty());
        assert_eq!(app.preset_index, None);
        let status = &app.status.as_ref().unwrap().text;
        assert!(status.starts_with("Preset save failed"), "{status}");
    }

    #[test]
    fn test_builtin_presets_are_not_deleted() {
        let mut app = app(5, PathBuf::from("unused.json"));
        app.next_preset();
        let before = app.presets.len();
        app.delete_user_preset();
        assert_eq!(app.presets.len(), before);
        assert_eq!(app.preset_name(), "Drift");
        assert_eq!(app.status.as_ref().unwrap().text, "No user preset selected");
    }

    #[test]
    fn test_next_preset_cycles_and_resets() {
        let mut app = app(5, PathBuf::from("unused.json"));
        app.next_preset();
        assert_eq!(app.preset_index, Some(0));
        assert_eq!(app.preset_name(), "Drift");
        app.next_preset();
        assert_eq!(app.preset_name(), "Dense");
        assert_eq!(app.simulation.settings().graph.max_edges, 600);
    }

    #[test]
    fn test_last_category_reports_status() {
        let mut app = app(5, PathBuf::from("unused.json"));
        app.toggle_category(Category::A);
        app.toggle_category(Category::B);
        assert!(app.status.is_none());
        app.toggle_category(Category::C);
        assert!(app.status.is_some());
    }
}
