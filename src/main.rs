mod app;
mod braille;
mod camera;
mod capture;
mod category;
mod clock;
mod cluster;
mod color;
mod config;
mod content;
mod error;
mod field;
mod interaction;
mod presets;
mod probe;
mod proximity;
mod ripple;
mod settings;
mod simulation;
mod ui;

use anyhow::{bail, Context};
use app::App;
use category::Category;
use clap::Parser;
use config::AppConfig;
use content::ContentLibrary;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use presets::PresetManager;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::{FieldSettings, InputMode, ReflectionPolicy, LITE_PARTICLE_COUNT};
use simulation::ThoughtSimulation;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STAR_COUNT: usize = 140;

#[derive(Parser, Debug)]
#[command(name = "thought-field")]
#[command(about = "An interactive field of drifting thoughts in the terminal")]
struct Args {
    /// Number of particles (overrides --lite and presets)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Reduced particle count for slow terminals
    #[arg(long)]
    lite: bool,

    /// Tap-only input: no hover and no attractor
    #[arg(long)]
    touch: bool,

    /// Skip the load-in animation
    #[arg(long = "no-intro")]
    no_intro: bool,

    /// RNG seed for a reproducible field
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with the three thought pools
    #[arg(long)]
    thoughts: Option<PathBuf>,

    /// Start from an exported config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Where E writes the current config
    #[arg(long, default_value = "thought-field-config.json")]
    export: PathBuf,

    /// Start with a named preset (drift, dense, storm, still, lite, ...)
    #[arg(long)]
    preset: Option<String>,

    /// Boundary reflection (per-axis, first-axis)
    #[arg(long)]
    reflection: Option<String>,

    /// Link distance between particles (5-30)
    #[arg(long)]
    connect: Option<f32>,

    /// Write logs to this file (RUST_LOG overrides the default "info")
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_reflection(s: &str) -> ReflectionPolicy {
    match s.to_lowercase().as_str() {
        "first-axis" | "firstaxis" | "first" | "legacy" => ReflectionPolicy::FirstAxis,
        _ => ReflectionPolicy::PerAxis,
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Config file, then preset, then individual flags
fn resolve_config(args: &Args, presets: &PresetManager) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            AppConfig::load_from_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let Some(preset) = presets.find(name) else {
            bail!("unknown preset '{}' (available: {})", name, presets.preset_names().join(", "));
        };
        config.settings = preset.settings.clone();
    }

    apply_overrides(&mut config.settings, args);
    if args.touch {
        config.input_mode = Some(InputMode::Touch);
    }
    if args.thoughts.is_some() {
        config.thoughts = args.thoughts.clone();
    }
    Ok(config)
}

fn apply_overrides(settings: &mut FieldSettings, args: &Args) {
    if args.lite {
        settings.space.particle_count = LITE_PARTICLE_COUNT;
    }
    if let Some(count) = args.particles {
        settings.space.particle_count = count.clamp(1, 5000);
    }
    if let Some(reflection) = &args.reflection {
        settings.space.reflection = parse_reflection(reflection);
    }
    if let Some(distance) = args.connect {
        settings.graph.connect_distance = distance.clamp(5.0, 30.0);
    }
    if args.no_intro {
        settings.clock.load_in = false;
    }
}

fn load_content(path: Option<&Path>) -> ContentLibrary {
    let Some(path) = path else {
        return ContentLibrary::builtin();
    };
    match ContentLibrary::load(path) {
        Ok(content) => {
            info!(path = %path.display(), thoughts = content.total(), "thoughts loaded");
            content
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "falling back to built-in thoughts");
            ContentLibrary::builtin()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let presets = PresetManager::new();
    let config = resolve_config(&args, &presets)?;
    let content = load_content(config.thoughts.as_deref());
    let mode = config.input_mode.unwrap_or_default();

    // Setup terminal
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Get initial terminal size and create app
    let size = terminal.size()?;
    let frame_rect = Rect::new(0, 0, size.width, size.height);
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect, false);

    let simulation = ThoughtSimulation::new(
        config.settings.clone(),
        config.filter,
        mode,
        content,
        args.seed,
        braille::calculate_viewport(canvas_width, canvas_height),
    );
    let mut star_rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let stars = braille::star_field(STAR_COUNT, &mut star_rng);

    let mut app = App::new(simulation, presets, stars, args.export.clone());
    app.show_stars = config.show_stars;
    app.thoughts_path = config.thoughts.clone();
    if let Some(name) = &args.preset {
        app.preset_index = app.presets.all_presets().position(|p| p.name.eq_ignore_ascii_case(name));
    }
    app.resize(size.width, size.height);

    // Run the app
    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if app.is_recording() {
        // Flush an unfinished recording on quit
        app.toggle_recording();
    }
    info!("session ended");

    res.context("terminal loop failed")
}

/// Fixed-rate frame schedule. Input events never advance it.
struct FramePacer {
    frame: Duration,
    next: Instant,
}

impl FramePacer {
    fn new(frame: Duration, now: Instant) -> Self {
        Self { frame, next: now + frame }
    }

    /// Time left before the next frame is due
    fn timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// True when a frame is due; schedules the following one
    fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.frame;
        if self.next <= now {
            // Fell behind; skip the missed frames instead of bursting
            self.next = now + self.frame;
        }
        true
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);
    let mut pacer = FramePacer::new(FRAME_DURATION, Instant::now());

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Wait until the next frame, draining every event that arrives
        let mut timeout = pacer.timeout(Instant::now());
        while event::poll(timeout)? {
            if handle_event(terminal, app, event::read()?)? {
                return Ok(());
            }
            timeout = Duration::ZERO;
        }

        let now = Instant::now();
        if pacer.due(now) {
            app.tick(now);
        }
    }
}

/// Apply one terminal event. Returns true when the app should quit.
fn handle_event<B: ratatui::backend::Backend>(terminal: &Terminal<B>, app: &mut App, event: Event) -> io::Result<bool> {
    match event {
        Event::Key(key) => {
            // Only process Press events
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }

            // Handle Ctrl+C
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }

            match key.code {
                // System controls
                KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(true),
                KeyCode::Char(' ') => app.toggle_pause(),
                KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                KeyCode::Char('1') => app.toggle_category(Category::A),
                KeyCode::Char('2') => app.toggle_category(Category::B),
                KeyCode::Char('3') => app.toggle_category(Category::C),
                KeyCode::Char('d') | KeyCode::Char('D') => app.toggle_detail(),
                KeyCode::Char('s') | KeyCode::Char('S') => app.toggle_stars(),
                KeyCode::Char('p') | KeyCode::Char('P') => app.next_preset(),
                KeyCode::Char('u') | KeyCode::Char('U') => app.save_user_preset(),
                KeyCode::Backspace | KeyCode::Delete => app.delete_user_preset(),
                KeyCode::Char('e') | KeyCode::Char('E') => app.export_config(),
                KeyCode::Char('x') | KeyCode::Char('X') => app.snapshot(),
                KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_recording(),

                // Navigation
                KeyCode::Tab => app.next_focus(),
                KeyCode::BackTab => app.prev_focus(),
                KeyCode::Right => {
                    if app.focus.is_param() {
                        app.adjust_focused_up();
                    }
                }
                KeyCode::Left => {
                    if app.focus.is_param() {
                        app.adjust_focused_down();
                    }
                }
                KeyCode::Up => {
                    if !app.show_help {
                        if app.focus.is_param() {
                            app.adjust_focused_up();
                        } else {
                            app.scroll_controls_up();
                        }
                    }
                }
                KeyCode::Down => {
                    if !app.show_help {
                        if app.focus.is_param() {
                            app.adjust_focused_down();
                        } else {
                            let term_size = terminal.size()?;
                            let visible = ui::get_controls_visible_lines(Rect::new(
                                0,
                                0,
                                term_size.width,
                                term_size.height,
                            ));
                            app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                        }
                    }
                }
                KeyCode::Esc => app.escape(),
                KeyCode::Char('j') | KeyCode::Char('J') => {
                    if app.show_help {
                        app.scroll_help_down(ui::HELP_CONTENT_LINES);
                    }
                }
                KeyCode::Char('k') | KeyCode::Char('K') => {
                    if app.show_help {
                        app.scroll_help_up();
                    }
                }
                _ => {}
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                app.handle_mouse_move(mouse.column, mouse.row)
            }
            MouseEventKind::Down(MouseButton::Left) => app.handle_mouse_down(mouse.column, mouse.row),
            _ => {}
        },
        Event::FocusLost => app.simulation.pointer_left(),
        Event::Resize(width, height) => app.resize(width, height),
        _ => {}
    }
    Ok(false)
}
