use crate::app::{App, Focus};
use crate::braille;
use crate::category::Category;
use crate::color;
use crate::settings::InputMode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 28;

const STATUS_HEIGHT: u16 = 8;
const PARAMS_HEIGHT: u16 = 10;
const THOUGHT_HEIGHT: u16 = 9;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 63;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 18;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let canvas = get_canvas_rect(frame_area, fullscreen);
    (canvas.width, canvas.height)
}

/// Inner canvas area in terminal cells (excluding borders)
pub fn get_canvas_rect(frame_area: Rect, fullscreen: bool) -> Rect {
    let left = if fullscreen { 0 } else { SIDEBAR_WIDTH.min(frame_area.width) };
    Rect {
        x: frame_area.x + left + 1,
        y: frame_area.y + 1,
        width: frame_area.width.saturating_sub(left + 2),
        height: frame_area.height.saturating_sub(2),
    }
}

/// Rows of the controls box that fit on screen
pub fn get_controls_visible_lines(frame_area: Rect) -> u16 {
    frame_area
        .height
        .saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT + THOUGHT_HEIGHT + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(PARAMS_HEIGHT),
            Constraint::Length(THOUGHT_HEIGHT),
            Constraint::Min(3), // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_thought_box(frame, sections[2], app);
    render_controls_box(frame, sections[3], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Thought Field ");
    let sim = &app.simulation;
    let clock = sim.clock();

    let (status_text, status_color) = if clock.is_paused() {
        ("PAUSED".to_string(), HIGHLIGHT_COLOR)
    } else if clock.is_slow_motion() {
        (format!("DRIFTING x{:.2}", clock.speed_multiplier()), Color::Magenta)
    } else {
        (clock.phase().name().to_string(), BORDER_COLOR)
    };

    let category_spans: Vec<Span> = Category::ALL
        .iter()
        .flat_map(|&category| {
            let style = if sim.filter().is_active(category) {
                Style::default().fg(color::to_terminal(color::category_rgb(category)))
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [
                Span::styled(format!("{}:", category.index() + 1), Style::default().fg(DIM_TEXT_COLOR)),
                Span::styled(format!("{} ", category.name()), style),
            ]
        })
        .collect();

    let mut content = vec![
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(Span::styled(
            format!("{} particles", sim.particle_count()),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!(
                "{}{} links  {} ripples",
                sim.graph().edges().len(),
                if sim.graph().truncated() { "+" } else { "" },
                sim.ripples().len()
            ),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(category_spans),
        Line::from(Span::styled(
            format!("Preset: {}", app.preset_name()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    if app.is_recording() {
        content.push(Line::from(Span::styled(
            format!("REC {} frames", app.recorded_frames()),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(status) = &app.status {
        content.push(Line::from(Span::styled(
            status.text.clone(),
            Style::default().fg(HIGHLIGHT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = app.simulation.settings();

    let content = vec![
        make_line(
            "Attractor",
            format!("{:.0}", settings.interaction.attractor_radius),
            app.focus == Focus::Attractor,
        ),
        make_line(
            "Damping",
            format!("{:.3}", settings.space.damping),
            app.focus == Focus::Damping,
        ),
        make_line(
            "Edges",
            format!("{}", settings.graph.max_edges),
            app.focus == Focus::Edges,
        ),
        make_line(
            "Link",
            format!("{:.0}", settings.graph.connect_distance),
            app.focus == Focus::Link,
        ),
        make_line(
            "Reflect",
            settings.space.reflection.name().to_string(),
            app.focus == Focus::Reflection,
        ),
        make_line(
            "Related",
            format!("{:.2}", settings.interaction.related_prob),
            app.focus == Focus::Related,
        ),
        make_line(
            "Ripple",
            format!("{:.2}", settings.ripple.initial_strength),
            app.focus == Focus::Ripple,
        ),
        make_line(
            "Touch",
            format!("{:.2}", settings.interaction.touch_response_prob),
            app.focus == Focus::Touch,
        ),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0 // No scrolling needed
    } else if focus_line >= visible_height {
        // Scroll to show focused line at bottom of visible area
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0 // Focus is within first visible lines
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_thought_box(frame: &mut Frame, area: Rect, app: &App) {
    let Some(selection) = &app.panel.selection else {
        let hint = if app.simulation.interaction().mode() == InputMode::Touch {
            "Click a light to read it"
        } else {
            "Hover to pull, click to read"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(DIM_TEXT_COLOR))))
            .block(styled_block(" Thought "))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let accent = color::to_terminal(color::category_rgb(selection.category));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(format!(" {} ", selection.category.label()));

    let mut content = vec![Line::from(Span::styled(
        selection.item.text.clone(),
        Style::default().fg(TEXT_COLOR),
    ))];
    match &selection.item.detail {
        Some(detail) if app.panel.show_detail => {
            content.push(Line::from(""));
            content.push(Line::from(Span::styled(detail.clone(), Style::default().fg(DIM_TEXT_COLOR))));
        }
        Some(_) => {
            content.push(Line::from(""));
            content.push(Line::from(Span::styled("D: more", Style::default().fg(HIGHLIGHT_COLOR))));
        }
        None => {}
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    // Helper to create a control line
    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let pause = if app.simulation.is_paused() { "resume" } else { "pause" };
    let stars = if app.show_stars { "on" } else { "off" };
    let record = if app.is_recording() { "stop recording" } else { "record GIF" };

    let content = vec![
        make_control("Space", pause.to_string()),
        make_control("H/?", "help".to_string()),
        make_control("R", "reset".to_string()),
        make_control("1-3", "toggle category".to_string()),
        make_control("Tab", "next parameter".to_string()),
        make_control("←→", "adjust".to_string()),
        make_control("Click", "read a thought".to_string()),
        make_control("D", "more/less".to_string()),
        make_control("Esc", "close".to_string()),
        make_control("P", "next preset".to_string()),
        make_control("U", "save preset".to_string()),
        make_control("Bksp", "delete preset".to_string()),
        make_control("S", format!("stars: {}", stars)),
        make_control("X", "snapshot PNG".to_string()),
        make_control("G", record.to_string()),
        make_control("E", "export config".to_string()),
        make_control("V", "fullscreen".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    let title = if is_scrollable {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let block = styled_block(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(
        &app.simulation.frame(),
        app.simulation.camera(),
        app.visible_stars(),
        inner.width,
        inner.height,
    );

    let buffer = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buffer.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color);
            }
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(40);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("THOUGHT FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Each light is a thought drifting in three loose clusters. Nearby lights link up, clicks send ripples through the field."),
        Line::from(""),
        Line::from(Span::styled("CATEGORIES (1-3):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("1=Blue, 2=Purple, 3=Cyan. At least one stays on; toggling re-seeds the field."),
        Line::from(""),
        Line::from(Span::styled("POINTER:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(""),
        Line::from(Span::styled("Hover", Style::default().fg(TEXT_COLOR))),
        Line::from("Each light is drawn toward the pointer, pushed away, or ignores it."),
        Line::from(""),
        Line::from(Span::styled("Click", Style::default().fg(TEXT_COLOR))),
        Line::from("Opens the thought in the sidebar, starts a ripple and sometimes lights up a few other particles. Click again or press Esc to close."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, arrows):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(""),
        Line::from(Span::styled("Attractor / Damping", Style::default().fg(TEXT_COLOR))),
        Line::from("Pull radius around the pointer and velocity kept per frame"),
        Line::from(""),
        Line::from(Span::styled("Edges / Link", Style::default().fg(TEXT_COLOR))),
        Line::from("Maximum links drawn and the distance under which lights connect"),
        Line::from(""),
        Line::from(Span::styled("Reflect", Style::default().fg(TEXT_COLOR))),
        Line::from("PerAxis bounces each wall axis, FirstAxis always flips X"),
        Line::from(""),
        Line::from(Span::styled("Related / Ripple / Touch", Style::default().fg(TEXT_COLOR))),
        Line::from("Chance to highlight related lights, ripple strength, and how often a touch gets a reply"),
        Line::from(""),
        Line::from(Span::styled("PRESETS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("P=next preset, U=save current settings as a user preset, Backspace=delete the selected user preset"),
        Line::from(""),
        Line::from(Span::styled("CAPTURE:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("X=PNG snapshot, G=start/stop GIF, E=export settings as JSON"),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Reset, P=Preset, S=Stars, V=Fullscreen, D=Detail, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    // Update title to show scroll hint if scrollable
    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
