//! # Terminal User Interface (TUI)
//!
//! Interactive timeline viewer using `ratatui`. The overview is drawn onto a
//! [`canvas::CellCanvas`] where one layout unit is one terminal cell, so the
//! same [`App`] queries that serve SVG output serve the terminal.
//!
//! ## View Modes
//!
//! - **Timeline** - Scrollable overview with hover tooltips (default)
//! - **Help** - Keyboard shortcuts and how to read the bands
//!
//! The CPU detail view is an overlay owned by [`App`], opened by clicking a
//! CPU band (or `Enter` with the keyboard cursor on one).
//!
//! ## Sub-Modules
//!
//! - `canvas` - Cell surface and scrolled blit
//! - `theme` - Color scheme

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::too_many_lines
)]

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

pub mod canvas;
mod theme;

use crate::app::{App, Area, ClickOutcome, Key};
use crate::config::ViewConfig;
use crate::domain::{Micros, TuiError};
use crate::interaction::Pointer;
use crate::layout::format_ms;
use crate::trace_model::TraceModel;
use canvas::CellCanvas;
use theme::{severity_color, BACKGROUND, CAUTION_AMBER, HUD_GREEN, INFO_DIM};

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
const STYLE_LABEL: Style = Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Rows scrolled per wheel step or page key
const SCROLL_STEP: i32 = 3;

// =============================================================================
// VIEW MODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum ViewMode {
    /// Overview with tooltips and the optional CPU detail overlay
    Timeline,
    /// Help overlay with keyboard shortcuts
    Help,
}

// =============================================================================
// VIEWER
// =============================================================================

/// Terminal front end around an [`App`]
pub struct Viewer {
    app: App,
    view_mode: ViewMode,
    /// Keyboard cursor in canvas cells
    cursor: Option<(u16, u16)>,
    scroll: u16,
    /// Screen area of the canvas as of the last frame
    main_area: Rect,
    status: Option<String>,
    should_quit: bool,
}

impl Viewer {
    #[must_use]
    pub fn new(model: TraceModel, columns: u16) -> Self {
        let mut app = App::new(ViewConfig::terminal(columns));
        app.set_model(model);
        Self {
            app,
            view_mode: ViewMode::Timeline,
            cursor: None,
            scroll: 0,
            main_area: Rect::default(),
            status: None,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyCode) {
        match self.view_mode {
            ViewMode::Help => {
                // Any key closes help
                self.view_mode = ViewMode::Timeline;
            }
            ViewMode::Timeline => match key {
                KeyCode::Char('q' | 'Q') => self.should_quit = true,
                KeyCode::Char('?') => self.view_mode = ViewMode::Help,
                KeyCode::Esc => {
                    self.app.key(Key::Escape);
                }
                KeyCode::Enter => {
                    if !self.app.key(Key::Enter) {
                        // Nothing to close: open the detail under the cursor
                        if let Some((x, y)) = self.cursor {
                            let pointer = self.canvas_pointer(x, y);
                            let outcome = self.app.click(pointer);
                            self.report_click(outcome);
                        }
                    }
                }
                KeyCode::Char('w' | 'W') => self.window_key(Key::ZoomIn),
                KeyCode::Char('s' | 'S') => self.window_key(Key::ZoomOut),
                KeyCode::Char('a' | 'A') => self.window_key(Key::PanLeft),
                KeyCode::Char('d' | 'D') => self.window_key(Key::PanRight),
                KeyCode::Left => self.move_cursor(-1, 0),
                KeyCode::Right => self.move_cursor(1, 0),
                KeyCode::Up => self.move_cursor(0, -1),
                KeyCode::Down => self.move_cursor(0, 1),
                KeyCode::PageUp => self.scroll_by(-SCROLL_STEP),
                KeyCode::PageDown => self.scroll_by(SCROLL_STEP),
                KeyCode::Char('y' | 'Y') => {
                    self.status = Some(match self.yank() {
                        Ok(()) => "tooltip copied".to_string(),
                        Err(e) => e.to_string(),
                    });
                }
                _ => {}
            },
        }
    }

    fn window_key(&mut self, key: Key) {
        self.app.key(key);
        let (min, max) = self.app.window();
        self.status = Some(format!("window {} .. {}", format_ms(min), format_ms(max)));
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pointer = self.screen_pointer(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.app.pointer_moved(pointer);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let outcome = self.app.click(pointer);
                self.report_click(outcome);
            }
            MouseEventKind::ScrollDown => self.scroll_by(SCROLL_STEP),
            MouseEventKind::ScrollUp => self.scroll_by(-SCROLL_STEP),
            _ => {}
        }
    }

    fn report_click(&mut self, outcome: ClickOutcome) {
        match outcome {
            ClickOutcome::DetailOpened => {
                if let Some(view) = self.app.detail() {
                    self.status = Some(format!("CPU detail at {}", format_ms(view.center)));
                }
            }
            ClickOutcome::DetailClosed => self.status = None,
            ClickOutcome::Ignored => {}
        }
    }

    /// Pointer for a screen position; canvas coordinates may fall outside it
    fn screen_pointer(&self, column: u16, row: u16) -> Pointer {
        Pointer {
            x: f64::from(column) - f64::from(self.main_area.x),
            y: f64::from(row) - f64::from(self.main_area.y) + f64::from(self.scroll),
            client_x: f64::from(column),
            client_y: f64::from(row),
        }
    }

    /// Pointer for a canvas cell
    fn canvas_pointer(&self, x: u16, y: u16) -> Pointer {
        Pointer {
            x: f64::from(x),
            y: f64::from(y),
            client_x: f64::from(self.main_area.x + x),
            client_y: f64::from(self.main_area.y) + f64::from(y) - f64::from(self.scroll),
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let Some(layout) = self.app.overview() else {
            return;
        };
        let label = layout.params().label_width as i32;
        let (cx, cy) = self.cursor.unwrap_or_else(|| {
            (label as u16, layout.bands().first().map_or(0, |band| band.top as u16))
        });
        let max_x = (layout.width().ceil() as i32 - 1).max(label);
        let max_y = (layout.height().ceil() as i32 - 1).max(0);
        let x = (i32::from(cx) + dx).clamp(label, max_x) as u16;
        let y = (i32::from(cy) + dy).clamp(0, max_y) as u16;
        self.cursor = Some((x, y));

        // Keep the cursor row on screen
        let visible = self.main_area.height.max(1);
        if y < self.scroll {
            self.scroll = y;
        } else if y >= self.scroll + visible {
            self.scroll = y + 1 - visible;
        }

        let pointer = self.canvas_pointer(x, y);
        self.app.pointer_moved(pointer);
    }

    fn scroll_by(&mut self, rows: i32) {
        let content = self.app.overview().map_or(0, |layout| layout.height().ceil() as i32);
        let max = (content - i32::from(self.main_area.height)).max(0);
        self.scroll = (i32::from(self.scroll) + rows).clamp(0, max) as u16;
    }

    /// Copy the current tooltip text to the system clipboard
    fn yank(&self) -> Result<(), TuiError> {
        let tooltip = self
            .app
            .tooltip()
            .ok_or_else(|| TuiError::Clipboard("no tooltip to copy".to_string()))?;
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| TuiError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(tooltip.lines().join("\n"))
            .map_err(|e| TuiError::Clipboard(e.to_string()))
    }

    fn resize(&mut self, columns: u16) {
        debug!("Terminal resized to {columns} columns");
        self.app.set_config(ViewConfig::terminal(columns));
        self.cursor = None;
        self.scroll_by(0);
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render(&mut self, f: &mut Frame) {
        let outer_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Timeline canvas
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());
        self.main_area = outer_layout[1];

        self.render_header(f, outer_layout[0]);

        if let Some(layout) = self.app.overview() {
            let mut canvas = CellCanvas::for_layout(layout.width(), layout.height());
            layout.render(&mut canvas);
            f.render_widget(canvas.view(self.scroll), self.main_area);
        }

        if let Some((x, y)) = self.cursor {
            let column = self.main_area.x + x;
            if y >= self.scroll && column < self.main_area.right() {
                let row = self.main_area.y + (y - self.scroll);
                if row < self.main_area.bottom() {
                    if let Some(cell) = f.buffer_mut().cell_mut((column, row)) {
                        cell.set_style(Style::new().add_modifier(Modifier::REVERSED));
                    }
                }
            }
        }

        self.render_detail(f);
        self.render_tooltip(f);

        if self.view_mode == ViewMode::Help {
            render_help_overlay(f, self.main_area);
        }

        self.render_status(f, outer_layout[2]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let (min, max) = self.app.window();
        let mut spans = vec![Span::styled("ARCSCOPE", STYLE_HEADING)];
        if let Some(model) = self.app.model() {
            spans.extend([
                Span::styled(" | ", STYLE_DIM),
                Span::styled(format_ms(model.duration), Style::new().fg(HUD_GREEN)),
                Span::styled(" | ", STYLE_DIM),
                Span::styled(format!("{} cpus", model.system.cpu.len()), Style::new().fg(HUD_GREEN)),
                Span::styled(" | ", STYLE_DIM),
                Span::styled(format!("{} views", model.views.len()), Style::new().fg(HUD_GREEN)),
            ]);
        }
        spans.extend([
            Span::styled(" | ", STYLE_DIM),
            Span::styled(
                format!("{} .. {}", format_ms(min), format_ms(max)),
                Style::new().fg(CAUTION_AMBER),
            ),
        ]);
        let header = Paragraph::new(vec![Line::from(spans)])
            .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(HUD_GREEN)));
        f.render_widget(header, area);
    }

    /// CPU detail overlay, covering the canvas
    fn render_detail(&mut self, f: &mut Frame) {
        let Some(view) = self.app.detail() else {
            return;
        };
        let window = view.layout().params().max_timestamp - view.layout().params().min_timestamp;
        let busiest = view
            .processes
            .first()
            .map_or(0.0, |p| p.total as f64 * 100.0 / window.max(1) as f64);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(vec![
                Span::styled(format!(" CPU detail at {} ", format_ms(view.center)), STYLE_HEADING),
                Span::styled(format!("top {busiest:.1}% "), Style::new().fg(severity_color(busiest))),
            ]))
            .style(Style::new().bg(BACKGROUND).fg(HUD_GREEN));
        let inner = block.inner(self.main_area);

        let mut canvas = CellCanvas::for_layout(view.layout().width(), view.layout().height());
        view.layout().render(&mut canvas);

        f.render_widget(Clear, self.main_area);
        f.render_widget(block, self.main_area);
        f.render_widget(canvas.view(0), inner);

        let overlay = Area {
            x: f64::from(inner.x - self.main_area.x),
            y: f64::from(inner.y - self.main_area.y) + f64::from(self.scroll),
            width: f64::from(inner.width),
            height: f64::from(inner.height),
        };
        self.app.set_overlay_area(overlay);
    }

    /// Tooltip box next to the pointer, kept inside the frame
    fn render_tooltip(&self, f: &mut Frame) {
        let Some(tooltip) = self.app.tooltip() else {
            return;
        };
        let lines = tooltip.lines();
        let frame = f.area();
        let width = (lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2).min(frame.width);
        let height = (lines.len() as u16 + 2).min(frame.height);

        let x = (tooltip.client_x as u16 + 2).min(frame.right().saturating_sub(width));
        let y = (tooltip.client_y as u16 + 1).min(frame.bottom().saturating_sub(height));
        let area = Rect::new(x, y, width, height);

        let text: Vec<Line> = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    Line::from(Span::styled(line, STYLE_LABEL))
                } else {
                    Line::from(Span::styled(line, STYLE_TEXT))
                }
            })
            .collect();
        let widget = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::new().bg(ratatui::style::Color::Black).fg(HUD_GREEN)),
        );
        f.render_widget(Clear, area);
        f.render_widget(widget, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let mode = if self.app.detail().is_some() {
            Span::styled("[Detail]", STYLE_KEY)
        } else {
            Span::styled("[Ready]", Style::new().fg(HUD_GREEN))
        };
        let mut spans = vec![
            Span::styled("Q", STYLE_KEY),
            Span::styled(":Quit ", STYLE_DIM),
            Span::styled("W/S", STYLE_KEY),
            Span::styled(":Zoom ", STYLE_DIM),
            Span::styled("A/D", STYLE_KEY),
            Span::styled(":Pan ", STYLE_DIM),
            Span::styled("Y", STYLE_KEY),
            Span::styled(":Yank ", STYLE_DIM),
            Span::styled("?", STYLE_KEY),
            Span::styled(":Help ", STYLE_DIM),
            mode,
        ];
        if let Some(status) = &self.status {
            spans.push(Span::styled(format!(" {status}"), STYLE_DIM));
        }
        let status = Paragraph::new(vec![Line::from(spans)])
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(HUD_GREEN)));
        f.render_widget(status, area);
    }

    /// Run the TUI event loop
    ///
    /// # Errors
    /// Returns an error if terminal setup or rendering fails
    pub fn run(mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key.code),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(columns, _) => self.resize(columns),
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }
        }

        // Cleanup terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        Ok(())
    }
}

/// Open the viewer on `model`, optionally with the CPU detail already open.
///
/// # Errors
/// Returns an error if the terminal size can't be read or the UI fails.
pub fn run(model: TraceModel, detail_at: Option<Micros>) -> Result<()> {
    let (columns, _) = terminal::size().map_err(|e| TuiError::TerminalError(e.to_string()))?;
    let mut viewer = Viewer::new(model, columns);
    if let Some(timestamp) = detail_at {
        viewer.app.open_detail(timestamp, None);
    }
    viewer.run()
}

// =============================================================================
// OVERLAY RENDERERS
// =============================================================================

/// Render the help overlay explaining the bands and keyboard shortcuts
fn render_help_overlay(f: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 80, 22);

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  What You're Looking At", STYLE_HEADING)),
        Line::from(Span::styled(
            "  Each band is one buffer or CPU core. A colored span is a pipeline",
            STYLE_DIM,
        )),
        Line::from(Span::styled(
            "  stage in progress; blank means the sequence ended or the core idles.",
            STYLE_DIM,
        )),
        Line::from(""),
        Line::from(Span::styled("  How to Read It", STYLE_HEADING)),
        Line::from(vec![
            Span::styled("  CPU       ", STYLE_LABEL),
            Span::styled("Core activity. Click to see which threads ran.", STYLE_DIM),
        ]),
        Line::from(vec![
            Span::styled("  Charts    ", STYLE_LABEL),
            Span::styled("Memory, swap, GEM, frequency, temperature, power.", STYLE_DIM),
        ]),
        Line::from(vec![
            Span::styled("  Marks     ", STYLE_LABEL),
            Span::styled("Vertical lines: vsync, jank (●) and custom events.", STYLE_DIM),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        Line::from(vec![
            Span::styled("  ←→↑↓", STYLE_KEY),
            Span::styled(" Cursor   ", STYLE_TEXT),
            Span::styled("Enter", STYLE_KEY),
            Span::styled(" Detail/close   ", STYLE_TEXT),
            Span::styled("Esc", STYLE_KEY),
            Span::styled(" Close", STYLE_TEXT),
        ]),
        Line::from(vec![
            Span::styled("  W/S", STYLE_KEY),
            Span::styled(" Zoom   ", STYLE_TEXT),
            Span::styled("A/D", STYLE_KEY),
            Span::styled(" Pan   ", STYLE_TEXT),
            Span::styled("PgUp/PgDn", STYLE_KEY),
            Span::styled(" Scroll   ", STYLE_TEXT),
            Span::styled("Y", STYLE_KEY),
            Span::styled(" Copy tooltip   ", STYLE_TEXT),
            Span::styled("Q", STYLE_KEY),
            Span::styled(" Quit", STYLE_TEXT),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(ratatui::style::Color::Black).fg(HUD_GREEN)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
