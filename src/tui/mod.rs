mod help;
mod state;

use crate::classify::{self, Band, Classification, Tone};
use crate::engine::ScoringClient;
use crate::form::Field;
use crate::model::{Lifecycle, PredictionResult, RunConfig};
use crate::orchestrator::{self, Orchestrator, Session, SessionEvent, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use state::{push_wrapped_kv, Action, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const BAR_WIDTH: usize = 16;

pub async fn run(cfg: RunConfig, session: Session, submit_on_launch: bool) -> Result<()> {
    let client = ScoringClient::new(&cfg)?;
    let predict_url = client.predict_url().to_string();
    let orchestrator = Orchestrator::new(Arc::new(client), &cfg);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // The TUI runs on its own thread so terminal I/O never blocks the runtime.
    let state = UiState::new(session, predict_url);
    let ui_handle =
        std::thread::spawn(move || run_threaded(state, submit_on_launch, event_rx, cmd_tx));

    let res = orchestrator::run_controller(orchestrator, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    submit_on_launch: bool,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    // Restores the terminal on every return path, including errors below.
    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    if submit_on_launch {
        if let Action::Submit(ticket) = state.submit() {
            let _ = cmd_tx.send(UiCommand::Submit(ticket));
        }
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
            dirty = true;
        }

        // Redraw on ticks while submitting so the elapsed counter moves.
        if dirty || (state.session.is_submitting() && last_tick.elapsed() >= tick_rate) {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                    dirty = true;
                    match state.handle_key(k.code, k.modifiers) {
                        Action::None => {}
                        Action::Submit(ticket) => {
                            if cmd_tx.send(UiCommand::Submit(ticket)).is_err() {
                                break Err(anyhow::anyhow!("prediction controller stopped"));
                            }
                        }
                        Action::CopyResult(json) => {
                            state.info = match copy_to_clipboard(&json) {
                                Ok(()) => "✓ Copied result JSON to clipboard".into(),
                                Err(e) => format!("Clipboard copy failed: {e:#}"),
                            };
                        }
                        Action::Quit => {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break Ok(());
                        }
                    }
                }
                Ok(Event::Resize(..)) => dirty = true,
                _ => {}
            }
        }
    }
}

/// Raw mode plus alternate screen, undone on drop.
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let guard = Self {
            restore: restore_terminal,
        };
        execute!(io::stdout(), EnterAlternateScreen).ok();
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen).ok();
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Green,
        Tone::Caution => Color::Yellow,
        Tone::Danger => Color::Red,
        Tone::Neutral => Color::Gray,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[0]);

    draw_form(body[0], f, state);
    draw_result(body[1], f, state);
    draw_status(chunks[1], f, state);

    if state.show_help {
        help::draw_help(centered(area, 70, 18), f);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

/// Color of a field's slider, by its own banding rule.
fn field_tone(field: Field, value: u32) -> Tone {
    match field {
        Field::PopulationDensity => classify::density_band(value).tone(),
        Field::NcapRating => classify::ncap_band(value.min(u32::from(u8::MAX)) as u8).tone(),
        _ => match field.bounds() {
            Some(b) => classify::slider_band(value, b.min, b.max).tone(),
            None => Tone::Neutral,
        },
    }
}

fn slider_bar(value: u32, min: u32, max: u32) -> String {
    let span = max.saturating_sub(min).max(1) as f64;
    let ratio = (f64::from(value.saturating_sub(min)) / span).clamp(0.0, 1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let form = state.session.form();
    let mut lines: Vec<Line> = Vec::with_capacity(Field::ALL.len() + 3);

    for (i, field) in Field::ALL.into_iter().enumerate() {
        let selected = i == state.selected;
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![
            Span::styled(if selected { "▸ " } else { "  " }, label_style),
            Span::styled(format!("{:<20}", field.label()), label_style),
        ];
        let value = form.display_value(field);
        match (field.bounds(), form.numeric_value(field)) {
            (Some(b), Some(v)) => {
                let color = tone_color(field_tone(field, v));
                spans.push(Span::raw(format!("{value:<18}")));
                spans.push(Span::styled(slider_bar(v, b.min, b.max), Style::default().fg(color)));
            }
            _ => spans.push(Span::raw(format!("‹ {value} ›"))),
        }
        lines.push(Line::from(spans));
    }

    let field = state.selected_field();
    lines.push(Line::from(""));
    let range = match field.bounds() {
        Some(b) => format!("{}..{} (step {})", b.min, b.max, b.step),
        None => field.domain(),
    };
    push_wrapped_kv(&mut lines, "Allowed", &range, area.width);

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Policy Parameters"),
    );
    f.render_widget(p, area);
}

fn draw_result(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Risk Assessment");
    let inner = block.inner(area);
    f.render_widget(block, area);

    match (state.session.lifecycle(), state.session.result()) {
        (Lifecycle::Succeeded, Some(result)) => draw_prediction(inner, f, state, result),
        (Lifecycle::Submitting, _) => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Analyzing policy…",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Elapsed: {}s", state.elapsed_secs())),
            ];
            f.render_widget(Paragraph::new(lines), inner);
        }
        (Lifecycle::Failed(msg), _) => {
            let p = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Error",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(msg.clone()),
                Line::from(""),
                Line::from("Press Enter to try again."),
            ])
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
            f.render_widget(p, inner);
        }
        _ => {
            let p = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Ready to Predict",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from("Adjust the policy parameters and press Enter to assess claim risk."),
            ])
            .wrap(Wrap { trim: true });
            f.render_widget(p, inner);
        }
    }
}

fn draw_prediction(area: Rect, f: &mut ratatui::Frame, state: &UiState, r: &PredictionResult) {
    let c = Classification::from_result(r);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Claim Probability ({} Risk)",
            c.risk_band.as_str()
        )))
        .gauge_style(Style::default().fg(tone_color(c.risk_tone)))
        .ratio(gauge_ratio(r.claim_probability))
        .label(c.probability_pct.clone());
    f.render_widget(gauge, rows[0]);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("Threshold: ", Style::default().fg(Color::Gray)),
        Span::raw(c.threshold_pct.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Model risk level: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} {}", c.risk_level_icon.glyph(), r.risk_level.as_str()),
            Style::default().fg(tone_color(c.risk_level_tone)),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Decision: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} {}", c.decision_icon.glyph(), c.decision_label),
            Style::default()
                .fg(tone_color(c.decision_tone))
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    push_wrapped_kv(
        &mut lines,
        "Why",
        &format!(
            "Risk threshold set at {} to prioritize identifying high-risk policies.",
            c.threshold_pct
        ),
        area.width + 4,
    );

    if !r.top_risk_drivers.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Top risk drivers",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, driver) in r.top_risk_drivers.iter().enumerate() {
            lines.push(Line::from(format!("  {}. {}", i + 1, driver)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Key insights",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::raw("  Model says "),
        Span::styled(c.decision_short, Style::default().fg(tone_color(c.decision_tone))),
        Span::raw(format!(" at a {} cutoff", c.threshold_pct)),
    ]));
    if c.risk_band == Band::High {
        lines.push(Line::from("  Probability is in the high band; review before quoting."));
    }
    if let Some(t) = state.session.timing() {
        lines.push(Line::from(Span::styled(
            format!(
                "  Model answered in {} ms",
                t.network.as_millis()
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines), rows[1]);
}

/// Gauge ratio must lie in `[0, 1]`; NaN renders as a full bar.
fn gauge_ratio(p: f64) -> f64 {
    if p.is_nan() {
        1.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = Line::from(vec![
        Span::raw(state.info.clone()),
        Span::styled(
            format!("   {} · ? help", state.predict_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

// Clipboard access is serialized through one thread that keeps each
// clipboard instance alive long enough for Linux clipboard managers.
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;

static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

fn clipboard_sender() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(&text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(Duration::from_secs(2));
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });
        tx
    })
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_sender()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard thread stopped"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_bar_fills_proportionally() {
        assert_eq!(slider_bar(1, 1, 15), "░".repeat(BAR_WIDTH));
        assert_eq!(slider_bar(15, 1, 15), "█".repeat(BAR_WIDTH));
        assert_eq!(slider_bar(5050, 100, 10_000).chars().filter(|c| *c == '█').count(), 8);
    }

    #[test]
    fn field_tones_follow_their_banding() {
        assert_eq!(field_tone(Field::PopulationDensity, 200), Tone::Positive);
        assert_eq!(field_tone(Field::PopulationDensity, 800), Tone::Danger);
        assert_eq!(field_tone(Field::NcapRating, 3), Tone::Caution);
        assert_eq!(field_tone(Field::NcapRating, 1), Tone::Danger);
        assert_eq!(field_tone(Field::AgeOfCar, 20), Tone::Danger);
        assert_eq!(field_tone(Field::Segment, 0), Tone::Neutral);
    }

    #[test]
    fn terminal_guard_restores_on_early_error() {
        use std::sync::atomic::{AtomicBool, Ordering};
        static RESTORED: AtomicBool = AtomicBool::new(false);

        fn setup() -> Result<()> {
            let _guard = TerminalGuard {
                restore: || RESTORED.store(true, Ordering::SeqCst),
            };
            let () = Err(anyhow::anyhow!("create terminal"))?;
            Ok(())
        }

        assert!(setup().is_err());
        assert!(RESTORED.load(Ordering::SeqCst));
    }

    #[test]
    fn gauge_ratio_stays_in_range() {
        assert_eq!(gauge_ratio(0.82), 0.82);
        assert_eq!(gauge_ratio(1.5), 1.0);
        assert_eq!(gauge_ratio(f64::NAN), 1.0);
    }
}
