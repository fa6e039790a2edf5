use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(keys: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc.to_string()),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("↑/↓ or j/k", "Select field"),
        key_line("←/→ or h/l", "Change value"),
        key_line("Enter/space", "Predict claim risk"),
        key_line("d", "Restore default policy"),
        key_line("y", "Copy last result as JSON"),
        key_line("?", "Toggle this help"),
        key_line("q / Ctrl-C", "Quit"),
        Line::from(""),
        Line::from("Risk bands:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Low", Style::default().fg(Color::Green)),
            Span::raw(" < 40%  "),
            Span::styled("Medium", Style::default().fg(Color::Yellow)),
            Span::raw(" < 70%  "),
            Span::styled("High", Style::default().fg(Color::Red)),
            Span::raw(" otherwise"),
        ]),
        Line::from(""),
        Line::from("Population density: Low < 300, Medium < 700, High otherwise."),
        Line::from("NCAP rating: 4-5 stars favorable, 3 neutral, 1-2 unfavorable."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
