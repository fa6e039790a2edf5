use crate::form::{Field, Step};
use crate::orchestrator::{Session, SessionEvent, Ticket};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use std::time::Instant;

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum Action {
    None,
    Submit(Ticket),
    CopyResult(String),
    Quit,
}

/// UI-thread state. The session is owned here; the controller only sees tickets.
pub struct UiState {
    pub session: Session,
    pub selected: usize,
    pub show_help: bool,
    pub info: String,
    pub submitted_at: Option<Instant>,
    pub predict_url: String,
}

impl UiState {
    pub fn new(session: Session, predict_url: String) -> Self {
        Self {
            session,
            selected: 0,
            show_help: false,
            info: "Adjust the policy and press Enter to predict".into(),
            submitted_at: None,
            predict_url,
        }
    }

    pub fn selected_field(&self) -> Field {
        Field::ALL[self.selected.min(Field::ALL.len() - 1)]
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        match (modifiers, code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                return Action::Quit
            }
            (_, KeyCode::Char('?')) => self.show_help = !self.show_help,
            (_, KeyCode::Esc) => self.show_help = false,
            (_, KeyCode::Up) | (_, KeyCode::Char('k')) => {
                self.selected = self.selected.saturating_sub(1);
            }
            (_, KeyCode::Down) | (_, KeyCode::Char('j')) => {
                self.selected = (self.selected + 1).min(Field::ALL.len() - 1);
            }
            (_, KeyCode::Left) | (_, KeyCode::Char('h')) => self.step(Step::Down),
            (_, KeyCode::Right) | (_, KeyCode::Char('l')) => self.step(Step::Up),
            (_, KeyCode::Char('d')) => {
                self.session.form_mut().reset();
                self.info = "Form reset to defaults".into();
            }
            (_, KeyCode::Enter) | (_, KeyCode::Char(' ')) => return self.submit(),
            (_, KeyCode::Char('y')) => match self.result_json() {
                Some(json) => return Action::CopyResult(json),
                None => self.info = "No prediction to copy yet".into(),
            },
            _ => {}
        }
        Action::None
    }

    fn step(&mut self, step: Step) {
        let field = self.selected_field();
        self.session.form_mut().step_field(field, step);
        self.info = format!(
            "{}: {}",
            field.label(),
            self.session.form().display_value(field)
        );
    }

    pub fn submit(&mut self) -> Action {
        match self.session.begin_submit() {
            Some(ticket) => {
                self.submitted_at = Some(Instant::now());
                self.info = format!("Analyzing policy (request #{})", ticket.seq);
                Action::Submit(ticket)
            }
            None => {
                self.info = "A prediction is already in progress".into();
                Action::None
            }
        }
    }

    pub fn apply_event(&mut self, ev: SessionEvent) {
        match ev {
            SessionEvent::Settled(outcome) => {
                let seq = outcome.seq;
                if !self.session.settle(*outcome) {
                    return;
                }
                self.submitted_at = None;
                self.info = match self.session.error() {
                    Some(msg) => format!("Request #{seq} failed: {msg}"),
                    None => format!("Request #{seq} complete"),
                };
            }
        }
    }

    /// Last prediction with the form that produced it, pretty-printed.
    pub fn result_json(&self) -> Option<String> {
        let result = self.session.result()?;
        let value = serde_json::json!({
            "form": self.session.submitted_form()?,
            "result": result,
            "classification": self.session.classification(),
        });
        serde_json::to_string_pretty(&value).ok()
    }

    /// Seconds since the in-flight submission started.
    pub fn elapsed_secs(&self) -> u64 {
        self.submitted_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }
}

/// Push `label: value`, wrapping the value to the panel width.
pub fn push_wrapped_kv(out: &mut Vec<Line<'static>>, label: &str, value: &str, area_width: u16) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Borders take 2 chars on each side.
    let usable_width = area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let words: Vec<&str> = value.split_whitespace().collect();
    let mut current = String::new();
    let mut first = true;
    let flush = |out: &mut Vec<Line<'static>>, text: String, first: bool| {
        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(text),
            ]));
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(text)]));
        }
    };

    for word in words {
        let limit = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        } as usize;
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > limit && !current.is_empty() {
            flush(out, std::mem::take(&mut current), first);
            first = false;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        flush(out, current, first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lifecycle, ResubmitPolicy};
    use crate::orchestrator::{Failure, Outcome};
    use std::time::Duration;

    fn state() -> UiState {
        UiState::new(Session::new(ResubmitPolicy::Ignore), "http://x/predict".into())
    }

    fn press(s: &mut UiState, code: KeyCode) -> Action {
        s.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_select_and_step_fields() {
        let mut s = state();
        assert_eq!(s.selected_field(), Field::PolicyTenure);
        press(&mut s, KeyCode::Right);
        assert_eq!(s.session.form().state().policy_tenure, 4);
        press(&mut s, KeyCode::Up);
        assert_eq!(s.selected, 0);
        for _ in 0..20 {
            press(&mut s, KeyCode::Down);
        }
        assert_eq!(s.selected_field(), Field::PopulationDensity);
        press(&mut s, KeyCode::Left);
        assert_eq!(s.session.form().state().population_density, 150);
    }

    #[test]
    fn defaults_key_restores_the_form() {
        let mut s = state();
        press(&mut s, KeyCode::Right);
        press(&mut s, KeyCode::Char('d'));
        assert_eq!(s.session.form().state(), &crate::model::FormState::default());
    }

    #[test]
    fn submit_issues_one_ticket_until_settled() {
        let mut s = state();
        let Action::Submit(ticket) = press(&mut s, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        assert!(matches!(press(&mut s, KeyCode::Char(' ')), Action::None));
        assert_eq!(s.session.lifecycle(), &Lifecycle::Submitting);

        s.apply_event(SessionEvent::Settled(Box::new(Outcome {
            seq: ticket.seq,
            result: Err(Failure::Transport),
            network_elapsed: Duration::ZERO,
            total_elapsed: Duration::from_secs(5),
        })));
        assert!(s.submitted_at.is_none());
        assert!(s.info.contains("Failed to get prediction from the model"));
        assert!(matches!(press(&mut s, KeyCode::Char('y')), Action::None));
    }

    #[test]
    fn copied_json_uses_the_submitted_form() {
        let mut s = state();
        let Action::Submit(ticket) = press(&mut s, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        s.apply_event(SessionEvent::Settled(Box::new(Outcome {
            seq: ticket.seq,
            result: Ok(crate::orchestrator::testing::prediction(0.82)),
            network_elapsed: Duration::from_millis(120),
            total_elapsed: Duration::from_secs(5),
        })));
        press(&mut s, KeyCode::Right);
        assert_eq!(s.session.form().state().policy_tenure, 4);

        let Action::CopyResult(json) = press(&mut s, KeyCode::Char('y')) else {
            panic!("expected a result to copy");
        };
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["form"]["policy_tenure"], 3);
        assert_eq!(v["result"]["claim_probability"], 0.82);
        assert_eq!(v["classification"]["risk_band"], "High");
    }

    #[test]
    fn quit_and_help_keys() {
        let mut s = state();
        press(&mut s, KeyCode::Char('?'));
        assert!(s.show_help);
        press(&mut s, KeyCode::Esc);
        assert!(!s.show_help);
        assert!(matches!(
            s.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit
        ));
    }

    #[test]
    fn wrapped_values_break_on_words() {
        let mut out = Vec::new();
        push_wrapped_kv(&mut out, "Note", "one two three four five six", 20);
        assert!(out.len() > 1);
        let text: Vec<String> = out
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text[0].starts_with("Note: one"));
    }
}
