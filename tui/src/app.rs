use anyhow::Result;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ksw_core::Config;
use ksw_core::ConfigStore;
use ksw_core::Outcome;
use ksw_core::Restriction;
use ksw_core::Selector;
use ksw_core::SelectorParams;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use tracing::warn;

const SEPARATOR: &str = "  ─────────────────────────────────────────";
const KEY_HINTS: &str =
    "  ↑↓ move · enter switch · ctrl+p pin · ctrl+o pins only · esc clear · ctrl+c quit";

/// Inputs for one picker session, assembled by the CLI before the
/// terminal is touched.
#[derive(Debug, Clone)]
pub struct PickerParams {
    pub contexts: Vec<String>,
    pub current: String,
    pub config: Config,
    pub store: ConfigStore,
    pub restriction: Restriction,
}

pub(crate) struct App {
    selector: Selector,
    config: Config,
    store: ConfigStore,
}

impl App {
    pub(crate) fn new(params: PickerParams) -> Self {
        let PickerParams {
            contexts,
            current,
            config,
            store,
            restriction,
        } = params;
        let selector = Selector::new(SelectorParams {
            contexts,
            current,
            pins: config.pins.clone(),
            aliases: config.aliases.clone(),
            restriction,
            terminal_rows: 24,
        });
        Self {
            selector,
            config,
            store,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> Result<Outcome> {
        let rows = terminal.size()?.height as usize;
        self.selector.resize(rows);
        loop {
            terminal.draw(|frame| self.render(frame))?;
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(outcome) = self.handle_key(key) {
                        return Ok(outcome);
                    }
                }
                Event::Resize(_, rows) => self.selector.resize(rows as usize),
                _ => {}
            }
        }
    }

    /// Maps one key press onto a selector transition. Returns the
    /// session outcome when the press terminates the state machine.
    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return Some(self.selector.abort()),
                KeyCode::Char('p') => self.selector.toggle_pin(&mut self.store),
                KeyCode::Char('o') => self.selector.toggle_pinned_only(),
                KeyCode::Char('n') => self.toggle_short_names(),
                _ => {}
            }
            return None;
        }
        match key.code {
            KeyCode::Esc => return self.selector.cancel(),
            KeyCode::Enter => return self.selector.commit(),
            KeyCode::Up => self.selector.move_up(),
            KeyCode::Down => self.selector.move_down(),
            KeyCode::Home => self.selector.move_top(),
            KeyCode::End => self.selector.move_bottom(),
            KeyCode::PageUp => self.selector.page_up(),
            KeyCode::PageDown => self.selector.page_down(),
            KeyCode::Tab => self.selector.jump_to_pinned(),
            KeyCode::Backspace => self.selector.backspace(),
            KeyCode::Char(c) => self.selector.insert(&c.to_string()),
            _ => {}
        }
        None
    }

    fn toggle_short_names(&mut self) {
        self.config.short_names = !self.config.short_names;
        let short_names = self.config.short_names;
        if let Err(err) = self.store.update(|on_disk| on_disk.short_names = short_names) {
            warn!("failed to persist short-name preference: {err}");
        }
    }

    fn render(&self, frame: &mut Frame) {
        let mut lines: Vec<Line> = Vec::new();

        // Current context.
        let current = self.selector.current();
        let mut header = vec![
            Span::from("  current ").dim(),
            Span::from(self.config.display_name(current).to_string())
                .green()
                .bold(),
        ];
        if let Some(alias) = self.config.alias_for(current) {
            header.push(Span::from(format!(" @{alias}")).magenta().bold());
        }
        lines.push(Line::from(header));
        lines.push(Line::from(""));

        // Search bar.
        if self.selector.query().is_empty() {
            lines.push(Line::from(
                Span::from("  ❯ type to search...").dim().italic(),
            ));
        } else {
            lines.push(Line::from(
                Span::from(format!("  ❯ {}█", self.selector.query()))
                    .yellow()
                    .bold(),
            ));
        }
        lines.push(Line::from(Span::from(SEPARATOR).dim()));

        let matched = self.selector.matched();
        if matched == 0 {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::from("  No matching contexts").dim()));
        } else {
            let start = self.selector.scroll_offset();
            let end = (start + self.selector.viewport()).min(matched);

            if start > 0 {
                lines.push(Line::from(Span::from(format!("    ▲ {start} more")).dim()));
            }
            for (row, name) in self
                .selector
                .filtered_names()
                .enumerate()
                .skip(start)
                .take(end - start)
            {
                lines.push(self.render_row(row, name));
            }
            if end < matched {
                let below = matched - end;
                lines.push(Line::from(Span::from(format!("    ▼ {below} more")).dim()));
            }
        }

        // Footer.
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::from(format!("  {matched}/{}", self.selector.total())).dim(),
            Span::from(KEY_HINTS).dim(),
        ]));

        frame.render_widget(Paragraph::new(lines), frame.area());
    }

    fn render_row(&self, row: usize, name: &str) -> Line<'static> {
        let is_cursor = row == self.selector.cursor();
        let is_active = name == self.selector.current();
        let display = self.config.display_name(name).to_string();

        let mut spans = vec![Span::from(if is_cursor { " ❯ " } else { "   " })];
        spans.push(if is_cursor {
            Span::from(display).cyan().bold()
        } else if is_active {
            Span::from(display).green().bold()
        } else {
            Span::from(display).dim()
        });
        if let Some(alias) = self.config.alias_for(name) {
            spans.push(Span::from(format!(" @{alias}")).magenta());
        }
        if self.selector.pinned(name) {
            spans.push(Span::from(" ★").yellow());
        }
        if is_active {
            spans.push(Span::from(" ●").green());
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app(dir: &tempfile::TempDir, contexts: &[&str]) -> App {
        let store = ConfigStore::new(dir.path().join(".ksw.json"));
        App::new(PickerParams {
            contexts: contexts.iter().map(|c| c.to_string()).collect(),
            current: String::new(),
            config: Config::default(),
            store,
            restriction: Restriction::All,
        })
    }

    #[test]
    fn typing_filters_and_enter_commits() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(&dir, &["eks-payments-qa", "eks-orders-dev"]);
        for c in "payqa".chars() {
            assert_eq!(app.handle_key(key(KeyCode::Char(c))), None);
        }
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Outcome::Committed("eks-payments-qa".to_string()))
        );
    }

    #[test]
    fn escape_clears_the_filter_before_quitting() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(&dir, &["alpha", "beta"]);
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), None);
        assert_eq!(
            app.handle_key(key(KeyCode::Esc)),
            Some(Outcome::Cancelled)
        );
    }

    #[test]
    fn ctrl_c_aborts_even_with_a_live_query() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(&dir, &["alpha"]);
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.handle_key(ctrl('c')), Some(Outcome::Cancelled));
    }

    #[test]
    fn ctrl_p_persists_the_pin_through_the_store() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join(".ksw.json"));
        let mut app = App::new(PickerParams {
            contexts: vec!["alpha".into(), "beta".into()],
            current: String::new(),
            config: Config::default(),
            store: store.clone(),
            restriction: Restriction::All,
        });
        app.handle_key(key(KeyCode::Down));
        app.handle_key(ctrl('p'));
        let saved = store.load().expect("load");
        assert_eq!(saved.pins, vec!["beta".to_string()]);
    }

    #[test]
    fn ctrl_n_persists_the_short_name_preference() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join(".ksw.json"));
        let mut app = App::new(PickerParams {
            contexts: vec!["alpha".into()],
            current: String::new(),
            config: Config::default(),
            store: store.clone(),
            restriction: Restriction::All,
        });
        app.handle_key(ctrl('n'));
        assert!(store.load().expect("load").short_names);
        app.handle_key(ctrl('n'));
        assert!(!store.load().expect("load").short_names);
    }

    #[test]
    fn commit_on_an_empty_view_keeps_the_session_alive() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(&dir, &["alpha"]);
        app.handle_key(key(KeyCode::Char('z')));
        app.handle_key(key(KeyCode::Char('z')));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
    }
}
