//! Interactive selection state machine.
//!
//! A [`Selector`] owns the full candidate list for one session plus the
//! query, the filtered view, the cursor and the scroll window. Every
//! query or pin mutation rebuilds the filtered view from scratch; the
//! rebuild is cheap for realistic context counts and keeps ordering
//! rules in one place.

use crate::error::ConfigError;
use crate::matcher::fuzzy_score;
use std::collections::BTreeMap;
use std::collections::HashSet;
use tracing::warn;

/// Rows occupied by the header, search bar and footer around the list.
const FIXED_CHROME_ROWS: usize = 10;
/// Smallest list window we will scroll within.
const MIN_VIEWPORT_ROWS: usize = 3;
/// Cursor jump for PageUp / PageDown.
const PAGE_JUMP: usize = 10;

/// How the interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user chose a context.
    Committed(String),
    /// The user backed out without choosing.
    Cancelled,
}

/// Pre-filter applied to the candidate set before any scoring. Scores
/// and ranks are computed only among eligible candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Restriction {
    #[default]
    All,
    PinnedOnly,
    Group(HashSet<String>),
}

/// Write-through target for pin changes. A failing sink is logged and
/// otherwise ignored; the in-memory pin set stays authoritative for the
/// rest of the session.
pub trait PinSink {
    fn save_pins(&mut self, pins: &[String]) -> Result<(), ConfigError>;
}

/// Inputs for one interactive session. Candidates and annotations are
/// loaded by the caller before the session starts and are fixed for its
/// lifetime (pins being the one exception).
#[derive(Debug, Clone, Default)]
pub struct SelectorParams {
    pub contexts: Vec<String>,
    /// Name of the currently active context, empty when unknown.
    pub current: String,
    /// Pinned context names, in pin order.
    pub pins: Vec<String>,
    /// alias -> context; aliases widen the searchable text of their
    /// target so typing an alias finds the context.
    pub aliases: BTreeMap<String, String>,
    pub restriction: Restriction,
    /// Total terminal rows available at startup.
    pub terminal_rows: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    search_text: String,
}

#[derive(Debug)]
pub struct Selector {
    candidates: Vec<Candidate>,
    query: String,
    filtered: Vec<usize>,
    cursor: usize,
    scroll_offset: usize,
    viewport: usize,
    pins: Vec<String>,
    restriction: Restriction,
    current: String,
}

impl Selector {
    pub fn new(params: SelectorParams) -> Self {
        let SelectorParams {
            contexts,
            current,
            pins,
            aliases,
            restriction,
            terminal_rows,
        } = params;

        let candidates = contexts
            .into_iter()
            .map(|name| {
                let mut search_text = name.clone();
                for (alias, target) in &aliases {
                    if *target == name {
                        search_text.push(' ');
                        search_text.push_str(alias);
                    }
                }
                Candidate { name, search_text }
            })
            .collect();

        let mut selector = Self {
            candidates,
            query: String::new(),
            filtered: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            viewport: viewport_rows(terminal_rows),
            pins,
            restriction,
            current,
        };
        selector.rebuild();
        let start = selector.position_of(&selector.current);
        if let Some(pos) = start {
            selector.cursor = pos;
        }
        selector.ensure_visible();
        selector
    }

    /// Appends typed input to the query and refilters from the top.
    pub fn insert(&mut self, input: &str) {
        if input.is_empty() {
            return;
        }
        self.query.push_str(input);
        self.cursor = 0;
        self.scroll_offset = 0;
        self.rebuild();
    }

    /// Removes the last query character. No-op on an empty query. An
    /// emptied query reverts to the unfiltered pinned-first ordering.
    pub fn backspace(&mut self) {
        if self.query.pop().is_none() {
            return;
        }
        self.rebuild();
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.ensure_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.filtered.len() {
            self.cursor += 1;
            self.ensure_visible();
        }
    }

    pub fn move_top(&mut self) {
        self.cursor = 0;
        self.ensure_visible();
    }

    pub fn move_bottom(&mut self) {
        self.cursor = self.filtered.len().saturating_sub(1);
        self.ensure_visible();
    }

    pub fn page_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(PAGE_JUMP);
        self.ensure_visible();
    }

    pub fn page_down(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = (self.cursor + PAGE_JUMP).min(self.filtered.len() - 1);
        self.ensure_visible();
    }

    /// Toggles the pin on the highlighted candidate, writes the pin set
    /// through `sink` best-effort and keeps the cursor on the same
    /// candidate across the reorder.
    pub fn toggle_pin(&mut self, sink: &mut dyn PinSink) {
        let Some(name) = self.highlighted().map(str::to_string) else {
            return;
        };
        if let Some(pos) = self.pins.iter().position(|pin| *pin == name) {
            self.pins.remove(pos);
        } else {
            self.pins.push(name.clone());
        }
        if let Err(err) = sink.save_pins(&self.pins) {
            warn!("failed to persist pins: {err}");
        }
        self.rebuild();
        if let Some(pos) = self.position_of(&name) {
            self.cursor = pos;
        }
        self.ensure_visible();
    }

    /// Moves the cursor to the first pinned candidate in the filtered
    /// view, if any.
    pub fn jump_to_pinned(&mut self) {
        let pos = self
            .filtered
            .iter()
            .position(|&idx| self.pinned(&self.candidates[idx].name));
        if let Some(pos) = pos {
            self.cursor = pos;
            self.ensure_visible();
        }
    }

    /// Flips between the unrestricted view and a pinned-only view,
    /// clearing the query either way.
    pub fn toggle_pinned_only(&mut self) {
        self.query.clear();
        self.restriction = if self.restriction == Restriction::PinnedOnly {
            Restriction::All
        } else {
            Restriction::PinnedOnly
        };
        self.cursor = 0;
        self.scroll_offset = 0;
        self.rebuild();
    }

    /// Commits the highlighted candidate. No-op on an empty view.
    pub fn commit(&self) -> Option<Outcome> {
        self.highlighted()
            .map(|name| Outcome::Committed(name.to_string()))
    }

    /// A non-empty query is cleared (soft cancel); an empty query ends
    /// the session.
    pub fn cancel(&mut self) -> Option<Outcome> {
        if self.query.is_empty() {
            return Some(Outcome::Cancelled);
        }
        self.query.clear();
        self.cursor = 0;
        self.scroll_offset = 0;
        self.rebuild();
        None
    }

    /// Unconditional quit.
    pub fn abort(&self) -> Outcome {
        Outcome::Cancelled
    }

    /// Adjusts the scroll window to a new terminal height. Cursor and
    /// filtered view are untouched.
    pub fn resize(&mut self, terminal_rows: usize) {
        self.viewport = viewport_rows(terminal_rows);
        self.ensure_visible();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Number of candidates in the filtered view.
    pub fn matched(&self) -> usize {
        self.filtered.len()
    }

    /// Total number of candidates in the session.
    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn pinned(&self, name: &str) -> bool {
        self.pins.iter().any(|pin| pin == name)
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.filtered
            .get(self.cursor)
            .map(|&idx| self.candidates[idx].name.as_str())
    }

    /// Candidate names in filtered-view order.
    pub fn filtered_names(&self) -> impl Iterator<Item = &str> {
        self.filtered
            .iter()
            .map(|&idx| self.candidates[idx].name.as_str())
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.filtered
            .iter()
            .position(|&idx| self.candidates[idx].name == name)
    }

    fn eligible(&self, name: &str) -> bool {
        match &self.restriction {
            Restriction::All => true,
            Restriction::PinnedOnly => self.pinned(name),
            Restriction::Group(members) => members.contains(name),
        }
    }

    /// Rebuilds the filtered view wholesale: restriction pre-filter,
    /// score, drop zeros, stable sort by score descending, then pinned
    /// candidates first in pin-list order. The stable sort keeps
    /// collaborator order for equal scores, which also preserves the
    /// original order under an empty query.
    fn rebuild(&mut self) {
        let mut scored: Vec<(usize, u32)> = Vec::new();
        for (idx, candidate) in self.candidates.iter().enumerate() {
            if !self.eligible(&candidate.name) {
                continue;
            }
            let score = fuzzy_score(&candidate.search_text, &self.query);
            if score > 0 {
                scored.push((idx, score));
            }
        }
        scored.sort_by_key(|&(_, score)| std::cmp::Reverse(score));

        let mut view = Vec::with_capacity(scored.len());
        let mut taken: HashSet<usize> = HashSet::new();
        for pin in &self.pins {
            let hit = scored
                .iter()
                .map(|&(idx, _)| idx)
                .find(|&idx| self.candidates[idx].name == *pin);
            if let Some(idx) = hit
                && taken.insert(idx)
            {
                view.push(idx);
            }
        }
        for &(idx, _) in &scored {
            if !taken.contains(&idx) {
                view.push(idx);
            }
        }

        self.filtered = view;
        if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len().saturating_sub(1);
        }
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + self.viewport {
            self.scroll_offset = self.cursor - self.viewport + 1;
        }
    }
}

fn viewport_rows(terminal_rows: usize) -> usize {
    terminal_rows
        .saturating_sub(FIXED_CHROME_ROWS)
        .max(MIN_VIEWPORT_ROWS)
}
