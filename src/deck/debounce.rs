/// Trailing debounce for the search box
///
/// The host schedules a timer for every ticket it gets back from `input`
/// and hands the ticket back when the timer fires. Only the latest ticket
/// settles; older timers are ignored, which is what restarts the quiet
/// period on every keystroke.

use std::time::Duration;

use super::filter::normalize_search;

/// Handle for one scheduled quiet-period timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    pub generation: u64,
    pub after: Duration,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: u64,
    /// Text as typed, echoed immediately in the input box
    typed: String,
    /// Text the filter engine last ran with
    settled: String,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: 0,
            typed: String::new(),
            settled: String::new(),
        }
    }

    /// Record a keystroke and return the ticket for its quiet-period timer
    pub fn input(&mut self, text: impl Into<String>) -> DebounceTicket {
        self.typed = text.into();
        self.generation += 1;
        DebounceTicket {
            generation: self.generation,
            after: self.quiet,
        }
    }

    /// Timer fired. Returns the settled text if no newer keystroke arrived
    /// and the search term changed since the last settle. Case and
    /// surrounding whitespace do not count as a change.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<&str> {
        if ticket.generation != self.generation {
            return None;
        }
        let changed = normalize_search(&self.typed) != normalize_search(&self.settled);
        self.settled = self.typed.clone();
        changed.then_some(self.settled.as_str())
    }

    /// Clear both values immediately, invalidating pending timers
    pub fn clear(&mut self) {
        self.generation += 1;
        self.typed.clear();
        self.settled.clear();
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn settled(&self) -> &str {
        &self.settled
    }
}
