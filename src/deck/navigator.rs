/// Carousel navigation coordinator
///
/// Owns the visible list and the active index into it. Every index move
/// holds the navigation lock for a fixed animation time; the host schedules
/// a timer for the returned `SettleTicket` and calls `settle` when it fires.
/// A filter transition (the list being swapped after its fade-out) holds
/// the lock too.
///
/// Requests that arrive while the lock is held are coalesced into a single
/// pending slot: the latest request replaces any earlier one and is replayed
/// once when the lock is released. A burst of input therefore yields at most
/// one extra move after the one in flight.

use std::time::Duration;

use tracing::debug;

use crate::state::data::{Template, TemplateId};

/// Narrow command set accepted by the deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckCommand {
    Prev,
    Next,
    /// A card was clicked (or Enter pressed on it)
    Activate(TemplateId),
}

/// Timer handle for the end of one index animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTicket {
    pub generation: u64,
    pub after: Duration,
}

/// Timer handle for the end of a filter fade-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTicket {
    pub generation: u64,
    pub after: Duration,
}

/// What the host must do after a deck call
#[derive(Debug, Clone, PartialEq)]
pub enum DeckOutcome {
    /// Nothing changed
    Ignored,
    /// Active index moved; schedule `settle` for the ticket
    Moved { active: usize, settle: SettleTicket },
    /// Lock held; request parked in the pending slot
    Deferred,
    /// The active card was activated: open its detail view
    OpenDetail(Template),
}

/// Read-only view of the deck for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckStatus {
    pub active: usize,
    pub len: usize,
    pub navigating: bool,
    pub filtering: bool,
    pub has_pending: bool,
}

#[derive(Debug)]
pub struct Deck {
    templates: Vec<Template>,
    active: usize,
    navigation_time: Duration,
    navigating: bool,
    filtering: bool,
    nav_generation: u64,
    filter_generation: u64,
    pending: Option<DeckCommand>,
}

impl Deck {
    pub fn new(navigation_time: Duration) -> Self {
        Self {
            templates: Vec::new(),
            active: 0,
            navigation_time,
            navigating: false,
            filtering: false,
            nav_generation: 0,
            filter_generation: 0,
            pending: None,
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_template(&self) -> Option<&Template> {
        self.templates.get(self.active)
    }

    pub fn is_locked(&self) -> bool {
        self.navigating || self.filtering
    }

    pub fn status(&self) -> DeckStatus {
        DeckStatus {
            active: self.active,
            len: self.templates.len(),
            navigating: self.navigating,
            filtering: self.filtering,
            has_pending: self.pending.is_some(),
        }
    }

    /// Visible-list position of a template id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.templates.iter().position(|t| t.id == id)
    }

    /// Handle a navigation request from keyboard, swipe, arrows or a click
    pub fn dispatch(&mut self, command: DeckCommand) -> DeckOutcome {
        if self.templates.is_empty() {
            return DeckOutcome::Ignored;
        }

        if self.is_locked() {
            debug!(?command, replaced = ?self.pending, "deck locked, deferring request");
            self.pending = Some(command);
            return DeckOutcome::Deferred;
        }

        self.execute(command)
    }

    /// Animation timer fired. Releases the lock and replays a pending request.
    pub fn settle(&mut self, ticket: SettleTicket) -> DeckOutcome {
        if !self.navigating || ticket.generation != self.nav_generation {
            return DeckOutcome::Ignored;
        }

        self.navigating = false;
        self.clamp_active();
        self.replay_pending()
    }

    /// The visible list is about to change: hold the lock while the
    /// outgoing cards fade. Starting a new transition supersedes any
    /// earlier one that has not finished.
    pub fn begin_filter(&mut self, fade: Duration) -> FilterTicket {
        self.filtering = true;
        self.filter_generation += 1;
        FilterTicket {
            generation: self.filter_generation,
            after: fade,
        }
    }

    /// Whether `ticket` belongs to the newest filter transition
    pub fn is_current_filter(&self, ticket: FilterTicket) -> bool {
        self.filtering && ticket.generation == self.filter_generation
    }

    /// Swap in a new visible list at the end of a filter transition.
    ///
    /// The active index resets to 0 unless a navigation is in flight, in
    /// which case it is only clamped into range. Stale tickets are ignored.
    pub fn replace_templates(&mut self, ticket: FilterTicket, templates: Vec<Template>) -> DeckOutcome {
        if !self.is_current_filter(ticket) {
            debug!(generation = ticket.generation, "dropping superseded filter result");
            return DeckOutcome::Ignored;
        }

        self.filtering = false;
        self.templates = templates;

        if !self.navigating && !self.templates.is_empty() {
            self.active = 0;
        } else {
            self.clamp_active();
        }

        if self.navigating {
            DeckOutcome::Ignored
        } else {
            self.replay_pending()
        }
    }

    fn execute(&mut self, command: DeckCommand) -> DeckOutcome {
        let len = self.templates.len();
        if len == 0 {
            return DeckOutcome::Ignored;
        }

        match command {
            DeckCommand::Prev => self.move_to((self.active + len - 1) % len),
            DeckCommand::Next => self.move_to((self.active + 1) % len),
            DeckCommand::Activate(id) => match self.position_of(&id) {
                Some(position) if position == self.active => {
                    DeckOutcome::OpenDetail(self.templates[position].clone())
                }
                Some(position) => self.move_to(position),
                None => {
                    debug!(%id, "activated template is not in the visible list");
                    DeckOutcome::Ignored
                }
            },
        }
    }

    fn move_to(&mut self, index: usize) -> DeckOutcome {
        self.active = index;
        self.navigating = true;
        self.nav_generation += 1;
        DeckOutcome::Moved {
            active: index,
            settle: SettleTicket {
                generation: self.nav_generation,
                after: self.navigation_time,
            },
        }
    }

    fn replay_pending(&mut self) -> DeckOutcome {
        match self.pending.take() {
            Some(command) => self.dispatch(command),
            None => DeckOutcome::Ignored,
        }
    }

    fn clamp_active(&mut self) {
        self.active = self.active.min(self.templates.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::sample_template;
    use proptest::prelude::*;

    const NAV: Duration = Duration::from_millis(300);

    fn list(n: usize) -> Vec<Template> {
        (0..n)
            .map(|i| sample_template(&format!("t{}", i), "Web", &format!("Template {}", i)))
            .collect()
    }

    fn deck_with(n: usize) -> Deck {
        let mut deck = Deck::new(NAV);
        let ticket = deck.begin_filter(Duration::from_millis(300));
        deck.replace_templates(ticket, list(n));
        deck
    }

    fn settle_ticket(outcome: &DeckOutcome) -> SettleTicket {
        match outcome {
            DeckOutcome::Moved { settle, .. } => *settle,
            other => panic!("expected a move, got {:?}", other),
        }
    }

    /// Dispatch and settle immediately
    fn step(deck: &mut Deck, command: DeckCommand) {
        let outcome = deck.dispatch(command);
        let ticket = settle_ticket(&outcome);
        assert_eq!(deck.settle(ticket), DeckOutcome::Ignored);
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let mut deck = deck_with(3);
        step(&mut deck, DeckCommand::Prev);
        assert_eq!(deck.active(), 2);
        step(&mut deck, DeckCommand::Next);
        assert_eq!(deck.active(), 0);
    }

    #[test]
    fn test_move_holds_lock_until_settled() {
        let mut deck = deck_with(4);
        let outcome = deck.dispatch(DeckCommand::Next);
        assert!(matches!(outcome, DeckOutcome::Moved { active: 1, .. }));
        assert!(deck.status().navigating);

        deck.settle(settle_ticket(&outcome));
        assert!(!deck.status().navigating);
    }

    #[test]
    fn test_empty_list_makes_everything_a_noop() {
        let mut deck = deck_with(0);
        assert_eq!(deck.dispatch(DeckCommand::Next), DeckOutcome::Ignored);
        assert_eq!(deck.dispatch(DeckCommand::Prev), DeckOutcome::Ignored);
        assert_eq!(deck.dispatch(DeckCommand::Activate("t0".into())), DeckOutcome::Ignored);
        assert_eq!(deck.active(), 0);
        assert!(deck.active_template().is_none());
    }

    #[test]
    fn test_activate_active_card_opens_detail() {
        let mut deck = deck_with(3);
        match deck.dispatch(DeckCommand::Activate("t0".into())) {
            DeckOutcome::OpenDetail(template) => assert_eq!(template.id, "t0"),
            other => panic!("expected detail, got {:?}", other),
        }
        assert_eq!(deck.active(), 0);
        assert!(!deck.is_locked());
    }

    #[test]
    fn test_activate_other_card_moves_to_it() {
        let mut deck = deck_with(5);
        let outcome = deck.dispatch(DeckCommand::Activate("t3".into()));
        assert!(matches!(outcome, DeckOutcome::Moved { active: 3, .. }));
    }

    #[test]
    fn test_activate_unknown_id_is_noop() {
        let mut deck = deck_with(3);
        assert_eq!(deck.dispatch(DeckCommand::Activate("gone".into())), DeckOutcome::Ignored);
        assert!(!deck.is_locked());
    }

    #[test]
    fn test_requests_while_locked_coalesce_latest_wins() {
        let mut deck = deck_with(5);
        let first = deck.dispatch(DeckCommand::Next);
        assert_eq!(deck.active(), 1);

        assert_eq!(deck.dispatch(DeckCommand::Prev), DeckOutcome::Deferred);
        assert_eq!(deck.dispatch(DeckCommand::Next), DeckOutcome::Deferred);
        assert!(deck.status().has_pending);

        // replay of the latest request (Next) from index 1
        let replay = deck.settle(settle_ticket(&first));
        assert!(matches!(replay, DeckOutcome::Moved { active: 2, .. }));
        assert!(!deck.status().has_pending);

        assert_eq!(deck.settle(settle_ticket(&replay)), DeckOutcome::Ignored);
        assert_eq!(deck.active(), 2);
    }

    #[test]
    fn test_prev_then_next_while_locked_is_reproducible() {
        let run = || {
            let mut deck = deck_with(6);
            let first = deck.dispatch(DeckCommand::Next);
            deck.dispatch(DeckCommand::Prev);
            deck.dispatch(DeckCommand::Next);
            let replay = deck.settle(settle_ticket(&first));
            deck.settle(settle_ticket(&replay));
            deck.active()
        };
        assert_eq!(run(), 2);
        assert_eq!(run(), run());
    }

    #[test]
    fn test_stale_settle_ticket_is_ignored() {
        let mut deck = deck_with(5);
        let first = deck.dispatch(DeckCommand::Next);
        let stale = settle_ticket(&first);
        deck.settle(stale);
        let second = deck.dispatch(DeckCommand::Next);

        // the old timer firing again must not release the new lock
        assert_eq!(deck.settle(stale), DeckOutcome::Ignored);
        assert!(deck.status().navigating);
        deck.settle(settle_ticket(&second));
        assert!(!deck.status().navigating);
    }

    #[test]
    fn test_filter_transition_resets_active_when_idle() {
        let mut deck = deck_with(5);
        step(&mut deck, DeckCommand::Next);
        step(&mut deck, DeckCommand::Next);
        assert_eq!(deck.active(), 2);

        let ticket = deck.begin_filter(Duration::from_millis(300));
        assert!(deck.is_locked());
        deck.replace_templates(ticket, list(4));
        assert_eq!(deck.active(), 0);
        assert!(!deck.is_locked());
    }

    #[test]
    fn test_filter_transition_during_navigation_keeps_index_in_range() {
        let mut deck = deck_with(6);
        step(&mut deck, DeckCommand::Prev);
        let moving = deck.dispatch(DeckCommand::Prev);
        assert_eq!(deck.active(), 4);

        let ticket = deck.begin_filter(Duration::from_millis(300));
        deck.replace_templates(ticket, list(3));
        // no reset while a move is in flight, only clamped
        assert_eq!(deck.active(), 2);

        deck.settle(settle_ticket(&moving));
        assert!(!deck.is_locked());
        assert!(deck.active() < deck.templates().len());
    }

    #[test]
    fn test_requests_during_filter_fade_replay_after_swap() {
        let mut deck = deck_with(3);
        let ticket = deck.begin_filter(Duration::from_millis(300));
        assert_eq!(deck.dispatch(DeckCommand::Next), DeckOutcome::Deferred);

        let outcome = deck.replace_templates(ticket, list(5));
        assert!(matches!(outcome, DeckOutcome::Moved { active: 1, .. }));
    }

    #[test]
    fn test_pending_activate_filtered_out_is_noop() {
        let mut deck = deck_with(5);
        let ticket = deck.begin_filter(Duration::from_millis(300));
        deck.dispatch(DeckCommand::Activate("t4".into()));

        let outcome = deck.replace_templates(ticket, list(2));
        assert_eq!(outcome, DeckOutcome::Ignored);
        assert_eq!(deck.active(), 0);
    }

    #[test]
    fn test_superseded_filter_result_is_dropped() {
        let mut deck = deck_with(2);
        let old = deck.begin_filter(Duration::from_millis(300));
        let new = deck.begin_filter(Duration::from_millis(300));

        assert_eq!(deck.replace_templates(old, list(7)), DeckOutcome::Ignored);
        assert_eq!(deck.templates().len(), 2);
        assert!(deck.is_locked());

        deck.replace_templates(new, list(4));
        assert_eq!(deck.templates().len(), 4);
        assert!(!deck.is_locked());
    }

    #[test]
    fn test_empty_replacement_clamps_to_zero() {
        let mut deck = deck_with(4);
        step(&mut deck, DeckCommand::Prev);
        let ticket = deck.begin_filter(Duration::from_millis(300));
        deck.replace_templates(ticket, Vec::new());
        assert_eq!(deck.active(), 0);
        assert_eq!(deck.status().len, 0);
    }

    proptest! {
        #[test]
        fn prop_next_n_times_returns_to_start(n in 1usize..20, start_seed in 0usize..100) {
            let mut deck = deck_with(n);
            let start = start_seed % n;
            if start != 0 {
                step(&mut deck, DeckCommand::Activate(format!("t{}", start)));
            }
            prop_assert_eq!(deck.active(), start);

            for _ in 0..n {
                let outcome = deck.dispatch(DeckCommand::Next);
                deck.settle(settle_ticket(&outcome));
            }
            prop_assert_eq!(deck.active(), start);
        }
    }
}
