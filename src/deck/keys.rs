/// Keyboard and swipe routing for the deck
///
/// The storefront owns the keyboard subscription and turns raw key presses
/// into deck commands here, so the deck itself never listens to input.

use super::navigator::DeckCommand;

/// Minimum horizontal travel (logical pixels) for a swipe
pub const SWIPE_THRESHOLD: f32 = 50.0;

/// Keys the storefront reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckKey {
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
}

/// UI state that decides whether a key reaches the deck
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyContext {
    pub modal_open: bool,
    /// The search box consumed the key press
    pub search_focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Deck(DeckCommand),
    CloseModal,
}

/// Route a key press.
///
/// Escape always closes an open modal. Arrows and Enter are suppressed
/// while a modal is open or the search box has focus. Enter activates the
/// card currently centered, if there is one.
pub fn route_key(key: DeckKey, context: KeyContext, current: Option<&str>) -> Option<KeyAction> {
    if key == DeckKey::Escape {
        return context.modal_open.then_some(KeyAction::CloseModal);
    }

    if context.modal_open || context.search_focused {
        return None;
    }

    match key {
        DeckKey::ArrowLeft => Some(KeyAction::Deck(DeckCommand::Prev)),
        DeckKey::ArrowRight => Some(KeyAction::Deck(DeckCommand::Next)),
        DeckKey::Enter => current.map(|id| KeyAction::Deck(DeckCommand::Activate(id.to_string()))),
        DeckKey::Escape => None,
    }
}

/// Map a finished horizontal drag to a command: dragging left shows the next card
pub fn swipe_command(dx: f32) -> Option<DeckCommand> {
    if dx.abs() <= SWIPE_THRESHOLD {
        None
    } else if dx < 0.0 {
        Some(DeckCommand::Next)
    } else {
        Some(DeckCommand::Prev)
    }
}

/// Tracks one touch gesture from press to release
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    start_x: Option<f32>,
}

impl SwipeTracker {
    pub fn press(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    /// Finish the gesture; returns the command for a long enough swipe
    pub fn release(&mut self, x: f32) -> Option<DeckCommand> {
        self.start_x.take().and_then(|start| swipe_command(x - start))
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}
