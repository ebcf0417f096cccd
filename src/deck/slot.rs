/// Card position slots relative to the active card
///
/// The deck renders a five-slot window (two behind, active, two ahead)
/// whatever the list length, so drawing cost does not grow with the catalog.

/// Where a card sits relative to the active one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSlot {
    Active,
    Next,
    /// Two ahead: rendered faded so the next move can cross-fade in
    NextStaged,
    Prev,
    /// Two behind: rendered faded
    PrevStaged,
    Hidden,
}

impl CardSlot {
    /// Slots drawn by the storefront, left to right
    pub const WINDOW: [CardSlot; 5] = [
        CardSlot::PrevStaged,
        CardSlot::Prev,
        CardSlot::Active,
        CardSlot::Next,
        CardSlot::NextStaged,
    ];

    /// Staged cards are drawn but dimmed
    pub fn is_staged(self) -> bool {
        matches!(self, CardSlot::NextStaged | CardSlot::PrevStaged)
    }
}

/// Slot of the card at list position `index` when `active` is centered.
///
/// `diff = (index - active + len) mod len`; 0 is active, 1 next, 2 staged
/// next, `len - 1` prev, `len - 2` staged prev, anything else hidden.
/// For short lists several rules hit the same `diff`; the first rule in
/// that order wins, so `Active` is always unique.
pub fn card_slot(index: usize, active: usize, len: usize) -> CardSlot {
    if len == 0 || index >= len {
        return CardSlot::Hidden;
    }

    let active = active.min(len - 1);
    let diff = (index + len - active) % len;

    match diff {
        0 => CardSlot::Active,
        1 => CardSlot::Next,
        2 => CardSlot::NextStaged,
        d if d == len - 1 => CardSlot::Prev,
        d if d == len - 2 => CardSlot::PrevStaged,
        _ => CardSlot::Hidden,
    }
}

/// List position shown in `slot`, if any card maps to it
pub fn index_in_slot(slot: CardSlot, active: usize, len: usize) -> Option<usize> {
    (0..len).find(|&i| card_slot(i, active, len) == slot)
}
