/// Template deck module
///
/// The browsing core of the storefront, independent of any widget code:
/// - Category filter and text search (filter.rs)
/// - Carousel navigation coordinator (navigator.rs)
/// - Card position slots (slot.rs)
/// - Search debounce (debounce.rs)
/// - Keyboard and swipe routing (keys.rs)

pub mod debounce;
pub mod filter;
pub mod keys;
pub mod navigator;
pub mod slot;

pub use filter::CategoryFilter;
pub use navigator::{Deck, DeckCommand, DeckOutcome};
pub use slot::CardSlot;
