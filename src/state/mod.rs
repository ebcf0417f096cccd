/// State management module
///
/// This module handles all application state outside the deck itself:
/// - Catalog database and accounts (library.rs)
/// - Shared data structures (data.rs)
/// - Admin form drafts (draft.rs)
/// - Signed-in identity context (session.rs)
/// - Background store calls for the UI (tasks.rs)

pub mod data;
pub mod draft;
pub mod library;
pub mod session;
pub mod tasks;
