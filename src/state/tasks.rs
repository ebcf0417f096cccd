/// Background catalog operations
///
/// Each call opens its own connection to the catalog file and runs on the
/// blocking pool, since rusqlite::Connection is not Send and must not be
/// shared with the UI thread. Results are flattened to `String` errors so
/// they can travel inside (Clone) UI messages.

use std::path::PathBuf;

use tracing::warn;

use super::data::{Identity, Template, TemplateId, UserProfile};
use super::draft::TemplateDraft;
use super::library::{CatalogStore, Library};
use crate::error::StoreResult;

pub type TaskResult<T> = Result<T, String>;

/// Monotonic stamp for requests whose results may arrive out of order.
/// Only the result carrying the latest stamp is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generation(u64);

impl Generation {
    /// Start a new request, superseding all earlier ones
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, stamp: u64) -> bool {
        self.0 == stamp
    }
}

async fn with_library<T, F>(db_path: PathBuf, op: F) -> TaskResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Library) -> StoreResult<T> + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let library = Library::open(&db_path)?;
        op(&library)
    })
    .await;

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(error = %e, "catalog operation failed");
            Err(e.to_string())
        }
        Err(e) => {
            warn!(error = %e, "catalog task aborted");
            Err("The catalog task stopped unexpectedly".to_string())
        }
    }
}

pub async fn load_catalog(db_path: PathBuf) -> TaskResult<Vec<Template>> {
    with_library(db_path, |library| library.fetch_all()).await
}

pub async fn load_category(db_path: PathBuf, category: String) -> TaskResult<Vec<Template>> {
    with_library(db_path, move |library| library.fetch_by_category(&category)).await
}

pub async fn load_template(db_path: PathBuf, id: TemplateId) -> TaskResult<Option<Template>> {
    with_library(db_path, move |library| library.fetch_by_id(&id)).await
}

pub async fn load_favorites(db_path: PathBuf, who: Identity) -> TaskResult<Vec<Template>> {
    with_library(db_path, move |library| library.fetch_favorites(&who)).await
}

pub async fn sign_in(db_path: PathBuf, email: String, password: String) -> TaskResult<(Identity, UserProfile)> {
    with_library(db_path, move |library| {
        let identity = library.sign_in(&email, &password)?;
        let profile = library.ensure_profile(&identity)?;
        Ok((identity, profile))
    })
    .await
}

pub async fn sign_up(
    db_path: PathBuf,
    email: String,
    password: String,
    display_name: String,
) -> TaskResult<(Identity, UserProfile)> {
    with_library(db_path, move |library| {
        let identity = library.sign_up(&email, &password, &display_name)?;
        let profile = library.ensure_profile(&identity)?;
        Ok((identity, profile))
    })
    .await
}

pub async fn sign_in_anonymously(db_path: PathBuf) -> TaskResult<(Identity, UserProfile)> {
    with_library(db_path, |library| {
        let identity = library.sign_in_anonymously()?;
        let profile = library.ensure_profile(&identity)?;
        Ok((identity, profile))
    })
    .await
}

/// Toggle and return the refreshed profile along with the new state
pub async fn toggle_favorite(
    db_path: PathBuf,
    who: Identity,
    template_id: TemplateId,
) -> TaskResult<(bool, UserProfile)> {
    with_library(db_path, move |library| {
        let now_favorite = library.toggle_favorite(&who, &template_id)?;
        let profile = library.ensure_profile(&who)?;
        Ok((now_favorite, profile))
    })
    .await
}

pub async fn purchase_status(db_path: PathBuf, who: Identity, template_id: TemplateId) -> TaskResult<bool> {
    with_library(db_path, move |library| library.has_purchased(&who, &template_id)).await
}

pub async fn record_purchase(db_path: PathBuf, who: Identity, template_id: TemplateId) -> TaskResult<UserProfile> {
    with_library(db_path, move |library| {
        library.record_purchase(&who, &template_id)?;
        library.ensure_profile(&who)
    })
    .await
}

/// Create when `id` is None, update otherwise
pub async fn save_template(
    db_path: PathBuf,
    who: Identity,
    id: Option<TemplateId>,
    draft: TemplateDraft,
) -> TaskResult<Template> {
    with_library(db_path, move |library| match &id {
        Some(id) => library.update_template(&who, id, &draft),
        None => library.create_template(&who, &draft),
    })
    .await
}

pub async fn delete_template(db_path: PathBuf, who: Identity, id: TemplateId) -> TaskResult<TemplateId> {
    with_library(db_path, move |library| {
        library.delete_template(&who, &id)?;
        Ok(id)
    })
    .await
}

/// Fixed delay used for animation, settle and debounce timers
pub async fn sleep(duration: std::time::Duration) {
    tokio::time::sleep(duration).await;
}
