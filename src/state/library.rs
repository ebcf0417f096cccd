use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::data::{Identity, Template, UserProfile};
use super::draft::{DraftFields, TemplateDraft};
use crate::error::{StoreError, StoreResult};

/// Operations the storefront and the admin console need from the catalog.
///
/// Admin mutations take the acting identity and are permission-checked
/// by the store before anything is written.
pub trait CatalogStore {
    fn fetch_all(&self) -> StoreResult<Vec<Template>>;
    fn fetch_by_category(&self, category: &str) -> StoreResult<Vec<Template>>;
    fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Template>>;
    fn fetch_favorites(&self, who: &Identity) -> StoreResult<Vec<Template>>;
    /// Returns the new favorite state
    fn toggle_favorite(&self, who: &Identity, template_id: &str) -> StoreResult<bool>;
    fn has_purchased(&self, who: &Identity, template_id: &str) -> StoreResult<bool>;
    fn record_purchase(&self, who: &Identity, template_id: &str) -> StoreResult<()>;
    fn create_template(&self, who: &Identity, draft: &TemplateDraft) -> StoreResult<Template>;
    /// Merge update: the stored created_at and sort index are kept
    fn update_template(&self, who: &Identity, id: &str, draft: &TemplateDraft) -> StoreResult<Template>;
    fn delete_template(&self, who: &Identity, id: &str) -> StoreResult<()>;
}

const TEMPLATE_COLUMNS: &str = "id, sort_index, category, title, description, long_description, \
     image, full_image, tags_json, price, is_premium, demo_url, download_url, created_at, updated_at";

/// The Library manages the SQLite catalog database.
/// It stores the "templates" and "users" collections.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and initialize the schema
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %e, "could not create data directory");
            }
        }

        let conn = Connection::open(db_path)?;
        // background tasks each hold their own connection; writers queue
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!(path = %db_path.display(), "catalog database opened");

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Throwaway in-memory catalog
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create all tables and indexes if they don't exist.
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS templates (
                id               TEXT PRIMARY KEY,
                sort_index       INTEGER NOT NULL DEFAULT 0,
                category         TEXT NOT NULL,
                title            TEXT NOT NULL,
                description      TEXT NOT NULL DEFAULT '',
                long_description TEXT,
                image            TEXT NOT NULL DEFAULT '',
                full_image       TEXT,
                tags_json        TEXT,
                price            REAL,
                is_premium       INTEGER,
                demo_url         TEXT,
                download_url     TEXT,
                created_at       INTEGER,
                updated_at       INTEGER
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                uid             TEXT PRIMARY KEY,
                email           TEXT UNIQUE,
                display_name    TEXT,
                password_salt   TEXT,
                password_hash   TEXT,
                anonymous       INTEGER NOT NULL DEFAULT 0,
                favorites_json  TEXT NOT NULL DEFAULT '[]',
                purchases_json  TEXT NOT NULL DEFAULT '[]',
                is_admin        INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_templates_category
             ON templates(category, sort_index)",
            [],
        )?;

        debug!("catalog schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get a count of templates in the catalog
    pub fn template_count(&self) -> StoreResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM templates", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert the demo catalog when the templates table is empty.
    /// Returns how many templates were added.
    pub fn seed_if_empty(&self, drafts: &[TemplateDraft]) -> StoreResult<usize> {
        if self.template_count()? > 0 {
            return Ok(0);
        }

        let mut added = 0;
        for draft in drafts {
            let fields = draft.validate()?;
            self.insert_template(&fields)?;
            added += 1;
        }

        info!(count = added, "seeded demo catalog");
        Ok(added)
    }

    // ========== Accounts ==========

    /// Create an email/password account and its profile
    pub fn sign_up(&self, email: &str, password: &str, display_name: &str) -> StoreResult<Identity> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::Validation("Enter a valid email address".to_string()));
        }
        if password.len() < 6 {
            return Err(StoreError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let taken: Option<String> = self
            .conn
            .query_row("SELECT uid FROM users WHERE email = ?1", [&email], |row| row.get(0))
            .optional()?;
        if taken.is_some() {
            return Err(StoreError::EmailTaken(email));
        }

        let uid = uuid::Uuid::new_v4().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let display_name = Some(display_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        self.conn.execute(
            "INSERT INTO users (uid, email, display_name, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &uid,
                &email,
                &display_name,
                &salt,
                password_digest(&salt, password),
                Utc::now().timestamp(),
            ],
        )?;

        info!(%uid, "account created");
        Ok(Identity {
            uid,
            email: Some(email),
            display_name,
            anonymous: false,
        })
    }

    /// Check an email/password pair
    pub fn sign_in(&self, email: &str, password: &str) -> StoreResult<Identity> {
        let email = email.trim().to_lowercase();
        let row = self
            .conn
            .query_row(
                "SELECT uid, display_name, password_salt, password_hash FROM users WHERE email = ?1",
                [&email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((uid, display_name, Some(salt), Some(hash)))
                if password_digest(&salt, password) == hash =>
            {
                Ok(Identity {
                    uid,
                    email: Some(email),
                    display_name,
                    anonymous: false,
                })
            }
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    /// Create a guest identity with an empty profile
    pub fn sign_in_anonymously(&self) -> StoreResult<Identity> {
        let uid = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO users (uid, anonymous, created_at) VALUES (?1, 1, ?2)",
            params![&uid, Utc::now().timestamp()],
        )?;

        Ok(Identity {
            uid,
            email: None,
            display_name: Some("Guest".to_string()),
            anonymous: true,
        })
    }

    /// Load the profile for an identity, creating an empty one on first sight
    pub fn ensure_profile(&self, who: &Identity) -> StoreResult<UserProfile> {
        if let Some(profile) = self.profile(&who.uid)? {
            return Ok(profile);
        }

        self.conn.execute(
            "INSERT INTO users (uid, email, display_name, anonymous, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &who.uid,
                &who.email,
                &who.display_name,
                who.anonymous,
                Utc::now().timestamp(),
            ],
        )?;

        self.profile(&who.uid)?
            .ok_or_else(|| StoreError::user_not_found(who.uid.clone()))
    }

    /// Read a user record
    pub fn profile(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        let row = self
            .conn
            .query_row(
                "SELECT uid, email, display_name, favorites_json, purchases_json, is_admin, created_at
                 FROM users WHERE uid = ?1",
                [uid],
                |row| {
                    Ok((
                        UserProfile {
                            uid: row.get(0)?,
                            email: row.get(1)?,
                            display_name: row.get(2)?,
                            favorites: Vec::new(),
                            purchases: Vec::new(),
                            is_admin: row.get(5)?,
                            created_at: row.get::<_, Option<i64>>(6)?.and_then(from_unix),
                        },
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((mut profile, favorites, purchases)) = row else {
            return Ok(None);
        };
        profile.favorites = serde_json::from_str(&favorites)?;
        profile.purchases = serde_json::from_str(&purchases)?;
        Ok(Some(profile))
    }

    /// Grant the admin flag (bootstrap only; there is no UI for it)
    pub fn promote_admin(&self, email: &str) -> StoreResult<()> {
        let email = email.trim().to_lowercase();
        let changed = self
            .conn
            .execute("UPDATE users SET is_admin = 1 WHERE email = ?1", [&email])?;
        if changed == 0 {
            return Err(StoreError::user_not_found(email));
        }
        info!(%email, "account promoted to admin");
        Ok(())
    }

    // ========== Internals ==========

    fn require_admin(&self, who: &Identity) -> StoreResult<()> {
        match self.profile(&who.uid)? {
            Some(profile) if profile.is_admin => Ok(()),
            _ => {
                warn!(uid = %who.uid, "admin mutation rejected");
                Err(StoreError::PermissionDenied)
            }
        }
    }

    fn require_profile(&self, who: &Identity) -> StoreResult<UserProfile> {
        self.profile(&who.uid)?.ok_or(StoreError::NotSignedIn)
    }

    /// Run a read-modify-write under the database write lock. Another
    /// connection cannot change the rows between our read and our write.
    fn write_transaction<T>(&self, op: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let result = op().and_then(|value| {
            self.conn.execute_batch("COMMIT")?;
            Ok(value)
        });
        if result.is_err() && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed");
            }
        }
        result
    }

    fn write_id_list(&self, uid: &str, column: &str, ids: &[String]) -> StoreResult<()> {
        let json = serde_json::to_string(ids)?;
        // column names come from this module only
        let sql = format!("UPDATE users SET {} = ?1 WHERE uid = ?2", column);
        self.conn.execute(&sql, params![json, uid])?;
        Ok(())
    }

    fn next_sort_index(&self) -> StoreResult<i64> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(sort_index) FROM templates", [], |row| row.get(0))?;
        Ok(max.map_or(0, |m| m + 1))
    }

    fn insert_template(&self, fields: &DraftFields) -> StoreResult<Template> {
        let id = uuid::Uuid::new_v4().to_string();
        let index = self.next_sort_index()?;
        let now = Utc::now().timestamp();

        self.conn.execute(
            &format!(
                "INSERT INTO templates ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                TEMPLATE_COLUMNS
            ),
            params![
                &id,
                index,
                &fields.category,
                &fields.title,
                &fields.description,
                &fields.long_description,
                &fields.image,
                &fields.full_image,
                serde_json::to_string(&fields.tags)?,
                fields.price,
                fields.is_premium,
                &fields.demo_url,
                &fields.download_url,
                now,
                now,
            ],
        )?;

        self.fetch_by_id(&id)?
            .ok_or_else(|| StoreError::template_not_found(id))
    }

    fn query_templates(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> StoreResult<Vec<Template>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, template_from_row)?;

        let mut templates = Vec::new();
        for template in rows {
            templates.push(template?);
        }
        Ok(templates)
    }
}

impl CatalogStore for Library {
    fn fetch_all(&self) -> StoreResult<Vec<Template>> {
        self.query_templates(
            &format!("SELECT {} FROM templates ORDER BY sort_index, id", TEMPLATE_COLUMNS),
            &[],
        )
    }

    fn fetch_by_category(&self, category: &str) -> StoreResult<Vec<Template>> {
        self.query_templates(
            &format!(
                "SELECT {} FROM templates WHERE category = ?1 ORDER BY sort_index, id",
                TEMPLATE_COLUMNS
            ),
            &[&category],
        )
    }

    fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Template>> {
        let template = self
            .conn
            .query_row(
                &format!("SELECT {} FROM templates WHERE id = ?1", TEMPLATE_COLUMNS),
                [id],
                template_from_row,
            )
            .optional()?;
        Ok(template)
    }

    fn fetch_favorites(&self, who: &Identity) -> StoreResult<Vec<Template>> {
        let Some(profile) = self.profile(&who.uid)? else {
            return Ok(Vec::new());
        };

        // Favorites keep the order they were added in; deleted templates are skipped
        let mut templates = Vec::with_capacity(profile.favorites.len());
        for id in &profile.favorites {
            if let Some(template) = self.fetch_by_id(id)? {
                templates.push(template);
            }
        }
        Ok(templates)
    }

    fn toggle_favorite(&self, who: &Identity, template_id: &str) -> StoreResult<bool> {
        let now_favorite = self.write_transaction(|| {
            let mut profile = self.require_profile(who)?;

            let now_favorite = if profile.has_favorite(template_id) {
                profile.favorites.retain(|id| id != template_id);
                false
            } else {
                if self.fetch_by_id(template_id)?.is_none() {
                    return Err(StoreError::template_not_found(template_id));
                }
                profile.favorites.push(template_id.to_string());
                true
            };

            self.write_id_list(&who.uid, "favorites_json", &profile.favorites)?;
            Ok(now_favorite)
        })?;
        debug!(uid = %who.uid, template_id, now_favorite, "favorite toggled");
        Ok(now_favorite)
    }

    fn has_purchased(&self, who: &Identity, template_id: &str) -> StoreResult<bool> {
        Ok(self
            .profile(&who.uid)?
            .is_some_and(|profile| profile.has_purchased(template_id)))
    }

    fn record_purchase(&self, who: &Identity, template_id: &str) -> StoreResult<()> {
        self.write_transaction(|| {
            let mut profile = self.require_profile(who)?;
            if self.fetch_by_id(template_id)?.is_none() {
                return Err(StoreError::template_not_found(template_id));
            }

            if !profile.has_purchased(template_id) {
                profile.purchases.push(template_id.to_string());
                self.write_id_list(&who.uid, "purchases_json", &profile.purchases)?;
                info!(uid = %who.uid, template_id, "purchase recorded");
            }
            Ok(())
        })
    }

    fn create_template(&self, who: &Identity, draft: &TemplateDraft) -> StoreResult<Template> {
        self.require_admin(who)?;
        let fields = draft.validate()?;
        let template = self.insert_template(&fields)?;
        info!(id = %template.id, title = %template.title, "template created");
        Ok(template)
    }

    fn update_template(&self, who: &Identity, id: &str, draft: &TemplateDraft) -> StoreResult<Template> {
        self.require_admin(who)?;
        let fields = draft.validate()?;

        let changed = self.conn.execute(
            "UPDATE templates SET category = ?1, title = ?2, description = ?3, long_description = ?4,
                 image = ?5, full_image = ?6, tags_json = ?7, price = ?8, is_premium = ?9,
                 demo_url = ?10, download_url = ?11, updated_at = ?12
             WHERE id = ?13",
            params![
                &fields.category,
                &fields.title,
                &fields.description,
                &fields.long_description,
                &fields.image,
                &fields.full_image,
                serde_json::to_string(&fields.tags)?,
                fields.price,
                fields.is_premium,
                &fields.demo_url,
                &fields.download_url,
                Utc::now().timestamp(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::template_not_found(id));
        }

        info!(%id, "template updated");
        self.fetch_by_id(id)?
            .ok_or_else(|| StoreError::template_not_found(id))
    }

    fn delete_template(&self, who: &Identity, id: &str) -> StoreResult<()> {
        self.require_admin(who)?;
        let changed = self.conn.execute("DELETE FROM templates WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::template_not_found(id));
        }
        info!(%id, "template deleted");
        Ok(())
    }
}

/// Build a Template from a row selected with TEMPLATE_COLUMNS.
/// Missing optional fields are defaulted rather than rejected.
fn template_from_row(row: &Row) -> rusqlite::Result<Template> {
    let id: String = row.get(0)?;
    let tags_json: Option<String> = row.get(8)?;
    let tags = match tags_json.as_deref() {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            warn!(%id, error = %e, "ignoring malformed tags");
            Vec::new()
        }),
    };

    Ok(Template {
        index: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
        category: row.get(2)?,
        title: row.get(3)?,
        description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        long_description: row.get(5)?,
        image: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        full_image: row.get(7)?,
        tags,
        price: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0).max(0.0),
        is_premium: row.get::<_, Option<bool>>(10)?.unwrap_or(false),
        demo_url: row.get(11)?,
        download_url: row.get(12)?,
        created_at: row.get::<_, Option<i64>>(13)?.and_then(from_unix),
        updated_at: row.get::<_, Option<i64>>(14)?.and_then(from_unix),
        id,
    })
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, category: &str) -> TemplateDraft {
        TemplateDraft {
            title: title.into(),
            category: category.into(),
            description: format!("{} description", title),
            ..TemplateDraft::new()
        }
    }

    /// Library with one admin account and one regular account
    fn library_with_accounts() -> (Library, Identity, Identity) {
        let library = Library::open_in_memory().unwrap();
        let admin = library.sign_up("admin@example.com", "secret-1", "Admin").unwrap();
        library.promote_admin("admin@example.com").unwrap();
        let user = library.sign_up("user@example.com", "secret-2", "User").unwrap();
        (library, admin, user)
    }

    #[test]
    fn test_empty_catalog() {
        let library = Library::open_in_memory().unwrap();
        assert_eq!(library.template_count().unwrap(), 0);
        assert!(library.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_admin_create_assigns_increasing_index() {
        let (library, admin, _) = library_with_accounts();
        let first = library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();
        let second = library.create_template(&admin, &draft("Quill", "Blog")).unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert!(first.created_at.is_some());

        let all = library.fetch_all().unwrap();
        assert_eq!(all.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["Aurora", "Quill"]);
    }

    #[test]
    fn test_non_admin_mutations_are_rejected() {
        let (library, admin, user) = library_with_accounts();
        let template = library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();

        assert!(matches!(
            library.create_template(&user, &draft("Nope", "Landing")),
            Err(StoreError::PermissionDenied)
        ));
        assert!(matches!(
            library.update_template(&user, &template.id, &draft("Renamed", "Landing")),
            Err(StoreError::PermissionDenied)
        ));
        assert!(matches!(
            library.delete_template(&user, &template.id),
            Err(StoreError::PermissionDenied)
        ));
        assert_eq!(library.template_count().unwrap(), 1);
    }

    #[test]
    fn test_update_merges_and_keeps_index() {
        let (library, admin, _) = library_with_accounts();
        library.create_template(&admin, &draft("First", "Landing")).unwrap();
        let template = library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();

        let mut edit = TemplateDraft::from_template(&template);
        edit.title = "Aurora Pro".into();
        edit.price = "29".into();
        edit.is_premium = true;

        let updated = library.update_template(&admin, &template.id, &edit).unwrap();
        assert_eq!(updated.title, "Aurora Pro");
        assert_eq!(updated.index, template.index);
        assert_eq!(updated.price, 29.0);
        assert!(updated.is_premium);
        assert_eq!(updated.created_at, template.created_at);
    }

    #[test]
    fn test_delete_unknown_template_is_not_found() {
        let (library, admin, _) = library_with_accounts();
        assert!(matches!(
            library.delete_template(&admin, "missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_fetch_by_category() {
        let (library, admin, _) = library_with_accounts();
        library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();
        library.create_template(&admin, &draft("Quill", "Blog")).unwrap();
        library.create_template(&admin, &draft("Nova", "Landing")).unwrap();

        let landing = library.fetch_by_category("Landing").unwrap();
        assert_eq!(landing.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["Aurora", "Nova"]);
        assert!(library.fetch_by_category("landing").unwrap().is_empty());
    }

    #[test]
    fn test_toggle_favorite_and_favorites_order() {
        let (library, admin, user) = library_with_accounts();
        let a = library.create_template(&admin, &draft("A", "Landing")).unwrap();
        let b = library.create_template(&admin, &draft("B", "Landing")).unwrap();

        assert!(library.toggle_favorite(&user, &b.id).unwrap());
        assert!(library.toggle_favorite(&user, &a.id).unwrap());
        let favorites = library.fetch_favorites(&user).unwrap();
        assert_eq!(favorites.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["B", "A"]);

        assert!(!library.toggle_favorite(&user, &b.id).unwrap());
        assert_eq!(library.fetch_favorites(&user).unwrap().len(), 1);
    }

    #[test]
    fn test_favorites_skip_deleted_templates() {
        let (library, admin, user) = library_with_accounts();
        let a = library.create_template(&admin, &draft("A", "Landing")).unwrap();
        library.toggle_favorite(&user, &a.id).unwrap();
        library.delete_template(&admin, &a.id).unwrap();

        assert!(library.fetch_favorites(&user).unwrap().is_empty());
    }

    #[test]
    fn test_favorite_unknown_template_fails() {
        let (library, _, user) = library_with_accounts();
        assert!(matches!(
            library.toggle_favorite(&user, "missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_purchases_are_a_set() {
        let (library, admin, user) = library_with_accounts();
        let a = library.create_template(&admin, &draft("A", "Landing")).unwrap();

        assert!(!library.has_purchased(&user, &a.id).unwrap());
        library.record_purchase(&user, &a.id).unwrap();
        library.record_purchase(&user, &a.id).unwrap();
        assert!(library.has_purchased(&user, &a.id).unwrap());

        let profile = library.profile(&user.uid).unwrap().unwrap();
        assert_eq!(profile.purchases, vec![a.id.clone()]);
    }

    #[test]
    fn test_sign_in_checks_password() {
        let library = Library::open_in_memory().unwrap();
        let created = library.sign_up("Jo@Example.com", "hunter22", "Jo").unwrap();

        let signed_in = library.sign_in("jo@example.com", "hunter22").unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert!(matches!(
            library.sign_in("jo@example.com", "wrong-pass"),
            Err(StoreError::InvalidCredentials)
        ));
        assert!(matches!(
            library.sign_in("nobody@example.com", "hunter22"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_sign_up_rejects_duplicates_and_short_passwords() {
        let library = Library::open_in_memory().unwrap();
        library.sign_up("jo@example.com", "hunter22", "Jo").unwrap();

        assert!(matches!(
            library.sign_up("jo@example.com", "another1", "Jo"),
            Err(StoreError::EmailTaken(_))
        ));
        assert!(matches!(
            library.sign_up("new@example.com", "123", "New"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_anonymous_profile_starts_empty() {
        let library = Library::open_in_memory().unwrap();
        let guest = library.sign_in_anonymously().unwrap();
        let profile = library.ensure_profile(&guest).unwrap();

        assert!(profile.favorites.is_empty());
        assert!(profile.purchases.is_empty());
        assert!(!profile.is_admin);
    }

    #[test]
    fn test_ensure_profile_creates_missing_record() {
        let library = Library::open_in_memory().unwrap();
        let who = Identity {
            uid: "external-uid".into(),
            email: Some("ext@example.com".into()),
            display_name: None,
            anonymous: false,
        };
        assert!(library.profile(&who.uid).unwrap().is_none());
        let profile = library.ensure_profile(&who).unwrap();
        assert_eq!(profile.email.as_deref(), Some("ext@example.com"));
    }

    #[test]
    fn test_missing_optional_columns_are_defaulted() {
        let library = Library::open_in_memory().unwrap();
        library
            .conn
            .execute(
                "INSERT INTO templates (id, category, title) VALUES ('raw', 'Landing', 'Bare')",
                [],
            )
            .unwrap();
        library
            .conn
            .execute(
                "INSERT INTO templates (id, category, title, tags_json) VALUES ('bad', 'Landing', 'Broken', 'not json')",
                [],
            )
            .unwrap();

        let bare = library.fetch_by_id("raw").unwrap().unwrap();
        assert_eq!(bare.price, 0.0);
        assert!(bare.tags.is_empty());
        assert!(!bare.is_premium);

        let broken = library.fetch_by_id("bad").unwrap().unwrap();
        assert!(broken.tags.is_empty());
    }

    #[test]
    fn test_seed_only_when_empty() {
        let library = Library::open_in_memory().unwrap();
        let drafts = vec![draft("Aurora", "Landing"), draft("Quill", "Blog")];

        assert_eq!(library.seed_if_empty(&drafts).unwrap(), 2);
        assert_eq!(library.seed_if_empty(&drafts).unwrap(), 0);
        assert_eq!(library.template_count().unwrap(), 2);
    }

    #[test]
    fn test_concurrent_favorite_toggles_keep_both() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let path = std::env::temp_dir().join(format!("template-deck-{}.db", uuid::Uuid::new_v4()));
        let (user, first, second) = {
            let library = Library::open(&path).unwrap();
            let admin = library.sign_up("admin@example.com", "secret-1", "Admin").unwrap();
            library.promote_admin("admin@example.com").unwrap();
            let user = library.sign_up("user@example.com", "secret-2", "User").unwrap();
            let first = library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();
            let second = library.create_template(&admin, &draft("Quill", "Blog")).unwrap();
            (user, first.id, second.id)
        };

        for round in 0..25 {
            let barrier = Arc::new(Barrier::new(2));
            let workers: Vec<_> = [first.clone(), second.clone()]
                .into_iter()
                .map(|template_id| {
                    let barrier = Arc::clone(&barrier);
                    let path = path.clone();
                    let user = user.clone();
                    thread::spawn(move || {
                        let library = Library::open(&path).unwrap();
                        barrier.wait();
                        library.toggle_favorite(&user, &template_id).unwrap()
                    })
                })
                .collect();
            for worker in workers {
                assert!(worker.join().unwrap(), "round {} removed instead of added", round);
            }

            let library = Library::open(&path).unwrap();
            let favorites = library.profile(&user.uid).unwrap().unwrap().favorites;
            assert_eq!(favorites.len(), 2, "round {} lost a write: {:?}", round, favorites);

            assert!(!library.toggle_favorite(&user, &first).unwrap());
            assert!(!library.toggle_favorite(&user, &second).unwrap());
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_failed_favorite_toggle_leaves_no_open_transaction() {
        let (library, admin, user) = library_with_accounts();
        let template = library.create_template(&admin, &draft("Aurora", "Landing")).unwrap();

        assert!(matches!(
            library.toggle_favorite(&user, "missing"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(library.conn.is_autocommit());

        assert!(library.toggle_favorite(&user, &template.id).unwrap());
        library.record_purchase(&user, &template.id).unwrap();
        assert!(library.has_purchased(&user, &template.id).unwrap());
    }
}
