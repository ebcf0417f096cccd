/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog database and the UI layer.

use chrono::{DateTime, Utc};

/// Opaque template identifier (uuid string in the catalog)
pub type TemplateId = String;

/// Represents a single template in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Stable catalog id
    pub id: TemplateId,
    /// Sort index used for catalog ordering. Not a position in any visible list.
    pub index: i64,
    /// Category name (case-sensitive)
    pub category: String,
    pub title: String,
    /// Short description shown on the card
    pub description: String,
    /// Long description shown in the detail modal
    pub long_description: Option<String>,
    /// Card image reference
    pub image: String,
    /// Full-size image reference for the detail modal
    pub full_image: Option<String>,
    pub tags: Vec<String>,
    /// Price in the store currency; missing prices are stored as 0
    pub price: f64,
    pub is_premium: bool,
    pub demo_url: Option<String>,
    pub download_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    /// Text for the detail modal: long description, falling back to the short one
    pub fn detail_text(&self) -> &str {
        match self.long_description.as_deref() {
            Some(long) if !long.trim().is_empty() => long,
            _ => &self.description,
        }
    }

    /// Tags shown on the card face (first three)
    pub fn card_tags(&self) -> &[String] {
        &self.tags[..self.tags.len().min(3)]
    }

    /// Free templates can be downloaded without a purchase
    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }
}

/// A signed-in identity as seen by the rest of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub anonymous: bool,
}

impl Identity {
    /// Single character for the avatar placeholder
    pub fn initial(&self) -> char {
        self.display_name
            .as_deref()
            .and_then(|name| name.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// The per-user record of the "users" collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Favorite template ids, in the order they were added
    pub favorites: Vec<TemplateId>,
    /// Purchased template ids
    pub purchases: Vec<TemplateId>,
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn has_favorite(&self, template_id: &str) -> bool {
        self.favorites.iter().any(|id| id == template_id)
    }

    pub fn has_purchased(&self, template_id: &str) -> bool {
        self.purchases.iter().any(|id| id == template_id)
    }
}

#[cfg(test)]
pub(crate) fn sample_template(id: &str, category: &str, title: &str) -> Template {
    Template {
        id: id.to_string(),
        index: 0,
        category: category.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        long_description: None,
        image: format!("https://placehold.co/400x350?text={}", id),
        full_image: None,
        tags: Vec::new(),
        price: 0.0,
        is_premium: false,
        demo_url: None,
        download_url: None,
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_text_falls_back_to_description() {
        let mut t = sample_template("t1", "Web", "Landing");
        assert_eq!(t.detail_text(), "Landing description");

        t.long_description = Some("   ".to_string());
        assert_eq!(t.detail_text(), "Landing description");

        t.long_description = Some("A much longer story".to_string());
        assert_eq!(t.detail_text(), "A much longer story");
    }

    #[test]
    fn test_card_tags_capped_at_three() {
        let mut t = sample_template("t1", "Web", "Landing");
        t.tags = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert_eq!(t.card_tags(), &["a", "b", "c"]);

        t.tags.truncate(1);
        assert_eq!(t.card_tags(), &["a"]);
    }

    #[test]
    fn test_identity_initial() {
        let mut who = Identity {
            uid: "u1".into(),
            email: None,
            display_name: Some("jordan".into()),
            anonymous: false,
        };
        assert_eq!(who.initial(), 'J');

        who.display_name = None;
        assert_eq!(who.initial(), 'U');
    }
}
