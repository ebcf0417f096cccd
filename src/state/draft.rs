/// Editable template form for the admin console
///
/// A draft holds raw form text. It is validated and normalized into a
/// `DraftFields` value only when saved, so the form can hold half-typed
/// input (an empty price, a trailing comma in the tag list) without errors.
/// The demo catalog seed is stored as a JSON array of drafts.

use serde::{Deserialize, Serialize};

use super::data::Template;
use crate::error::{StoreError, StoreResult};

/// Raw admin form values
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TemplateDraft {
    pub title: String,
    pub category: String,
    pub description: String,
    pub long_description: String,
    /// Price as typed; empty or unparsable means free
    pub price: String,
    pub is_premium: bool,
    pub image: String,
    pub full_image: String,
    /// Comma-separated tag list
    pub tags: String,
    pub demo_url: String,
    pub download_url: String,
}

/// Which form field changed (admin form messages carry this)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Category,
    Description,
    LongDescription,
    Price,
    Image,
    FullImage,
    Tags,
    DemoUrl,
    DownloadUrl,
}

/// Validated draft, ready for the catalog store
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFields {
    pub title: String,
    pub category: String,
    pub description: String,
    pub long_description: Option<String>,
    pub price: f64,
    pub is_premium: bool,
    pub image: String,
    pub full_image: Option<String>,
    pub tags: Vec<String>,
    pub demo_url: Option<String>,
    pub download_url: Option<String>,
}

impl TemplateDraft {
    /// Blank form for "Create Template"
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill the form for "Edit Template"
    pub fn from_template(template: &Template) -> Self {
        Self {
            title: template.title.clone(),
            category: template.category.clone(),
            description: template.description.clone(),
            long_description: template.long_description.clone().unwrap_or_default(),
            price: if template.price > 0.0 {
                template.price.to_string()
            } else {
                String::new()
            },
            is_premium: template.is_premium,
            image: template.image.clone(),
            full_image: template.full_image.clone().unwrap_or_default(),
            tags: template.tags.join(", "),
            demo_url: template.demo_url.clone().unwrap_or_default(),
            download_url: template.download_url.clone().unwrap_or_default(),
        }
    }

    /// Current text of a field
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Category => &self.category,
            DraftField::Description => &self.description,
            DraftField::LongDescription => &self.long_description,
            DraftField::Price => &self.price,
            DraftField::Image => &self.image,
            DraftField::FullImage => &self.full_image,
            DraftField::Tags => &self.tags,
            DraftField::DemoUrl => &self.demo_url,
            DraftField::DownloadUrl => &self.download_url,
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: String) {
        let slot = match field {
            DraftField::Title => &mut self.title,
            DraftField::Category => &mut self.category,
            DraftField::Description => &mut self.description,
            DraftField::LongDescription => &mut self.long_description,
            DraftField::Price => &mut self.price,
            DraftField::Image => &mut self.image,
            DraftField::FullImage => &mut self.full_image,
            DraftField::Tags => &mut self.tags,
            DraftField::DemoUrl => &mut self.demo_url,
            DraftField::DownloadUrl => &mut self.download_url,
        };
        *slot = value;
    }

    /// Parsed price: blank or non-numeric input is 0
    pub fn parsed_price(&self) -> f64 {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }

    /// Tag list split on commas, trimmed, empties dropped
    pub fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate required fields and normalize optional ones
    pub fn validate(&self) -> StoreResult<DraftFields> {
        let required = [
            ("Title", &self.title),
            ("Category", &self.category),
            ("Short description", &self.description),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(StoreError::Validation(format!("{} is required", name)));
            }
        }

        let price = self.parsed_price();
        if price < 0.0 {
            return Err(StoreError::Validation("Price cannot be negative".to_string()));
        }

        Ok(DraftFields {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            long_description: optional(&self.long_description),
            price,
            is_premium: self.is_premium,
            image: self.image.trim().to_string(),
            full_image: optional(&self.full_image),
            tags: self.parsed_tags(),
            demo_url: optional(&self.demo_url),
            download_url: optional(&self.download_url),
        })
    }

    /// Parse a JSON array of drafts (the demo catalog seed)
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::sample_template;

    fn filled() -> TemplateDraft {
        TemplateDraft {
            title: " Aurora ".into(),
            category: "Landing".into(),
            description: "Hero-first landing page".into(),
            ..TemplateDraft::new()
        }
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let mut draft = filled();
        draft.category = "   ".into();
        match draft.validate() {
            Err(StoreError::Validation(msg)) => assert_eq!(msg, "Category is required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_price_defaults_to_zero() {
        let mut draft = filled();
        assert_eq!(draft.parsed_price(), 0.0);
        draft.price = "abc".into();
        assert_eq!(draft.parsed_price(), 0.0);
        draft.price = " 19.5 ".into();
        assert_eq!(draft.parsed_price(), 19.5);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut draft = filled();
        draft.price = "-5".into();
        assert!(matches!(draft.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_normalizes_optional_fields_and_tags() {
        let mut draft = filled();
        draft.tags = "react, , tailwind ,".into();
        draft.demo_url = "  ".into();
        draft.long_description = "Details".into();

        let fields = draft.validate().unwrap();
        assert_eq!(fields.title, "Aurora");
        assert_eq!(fields.tags, vec!["react", "tailwind"]);
        assert_eq!(fields.demo_url, None);
        assert_eq!(fields.long_description.as_deref(), Some("Details"));
    }

    #[test]
    fn test_prefill_from_template() {
        let mut template = sample_template("t1", "Blog", "Quill");
        template.tags = vec!["writing".into(), "minimal".into()];
        template.price = 12.0;

        let draft = TemplateDraft::from_template(&template);
        assert_eq!(draft.tags, "writing, minimal");
        assert_eq!(draft.price, "12");
        assert_eq!(draft.field(DraftField::Title), "Quill");
    }

    #[test]
    fn test_set_field() {
        let mut draft = TemplateDraft::new();
        draft.set_field(DraftField::DemoUrl, "https://demo".into());
        assert_eq!(draft.demo_url, "https://demo");
    }

    #[test]
    fn test_seed_json_with_missing_fields() {
        let drafts = TemplateDraft::list_from_json(
            r#"[{"title": "Nova", "category": "Landing", "description": "Bold"}]"#,
        )
        .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].parsed_price(), 0.0);
        assert!(drafts[0].parsed_tags().is_empty());
    }
}
