/// Category filter and free-text search over the catalog
///
/// `visible_templates` is a pure function of its inputs: calling it twice
/// with the same catalog, favorites, filter and search text yields the
/// same list. The result keeps the order of the base set, no re-sorting.

use std::fmt;

use crate::state::data::Template;

/// Reserved filter value: the whole catalog
pub const ALL_LABEL: &str = "All";
/// Reserved filter value: the signed-in user's favorites
pub const FAVORITES_LABEL: &str = "My Favorites";

/// Filter selected in the filter row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Favorites,
    /// Exact, case-sensitive category match
    Category(String),
}

impl CategoryFilter {
    /// Parse a filter-row label, mapping the reserved labels
    pub fn from_label(label: &str) -> Self {
        match label {
            ALL_LABEL => CategoryFilter::All,
            FAVORITES_LABEL => CategoryFilter::Favorites,
            other => CategoryFilter::Category(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_LABEL,
            CategoryFilter::Favorites => FAVORITES_LABEL,
            CategoryFilter::Category(name) => name,
        }
    }

    fn admits(&self, template: &Template) -> bool {
        match self {
            // Favorites are shown without further category narrowing
            CategoryFilter::All | CategoryFilter::Favorites => true,
            CategoryFilter::Category(name) => template.category == *name,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize raw search input: trimmed and lower-cased.
/// Returns None when nothing is left to match against.
pub fn normalize_search(raw: &str) -> Option<String> {
    let term = raw.trim().to_lowercase();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

/// Whether a template matches an already-normalized search term.
///
/// Title, description, long description, category or any tag may contain
/// the term.
pub fn matches_search(template: &Template, term: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(term);

    contains(template.title.as_str())
        || contains(template.description.as_str())
        || template.long_description.as_deref().is_some_and(contains)
        || contains(template.category.as_str())
        || template.tags.iter().any(|tag| contains(tag.as_str()))
}

/// Compute the visible list for the deck.
///
/// `favorites` is only consulted when the filter is `Favorites`.
pub fn visible_templates(
    catalog: &[Template],
    favorites: &[Template],
    filter: &CategoryFilter,
    search: &str,
) -> Vec<Template> {
    let base = match filter {
        CategoryFilter::Favorites => favorites,
        _ => catalog,
    };

    let term = normalize_search(search);

    base.iter()
        .filter(|template| filter.admits(template))
        .filter(|template| match &term {
            Some(term) => matches_search(template, term),
            None => true,
        })
        .cloned()
        .collect()
}

/// Options for the filter row: "All", "My Favorites" when signed in,
/// then each distinct category in order of first appearance.
pub fn category_options(catalog: &[Template], signed_in: bool) -> Vec<CategoryFilter> {
    let mut options = vec![CategoryFilter::All];
    if signed_in {
        options.push(CategoryFilter::Favorites);
    }

    for template in catalog {
        let candidate = CategoryFilter::Category(template.category.clone());
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::sample_template;
    use proptest::prelude::*;

    fn ids(list: &[Template]) -> Vec<&str> {
        list.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_category_filter_keeps_catalog_order() {
        let catalog = vec![
            sample_template("item0", "A", "First"),
            sample_template("item1", "B", "Second"),
            sample_template("item2", "A", "Third"),
        ];

        let visible = visible_templates(&catalog, &[], &CategoryFilter::from_label("A"), "");
        assert_eq!(ids(&visible), vec!["item0", "item2"]);
    }

    #[test]
    fn test_category_match_is_case_sensitive() {
        let catalog = vec![sample_template("t1", "Portfolio", "One")];

        let visible = visible_templates(&catalog, &[], &CategoryFilter::from_label("portfolio"), "");
        assert!(visible.is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut by_title = sample_template("title", "Web", "Online STORE front");
        by_title.description = "plain".into();
        let mut by_description = sample_template("desc", "Web", "Shop");
        by_description.description = "A Storefront kit".into();
        let mut by_long = sample_template("long", "Web", "Other");
        by_long.description = "plain".into();
        by_long.long_description = Some("Built for any store".into());
        let mut by_tag = sample_template("tag", "Web", "Tagged");
        by_tag.description = "plain".into();
        by_tag.tags = vec!["ecommerce".into(), "WebStore".into()];
        let mut unrelated = sample_template("none", "Web", "Blog");
        unrelated.description = "plain".into();

        let catalog = vec![by_title, by_description, by_long, by_tag, unrelated];
        let visible = visible_templates(&catalog, &[], &CategoryFilter::All, "  store ");
        assert_eq!(ids(&visible), vec!["title", "desc", "long", "tag"]);
    }

    #[test]
    fn test_search_matches_category_name() {
        let catalog = vec![
            sample_template("t1", "Dashboard", "Admin kit"),
            sample_template("t2", "Landing", "Hero"),
        ];
        let visible = visible_templates(&catalog, &[], &CategoryFilter::All, "dash");
        assert_eq!(ids(&visible), vec!["t1"]);
    }

    #[test]
    fn test_whitespace_search_is_no_narrowing() {
        let catalog = vec![
            sample_template("t1", "A", "One"),
            sample_template("t2", "B", "Two"),
        ];
        let visible = visible_templates(&catalog, &[], &CategoryFilter::All, "   \t ");
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_unknown_category_is_empty_not_error() {
        let catalog = vec![sample_template("t1", "A", "One")];
        let visible = visible_templates(&catalog, &[], &CategoryFilter::from_label("Z"), "");
        assert!(visible.is_empty());
    }

    #[test]
    fn test_favorites_with_no_favorites_is_empty() {
        let catalog = vec![sample_template("t1", "A", "One")];

        let favorites = visible_templates(&catalog, &[], &CategoryFilter::Favorites, "");
        assert!(favorites.is_empty());

        // "All" over the same catalog still shows it
        let all = visible_templates(&catalog, &[], &CategoryFilter::All, "");
        assert_eq!(all.len(), 1);

        // and "All" over an empty catalog is empty too
        assert!(visible_templates(&[], &[], &CategoryFilter::All, "").is_empty());
    }

    #[test]
    fn test_favorites_ignore_category_but_honor_search() {
        let catalog = vec![sample_template("t1", "A", "One")];
        let favorites = vec![
            sample_template("f1", "A", "Alpha"),
            sample_template("f2", "B", "Beta"),
        ];

        let visible = visible_templates(&catalog, &favorites, &CategoryFilter::Favorites, "");
        assert_eq!(ids(&visible), vec!["f1", "f2"]);

        let visible = visible_templates(&catalog, &favorites, &CategoryFilter::Favorites, "beta");
        assert_eq!(ids(&visible), vec!["f2"]);
    }

    #[test]
    fn test_label_round_trip_for_reserved_values() {
        assert_eq!(CategoryFilter::from_label("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_label("My Favorites"), CategoryFilter::Favorites);
        assert_eq!(CategoryFilter::Favorites.to_string(), "My Favorites");
    }

    #[test]
    fn test_category_options_distinct_in_first_appearance_order() {
        let catalog = vec![
            sample_template("t1", "Landing", "One"),
            sample_template("t2", "Blog", "Two"),
            sample_template("t3", "Landing", "Three"),
        ];

        let signed_out = category_options(&catalog, false);
        assert_eq!(
            signed_out,
            vec![
                CategoryFilter::All,
                CategoryFilter::Category("Landing".into()),
                CategoryFilter::Category("Blog".into()),
            ]
        );

        let signed_in = category_options(&catalog, true);
        assert_eq!(signed_in[1], CategoryFilter::Favorites);
        assert_eq!(signed_in.len(), 4);
    }

    fn arb_catalog() -> impl Strategy<Value = Vec<Template>> {
        let categories = prop::sample::select(vec!["A", "B", "Web", "Blog"]);
        let words = prop::sample::select(vec!["store", "Store", "blog", "shop", "kit", "landing"]);
        prop::collection::vec((categories, words.clone(), words), 0..12).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (category, title, tag))| {
                    let mut t = sample_template(&format!("t{}", i), category, title);
                    t.tags = vec![tag.to_string()];
                    t
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_visible_is_ordered_subset_satisfying_predicates(
            catalog in arb_catalog(),
            label in prop::sample::select(vec!["All", "A", "B", "Web", "Missing"]),
            search in prop::sample::select(vec!["", " ", "store", "BLOG", "kit ", "zzz"]),
        ) {
            let filter = CategoryFilter::from_label(label);
            let visible = visible_templates(&catalog, &[], &filter, search);

            // subset, in catalog order
            let mut cursor = catalog.iter();
            for item in &visible {
                prop_assert!(cursor.any(|c| c == item));
            }

            let term = normalize_search(search);
            for item in &visible {
                if let CategoryFilter::Category(name) = &filter {
                    prop_assert_eq!(&item.category, name);
                }
                if let Some(term) = &term {
                    prop_assert!(matches_search(item, term));
                }
            }
        }

        #[test]
        fn prop_visible_is_idempotent(
            catalog in arb_catalog(),
            label in prop::sample::select(vec!["All", "A", "Blog"]),
            search in prop::sample::select(vec!["", "store", "shop"]),
        ) {
            let filter = CategoryFilter::from_label(label);
            let first = visible_templates(&catalog, &[], &filter, search);
            let second = visible_templates(&catalog, &[], &filter, search);
            prop_assert_eq!(first, second);
        }
    }
}
