//! Catalog loading and search.
//!
//! The catalog is fetched once at startup and treated as read-only for
//! the rest of the process lifetime. A fetch or parse failure yields an
//! empty catalog: searches simply return no matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One item record from the remote catalog.
///
/// The field names mirror the catalog JSON (`Id`, `name`, `Icon`); any
/// of them may be absent in a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item identifier, numeric or textual in the source JSON.
    #[serde(rename = "Id", default)]
    pub id: Option<ItemId>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Icon resource name.
    #[serde(rename = "Icon", default)]
    pub icon: Option<String>,
}

/// An item identifier as it appears in the catalog JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// Numeric identifier.
    Number(serde_json::Number),
    /// Textual identifier.
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => s.fmt(f),
        }
    }
}

impl CatalogItem {
    /// The identifier rendered as text (empty when absent).
    #[must_use]
    pub fn id_text(&self) -> String {
        self.id.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Whether any searchable field contains `needle`.
    ///
    /// `needle` must already be lowercased.
    fn matches(&self, needle: &str) -> bool {
        self.id_text().to_lowercase().contains(needle)
            || self
                .name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(needle)
            || self
                .icon
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(needle)
    }
}

/// Errors raised while loading the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP request itself failed.
    #[error("catalog request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The endpoint answered with a non-200 status.
    #[error("catalog endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    /// The body was not a JSON array of item records.
    #[error("catalog payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only snapshot of the remote item catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// An empty catalog; every search returns no matches.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from already-parsed items.
    #[must_use]
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Fetch and parse the catalog from `url`.
    ///
    /// One GET, no retry. The caller decides what a failure means; the
    /// bot startup path falls back to [`Catalog::empty`].
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] on network failure, a non-200 status,
    /// or a body that does not parse as an item array.
    pub async fn load(client: &reqwest::Client, url: &str) -> Result<Self, CatalogError> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CatalogError::Status(status));
        }
        let body = response.text().await?;
        let items: Vec<CatalogItem> = serde_json::from_str(&body)?;
        Ok(Self { items })
    }

    /// All items whose identifier, name, or icon contains `query`,
    /// case-insensitively, in catalog order.
    #[must_use]
    pub fn find(&self, query: &str) -> Vec<CatalogItem> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.matches(&needle))
            .cloned()
            .collect()
    }

    /// Number of items in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, name: &str) -> CatalogItem {
        CatalogItem {
            id: Some(ItemId::Number(serde_json::Number::from(id))),
            name: Some(name.to_string()),
            icon: None,
        }
    }

    #[test]
    fn test_two_item_catalog_matching() {
        let catalog = Catalog::from_items(vec![item(1, "Bunny Hat"), item(2, "Fox Mask")]);

        assert_eq!(catalog.find("bun"), vec![item(1, "Bunny Hat")]);
        // "bunny hat" and "fox mask" both contain an 'a'
        assert_eq!(
            catalog.find("a"),
            vec![item(1, "Bunny Hat"), item(2, "Fox Mask")]
        );
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = Catalog::from_items(vec![item(1, "Bunny Hat")]);

        assert_eq!(catalog.find("BUNNY").len(), 1);
        assert_eq!(catalog.find("bUnNy hAt").len(), 1);
    }

    #[test]
    fn test_find_matches_id_substring() {
        let catalog = Catalog::from_items(vec![item(909_050_011, "Bunny Hat")]);

        assert_eq!(catalog.find("9090").len(), 1);
        assert_eq!(catalog.find("50011").len(), 1);
        assert_eq!(catalog.find("777").len(), 0);
    }

    #[test]
    fn test_find_matches_icon_field() {
        let catalog = Catalog::from_items(vec![CatalogItem {
            id: Some(ItemId::Number(1.into())),
            name: None,
            icon: Some("Bunny_Hat_Icon".to_string()),
        }]);

        assert_eq!(catalog.find("hat_icon").len(), 1);
    }

    #[test]
    fn test_find_preserves_catalog_order() {
        let catalog = Catalog::from_items(vec![
            item(3, "Hat Three"),
            item(1, "Hat One"),
            item(2, "Hat Two"),
        ]);

        let found = catalog.find("hat");
        let names: Vec<_> = found.iter().filter_map(|i| i.name.as_deref()).collect();
        assert_eq!(names, vec!["Hat Three", "Hat One", "Hat Two"]);
    }

    #[test]
    fn test_empty_catalog_finds_nothing() {
        assert!(Catalog::empty().find("anything").is_empty());
        assert!(Catalog::empty().is_empty());
    }

    #[test]
    fn test_item_id_accepts_number_or_string() {
        let items: Vec<CatalogItem> =
            serde_json::from_str(r#"[{"Id": 909050011}, {"Id": "bundle_royale"}]"#)
                .expect("items parse");

        assert_eq!(items[0].id_text(), "909050011");
        assert_eq!(items[1].id_text(), "bundle_royale");
    }

    #[test]
    fn test_record_with_missing_fields() {
        let items: Vec<CatalogItem> = serde_json::from_str(r#"[{}]"#).expect("items parse");

        assert_eq!(items[0].id, None);
        assert_eq!(items[0].name, None);
        assert_eq!(items[0].icon, None);
        assert_eq!(items[0].id_text(), "");
    }
}
