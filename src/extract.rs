//! Page-level metadata extraction from `<meta>` tags.
//!
//! Extraction is driven by a [`MetaSchema`]: for each logical field it lists
//! the tag identifiers to try, highest priority first. A tag identifier is
//! compared case-insensitively against both the `property` and the `name`
//! attribute, so `og:title` matches `<meta property="og:title">` and
//! `description` matches `<meta name="description">`.
//!
//! [`extract_metadata`] is a pure function and reports unreadable bodies as
//! a [`ParseError`]. [`page_metadata`] is the lenient wrapper the pipeline
//! uses: it logs the error and yields empty fields instead.

use crate::error::ParseError;
use crate::models::PageMetadata;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("static selector"));

/// A logical field of [`PageMetadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaField {
    Title,
    Description,
    ContentType,
    CanonicalUrl,
}

/// Mapping from each field to its tag identifiers in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSchema {
    fields: HashMap<MetaField, Vec<String>>,
}

impl MetaSchema {
    /// A schema with no tags; every field extracts empty.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Set the tag priority list for `field`, replacing any previous one.
    pub fn with_field(mut self, field: MetaField, tags: &[&str]) -> Self {
        self.fields.insert(
            field,
            tags.iter().map(|tag| tag.to_ascii_lowercase()).collect(),
        );
        self
    }

    pub fn tags(&self, field: MetaField) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for MetaSchema {
    /// Open Graph tags, with `description` as the fallback for the description.
    fn default() -> Self {
        Self::empty()
            .with_field(MetaField::Title, &["og:title"])
            .with_field(MetaField::Description, &["og:description", "description"])
            .with_field(MetaField::ContentType, &["og:type"])
            .with_field(MetaField::CanonicalUrl, &["og:url"])
    }
}

/// Parse `body` for the tags named in `schema`.
///
/// Missing tags leave their fields empty. The only error is a binary body
/// (one containing NUL), such as an image served in place of a page.
pub fn extract_metadata(body: &str, schema: &MetaSchema) -> Result<PageMetadata, ParseError> {
    if let Some(offset) = body.find('\0') {
        return Err(ParseError::Binary { offset });
    }
    let values = collect_meta_values(&Html::parse_document(body));

    let lookup = |field: MetaField| -> String {
        schema
            .tags(field)
            .iter()
            .find_map(|tag| values.get(tag))
            .cloned()
            .unwrap_or_default()
    };

    let mut canonical_url = lookup(MetaField::CanonicalUrl);
    if !canonical_url.is_empty()
        && let Err(e) = Url::parse(&canonical_url)
    {
        warn!(value = %canonical_url, error = %e, "Ignoring canonical URL that does not parse");
        canonical_url.clear();
    }

    Ok(PageMetadata {
        title: lookup(MetaField::Title),
        description: lookup(MetaField::Description),
        content_type: lookup(MetaField::ContentType),
        canonical_url,
    })
}

/// [`extract_metadata`] for a fetched page, absorbing parse errors.
pub fn page_metadata(url: &str, body: &str, schema: &MetaSchema) -> PageMetadata {
    match extract_metadata(body, schema) {
        Ok(metadata) => {
            debug!(
                %url,
                title = %metadata.title,
                canonical_url = %metadata.canonical_url,
                "Extracted page metadata"
            );
            metadata
        }
        Err(e) => {
            warn!(%url, error = %e, "Could not parse page for metadata; leaving fields empty");
            PageMetadata::default()
        }
    }
}

/// Map of lowercased tag identifier to trimmed content, first occurrence wins.
fn collect_meta_values(document: &Html) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for meta in document.select(&META_SELECTOR) {
        let element = meta.value();
        let content = element.attr("content").unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        // `property` may hold several space-separated identifiers.
        let keys = element
            .attr("property")
            .into_iter()
            .flat_map(str::split_whitespace)
            .chain(element.attr("name").map(str::trim));
        for key in keys {
            if key.is_empty() {
                continue;
            }
            values
                .entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.to_string());
        }
    }

    values
}
