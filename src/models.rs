//! Data models carried through the resolution pipeline.
//!
//! - [`PageMetadata`]: descriptive tags parsed from a fetched page
//! - [`AuthorAttribution`]: author name resolved through a provider's oEmbed endpoint
//! - [`OEmbedInfo`]: the subset of an oEmbed response this tool reads
//! - [`OutputRecord`]: one row of the output table
//!
//! Two distinct placeholders are used for unavailable data. [`FIELD_SENTINEL`]
//! marks page fields of a URL whose fetch failed outright, while
//! [`NOT_RETRIEVABLE`] marks an author name that no provider could supply.

use serde::Deserialize;

/// Placeholder for page fields when the page itself could not be fetched.
pub const FIELD_SENTINEL: &str = "-";

/// Placeholder for an author name no provider could supply.
pub const NOT_RETRIEVABLE: &str = "not retrievable";

/// Descriptive metadata embedded in a page's `<meta>` tags.
///
/// Every field is best-effort: an absent tag leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// The page title (`og:title`).
    pub title: String,
    /// The page description (`og:description`, falling back to `description`).
    pub description: String,
    /// The declared content type (`og:type`).
    pub content_type: String,
    /// The canonical URL (`og:url`), empty unless it parsed as an absolute URL.
    pub canonical_url: String,
}

/// Author attribution for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorAttribution {
    pub author_name: String,
}

impl AuthorAttribution {
    /// The attribution used whenever no provider could name an author.
    pub fn not_retrievable() -> Self {
        Self {
            author_name: NOT_RETRIEVABLE.to_string(),
        }
    }

    pub fn is_retrieved(&self) -> bool {
        self.author_name != NOT_RETRIEVABLE
    }
}

impl Default for AuthorAttribution {
    fn default() -> Self {
        Self::not_retrievable()
    }
}

/// The fields of an oEmbed response used by this tool.
///
/// Providers return many more keys (`html`, `thumbnail_url`, ...); serde ignores them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OEmbedInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

/// One row of the output table, in column order.
///
/// `url` is always the input line verbatim, whatever happened downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub url: String,
    pub title: String,
    pub content_type: String,
    pub description: String,
    pub author_name: String,
}

impl OutputRecord {
    /// Merge the two independent metadata sources for `url` into a row.
    pub fn resolved(url: &str, page: PageMetadata, author: AuthorAttribution) -> Self {
        Self {
            url: url.to_string(),
            title: page.title,
            content_type: page.content_type,
            description: page.description,
            author_name: author.author_name,
        }
    }

    /// The degraded row written when the page fetch itself failed.
    ///
    /// The failure message takes the title column; the author column stays empty.
    pub fn fetch_failed(url: &str, message: &str) -> Self {
        Self {
            url: url.to_string(),
            title: message.to_string(),
            content_type: FIELD_SENTINEL.to_string(),
            description: FIELD_SENTINEL.to_string(),
            author_name: String::new(),
        }
    }

    /// The row as CSV columns: URL, Title, ContentType, Description, AuthorName.
    pub fn as_row(&self) -> [&str; 5] {
        [
            &self.url,
            &self.title,
            &self.content_type,
            &self.description,
            &self.author_name,
        ]
    }
}
