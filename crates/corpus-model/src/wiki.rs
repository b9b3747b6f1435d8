use crate::Locale;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric page identifier.
///
/// The encyclopedia API uses these as object keys, so on the wire a
/// `PageId` is an all-digit string. Ordering is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Parse an all-digit key. Signs, spaces and the `-1` used for missing
    /// pages are all rejected.
    pub fn parse(key: &str) -> Option<Self> {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        key.parse().ok().map(PageId)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PageIdVisitor;

        impl<'a> Visitor<'a> for PageIdVisitor {
            type Value = PageId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a numeric page id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PageId, E> {
                PageId::parse(v).ok_or_else(|| E::custom(format!("page id `{v}` is not numeric")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PageId, E> {
                Ok(PageId(v))
            }
        }

        deserializer.deserialize_str(PageIdVisitor)
    }
}

/// A locale paired with the article title used in that locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangLink {
    pub lang: Locale,
    #[serde(rename = "*")]
    pub title: String,
}

impl LangLink {
    pub fn new(lang: Locale, title: impl Into<String>) -> Self {
        Self {
            lang,
            title: title.into(),
        }
    }
}

/// Page metadata from a language-links query.
///
/// Fields the API sends beyond the ones named here are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    pub langlinks: Vec<LangLink>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangLinksQuery {
    pub pages: BTreeMap<PageId, PageRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `action=query&prop=langlinks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangLinksResponse {
    pub query: LangLinksQuery,
    /// Parameters for fetching the next batch of links, when the API truncated.
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LangLinksResponse {
    pub fn first_page(&self) -> Option<&PageRecord> {
        self.query.pages.values().next()
    }

    /// Fold a continuation batch into this response.
    ///
    /// Links for pages already present are appended in batch order; the
    /// continuation token is replaced by the batch's own.
    pub fn absorb(&mut self, batch: LangLinksResponse) {
        for (id, page) in batch.query.pages {
            match self.query.pages.get_mut(&id) {
                Some(existing) => existing.langlinks.extend(page.langlinks),
                None => {
                    self.query.pages.insert(id, page);
                }
            }
        }
        self.continuation = batch.continuation;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractPage {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    pub extract: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractQuery {
    pub pages: BTreeMap<PageId, ExtractPage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `action=query&prop=extracts&explaintext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub query: ExtractQuery,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextContent {
    /// Plain-text extract of the first page.
    pub fn extract(&self) -> Option<&str> {
        self.query.pages.values().next().map(|p| p.extract.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markup {
    #[serde(rename = "*")]
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPage {
    pub pageid: u64,
    pub title: String,
    pub text: Markup,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `action=parse&prop=text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlContent {
    pub parse: ParsedPage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HtmlContent {
    pub fn markup(&self) -> &str {
        &self.parse.text.markup
    }
}

/// Both renderings of one article in one locale, as cached in `<lang>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBundle {
    pub text: TextContent,
    pub html: HtmlContent,
}

/// Every page discovered across all canonical titles, keyed by page id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageBundle {
    pub pages: BTreeMap<PageId, PageRecord>,
}

impl PageBundle {
    /// Merge pages in; a page id seen before is overwritten.
    pub fn merge(&mut self, pages: BTreeMap<PageId, PageRecord>) {
        self.pages.extend(pages);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
