use anyhow::{Context, Result};
use corpus_model::{
    ArticleBundle, HtmlContent, LangLinksResponse, LocaleError, PageBundle, TextContent, Transcript,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

pub mod schemas;
pub mod shape;

pub use shape::Shape;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field {path}")]
    MissingField { path: String },

    #[error("{path}: expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: key '{key}' is not a numeric page id")]
    NonNumericKey { path: String, key: String },

    #[error("{path}: expected at least one page")]
    EmptyRecord { path: String },

    #[error("{path}: invalid locale code")]
    InvalidLocale {
        path: String,
        #[source]
        source: LocaleError,
    },

    #[error("shape matched but decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not a recognised cache file (expected paragraphs, text+html, or pages at the top level)")]
    UnknownDocument,
}

fn decode<T: DeserializeOwned>(value: Value, shape: Shape) -> Result<T, ValidationError> {
    shape.check(&value)?;
    Ok(serde_json::from_value(value)?)
}

pub fn decode_transcript(value: Value) -> Result<Transcript, ValidationError> {
    decode(value, schemas::transcript())
}

pub fn decode_lang_links(value: Value) -> Result<LangLinksResponse, ValidationError> {
    decode(value, schemas::lang_links())
}

pub fn decode_text_content(value: Value) -> Result<TextContent, ValidationError> {
    decode(value, schemas::text_content())
}

pub fn decode_html_content(value: Value) -> Result<HtmlContent, ValidationError> {
    decode(value, schemas::html_content())
}

/// What a cached JSON file turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheFile {
    Transcript { paragraphs: usize, cues: usize },
    Article { title: String, extract_chars: usize, markup_chars: usize },
    Manifest { pages: usize, lang_links: usize },
}

/// Validate a JSON file previously written to the cache.
///
/// The kind of file is picked from its top-level keys, then the whole
/// document is checked against that kind's shape.
pub fn validate(file_path: &str) -> Result<CacheFile> {
    let contents = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {file_path}"))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{file_path} is not valid JSON"))?;

    let kind = classify(value)
        .with_context(|| format!("{} failed validation", Path::new(file_path).display()))?;

    match &kind {
        CacheFile::Transcript { paragraphs, cues } => {
            tracing::info!(paragraphs, cues, "Transcript is valid");
        }
        CacheFile::Article { title, extract_chars, markup_chars } => {
            tracing::info!(title = %title, extract_chars, markup_chars, "Article bundle is valid");
        }
        CacheFile::Manifest { pages, lang_links } => {
            tracing::info!(pages, lang_links, "Language-link manifest is valid");
        }
    }

    Ok(kind)
}

fn classify(value: Value) -> Result<CacheFile, ValidationError> {
    let has = |key: &str| value.get(key).is_some();
    let (is_transcript, is_article, is_manifest) =
        (has("paragraphs"), has("text") && has("html"), has("pages"));

    if is_transcript {
        let transcript: Transcript = decode(value, schemas::transcript())?;
        Ok(CacheFile::Transcript {
            paragraphs: transcript.paragraphs.len(),
            cues: transcript.cue_count(),
        })
    } else if is_article {
        let article: ArticleBundle = decode(value, schemas::article_bundle())?;
        Ok(CacheFile::Article {
            title: article.html.parse.title.clone(),
            extract_chars: article.text.extract().map_or(0, |e| e.chars().count()),
            markup_chars: article.html.markup().chars().count(),
        })
    } else if is_manifest {
        let manifest: PageBundle = decode(value, schemas::manifest())?;
        Ok(CacheFile::Manifest {
            pages: manifest.len(),
            lang_links: manifest.pages.values().map(|p| p.langlinks.len()).sum(),
        })
    } else {
        Err(ValidationError::UnknownDocument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_response(extract: Option<&str>) -> Value {
        let mut page = json!({"pageid": 38579, "ns": 0, "title": "Gravity"});
        if let Some(e) = extract {
            page["extract"] = json!(e);
        }
        json!({"batchcomplete": "", "query": {"pages": {"38579": page}}})
    }

    fn parse_response() -> Value {
        json!({"parse": {"pageid": 38579, "title": "Gravity", "text": {"*": "<p>Gravity</p>"}}})
    }

    #[test]
    fn test_decode_transcript() {
        let transcript = decode_transcript(json!({
            "paragraphs": [{"cues": [{"time": 0, "text": "Hello   world"}]}]
        }))
        .unwrap();
        assert_eq!(transcript.paragraphs[0].cues[0].text, "Hello   world");
    }

    #[test]
    fn test_decode_transcript_rejects_bad_cue() {
        let err = decode_transcript(json!({"paragraphs": [{"cues": [{"time": 0}]}]})).unwrap_err();
        assert_eq!(err.to_string(), "missing required field $.paragraphs[0].cues[0].text");
    }

    #[test]
    fn test_missing_extract_names_the_field() {
        let err = decode_text_content(extract_response(None)).unwrap_err();
        assert_eq!(err.to_string(), "missing required field $.query.pages.38579.extract");
        assert!(decode_text_content(extract_response(Some("Gravity is..."))).is_ok());
    }

    #[test]
    fn test_missing_page_rejected() {
        let value = json!({"query": {"pages": {"-1": {"ns": 0, "title": "Nope", "missing": ""}}}});
        assert!(matches!(
            decode_text_content(value),
            Err(ValidationError::NonNumericKey { .. })
        ));
    }

    #[test]
    fn test_lang_links_locale_is_validated() {
        let value = json!({"query": {"pages": {"1": {
            "pageid": 1, "ns": 0, "title": "Gravity",
            "langlinks": [{"lang": "es", "*": "Gravedad"}, {"lang": "x/y", "*": "Bad"}]
        }}}});
        let err = decode_lang_links(value).unwrap_err();
        match &err {
            ValidationError::InvalidLocale { path, .. } => {
                assert_eq!(path, "$.query.pages.1.langlinks[1].lang");
            }
            other => panic!("unexpected error: {other}"),
        }

        // The locale cause appears once in the full chain.
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(
            chain,
            "$.query.pages.1.langlinks[1].lang: invalid locale code: locale code 'x/y' has an invalid subtag 'x/y'"
        );
    }

    #[test]
    fn test_lang_links_accept_long_subtags() {
        let value = json!({"query": {"pages": {"1": {
            "pageid": 1, "ns": 0, "title": "Earth",
            "langlinks": [{"lang": "es", "*": "Tierra"}, {"lang": "zh-classical", "*": "地球"}]
        }}}});
        let response = decode_lang_links(value).unwrap();
        let langs: Vec<_> = response.first_page().unwrap().langlinks.iter().map(|l| l.lang.as_str()).collect();
        assert_eq!(langs, vec!["es", "zh-classical"]);
    }

    #[test]
    fn test_decode_html_content() {
        let html = decode_html_content(parse_response()).unwrap();
        assert_eq!(html.markup(), "<p>Gravity</p>");
        assert!(decode_html_content(json!({"parse": {"pageid": 1, "title": "x"}})).is_err());
    }

    #[test]
    fn test_validate_cached_files() {
        let dir = tempfile::tempdir().unwrap();

        let transcript = dir.path().join("en.json");
        std::fs::write(&transcript, r#"{"paragraphs":[{"cues":[{"time":0,"text":"a"}]},{"cues":[]}]}"#).unwrap();
        assert_eq!(
            validate(transcript.to_str().unwrap()).unwrap(),
            CacheFile::Transcript { paragraphs: 2, cues: 1 }
        );

        let article = dir.path().join("es.json");
        let bundle = json!({"text": extract_response(Some("abc")), "html": parse_response()});
        std::fs::write(&article, bundle.to_string()).unwrap();
        assert_eq!(
            validate(article.to_str().unwrap()).unwrap(),
            CacheFile::Article { title: "Gravity".into(), extract_chars: 3, markup_chars: 14 }
        );

        let manifest = dir.path().join("lang-links.json");
        std::fs::write(&manifest, r#"{"pages":{}}"#).unwrap();
        assert_eq!(
            validate(manifest.to_str().unwrap()).unwrap(),
            CacheFile::Manifest { pages: 0, lang_links: 0 }
        );

        let other = dir.path().join("other.json");
        std::fs::write(&other, r#"{"foo":1}"#).unwrap();
        assert!(validate(other.to_str().unwrap()).is_err());
    }
}
