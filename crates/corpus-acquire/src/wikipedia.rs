use crate::http::ApiClient;
use crate::output::{self, Progress};
use crate::report::{labeled, RunReport};
use anyhow::{Context, Result};
use corpus_model::{
    HtmlContent, LangLink, LangLinksResponse, Locale, PageBundle, PageId, PageRecord, TextContent,
};
use futures::future::{join_all, try_join_all};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// API endpoint; `{lang}` is replaced by the locale code.
pub const DEFAULT_API_URL: &str = "https://{lang}.wikipedia.org/w/api.php";
pub const BASE_LOCALE: &str = "en";
pub const MANIFEST_FILE: &str = "lang-links.json";

/// Mostly articles written in the greatest number of languages.
pub const TITLES: &[&str] = &[
    "Lorem ipsum",
    "Gravity",
    "Earth",
    "Philosophy",
    "Music",
    "Albert Einstein",
    "Eye",
    "Alphabet",
    "Love",
    "Wikipedia",
    "Language",
];

const LANG_LINK_LIMIT: &str = "500";

#[derive(Debug, Clone)]
pub struct EncyclopediaConfig {
    pub api_url: String,
    pub base_locale: Locale,
    pub titles: Vec<String>,
    /// Root of the encyclopedia cache; each title gets a subdirectory.
    pub cache_dir: PathBuf,
}

impl EncyclopediaConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_locale: Locale::parse(BASE_LOCALE)?,
            titles: TITLES.iter().map(|t| t.to_string()).collect(),
            cache_dir: cache_dir.into(),
        })
    }

    pub fn title_dir(&self, title: &str) -> PathBuf {
        self.cache_dir.join(title)
    }

    /// Check every configured title can name its own cache directory.
    pub fn check_titles(&self) -> Result<()> {
        self.titles.iter().try_for_each(|t| check_title(t))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cache_dir.join(MANIFEST_FILE)
    }

    /// Build a query URL against `locale`'s API with the common parameters
    /// followed by `params`.
    pub fn query_url(&self, locale: &Locale, params: &[(&str, &str)]) -> Result<Url> {
        let endpoint = self.api_url.replace("{lang}", locale.as_str());
        let mut url =
            Url::parse(&endpoint).with_context(|| format!("Invalid API URL: {endpoint}"))?;
        url.query_pairs_mut()
            .append_pair("origin", "*")
            .append_pair("format", "json")
            .extend_pairs(params);
        Ok(url)
    }
}

/// A title names a directory directly under the cache root, so it must not
/// be empty, contain a path separator, or be `.` or `..`.
pub fn check_title(title: &str) -> Result<()> {
    anyhow::ensure!(
        !title.trim().is_empty()
            && !title.contains(['/', '\\'])
            && title != "."
            && title != "..",
        "Title '{title}' cannot be used as a cache directory name"
    );
    Ok(())
}

/// A validated response kept together with the document the API sent, so
/// the cache can store it without reordering or dropping fields.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub content: T,
    pub document: Value,
}

/// Both renderings of one article in one locale.
#[derive(Debug, Clone)]
pub struct Article {
    pub text: Fetched<TextContent>,
    pub html: Fetched<HtmlContent>,
}

/// One of the three files cached per article and locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleFile {
    Json,
    Txt,
    Html,
}

impl ArticleFile {
    pub const ALL: [ArticleFile; 3] = [ArticleFile::Json, ArticleFile::Txt, ArticleFile::Html];

    /// Subdirectory name, which is also the file extension.
    pub fn kind(self) -> &'static str {
        match self {
            ArticleFile::Json => "json",
            ArticleFile::Txt => "txt",
            ArticleFile::Html => "html",
        }
    }

    pub fn path(self, title_dir: &Path, lang: &Locale) -> PathBuf {
        title_dir.join(self.kind()).join(format!("{lang}.{}", self.kind()))
    }

    fn render(self, article: &Article) -> Result<String> {
        match self {
            ArticleFile::Json => output::to_tab_json(&json!({
                "text": article.text.document,
                "html": article.html.document,
            })),
            ArticleFile::Txt => article
                .text
                .content
                .extract()
                .map(str::to_string)
                .context("Extract response has no pages"),
            ArticleFile::Html => Ok(article.html.content.markup().to_string()),
        }
    }
}

/// Query the base-locale API for every language variant of `title`,
/// following continuation batches until the list is complete.
pub async fn fetch_lang_links(
    client: &ApiClient,
    config: &EncyclopediaConfig,
    title: &str,
) -> Result<LangLinksResponse> {
    let params = [
        ("action", "query"),
        ("prop", "langlinks"),
        ("titles", title),
        ("lllimit", LANG_LINK_LIMIT),
    ];

    let url = config.query_url(&config.base_locale, &params)?;
    let mut response = corpus_validate::decode_lang_links(client.get_json(url).await?)
        .with_context(|| format!("Invalid language-links response for '{title}'"))?;

    while let Some(continuation) = response.continuation.clone() {
        let mut url = config.query_url(&config.base_locale, &params)?;
        for (key, value) in &continuation {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            url.query_pairs_mut().append_pair(key, &value);
        }
        tracing::debug!(title, url = %url, "Fetching further language links");

        let batch = corpus_validate::decode_lang_links(client.get_json(url).await?)
            .with_context(|| format!("Invalid language-links continuation for '{title}'"))?;
        anyhow::ensure!(
            batch.continuation.as_ref() != Some(&continuation),
            "Language-links continuation for '{title}' did not advance"
        );
        response.absorb(batch);
    }

    Ok(response)
}

pub async fn fetch_text_content(
    client: &ApiClient,
    config: &EncyclopediaConfig,
    link: &LangLink,
) -> Result<Fetched<TextContent>> {
    let url = config.query_url(
        &link.lang,
        &[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", ""),
            ("titles", link.title.as_str()),
        ],
    )?;
    let document = client.get_json(url).await?;
    let content = corpus_validate::decode_text_content(document.clone())
        .with_context(|| format!("Invalid extract response for '{}' [{}]", link.title, link.lang))?;
    Ok(Fetched { content, document })
}

pub async fn fetch_html_content(
    client: &ApiClient,
    config: &EncyclopediaConfig,
    link: &LangLink,
) -> Result<Fetched<HtmlContent>> {
    let url = config.query_url(
        &link.lang,
        &[("action", "parse"), ("page", link.title.as_str()), ("prop", "text")],
    )?;
    let document = client.get_json(url).await?;
    let content = corpus_validate::decode_html_content(document.clone())
        .with_context(|| format!("Invalid parse response for '{}' [{}]", link.title, link.lang))?;
    Ok(Fetched { content, document })
}

/// Every (locale, title) pair to fetch for `title`: the base locale first,
/// then the discovered links of the response's first page in order.
pub fn worklist(base: &Locale, title: &str, response: &LangLinksResponse) -> Vec<LangLink> {
    let discovered = response
        .first_page()
        .map(|page| page.langlinks.as_slice())
        .unwrap_or_default();

    std::iter::once(LangLink::new(base.clone(), title))
        .chain(discovered.iter().cloned())
        .collect()
}

/// Fetch every configured title in every language it exists in.
///
/// Files already on disk are skipped, so re-running only fills gaps. Titles
/// and their locales run concurrently; failures are recorded per unit. The
/// language-link manifest is written once everything has settled.
pub async fn acquire(config: &EncyclopediaConfig, client: &ApiClient) -> Result<RunReport> {
    config.check_titles()?;
    output::ensure_dirs(&config.cache_dir, &[]).await?;
    tracing::info!(
        titles = config.titles.len(),
        path = %config.cache_dir.display(),
        "Fetching encyclopedia articles"
    );

    let progress = Progress::default();
    let outcomes = join_all(
        config
            .titles
            .iter()
            .map(|title| acquire_title(client, config, &progress, title)),
    )
    .await;

    let mut bundle = PageBundle::default();
    let mut report = RunReport::default();
    for (title, outcome) in config.titles.iter().zip(outcomes) {
        match outcome {
            Ok(title_outcome) => {
                bundle.merge(title_outcome.pages);
                report.settle(title_outcome.results);
            }
            Err(error) => report.record(title.clone(), error),
        }
    }

    let manifest_path = config.manifest_path();
    let manifest = output::to_tab_json(&bundle)?;
    tokio::fs::write(&manifest_path, manifest)
        .await
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;
    tracing::info!(pages = bundle.len(), path = %manifest_path.display(), "Wrote language-link manifest");

    report.count_files(&progress);
    Ok(report)
}

struct TitleOutcome {
    pages: BTreeMap<PageId, PageRecord>,
    results: Vec<(String, Result<()>)>,
}

async fn acquire_title(
    client: &ApiClient,
    config: &EncyclopediaConfig,
    progress: &Progress,
    title: &str,
) -> Result<TitleOutcome> {
    let response = fetch_lang_links(client, config, title).await?;
    let links = worklist(&config.base_locale, title, &response);
    tracing::info!(title, variants = links.len(), "Discovered language variants");

    let title_dir = config.title_dir(title);
    output::ensure_dirs(&title_dir, &["json", "txt", "html"]).await?;

    let results = join_all(links.iter().map(|link| {
        labeled(
            format!("{title} [{}]", link.lang),
            acquire_article(client, config, progress, &title_dir, link),
        )
    }))
    .await;

    Ok(TitleOutcome {
        pages: response.query.pages,
        results,
    })
}

async fn acquire_article(
    client: &ApiClient,
    config: &EncyclopediaConfig,
    progress: &Progress,
    title_dir: &Path,
    link: &LangLink,
) -> Result<()> {
    let mut pending = Vec::new();
    for file in ArticleFile::ALL {
        let path = file.path(title_dir, &link.lang);
        if tokio::fs::try_exists(&path).await? {
            progress.skip(&path);
        } else {
            pending.push((file, path));
        }
    }
    if pending.is_empty() {
        return Ok(());
    }

    let (text, html) = tokio::try_join!(
        fetch_text_content(client, config, link),
        fetch_html_content(client, config, link),
    )?;
    let article = &Article { text, html };

    try_join_all(pending.iter().map(|(file, path)| async move {
        let contents = file.render(article)?;
        progress.write(path, &contents).await
    }))
    .await?;
    Ok(())
}
