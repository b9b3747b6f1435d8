use crate::http::ApiClient;
use crate::normalize;
use crate::output::{self, Progress};
use crate::report::{labeled, RunReport};
use anyhow::{Context, Result};
use corpus_model::{Locale, Transcript};
use futures::future::join_all;
use reqwest::Url;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://www.ted.com";
pub const DEFAULT_TALK_ID: u32 = 1880;

/// Locales fetched for every talk.
pub const TALK_LOCALES: &[&str] = &[
    "id", "bs", "da", "de", "en", "es", "fr", "hr", "it", "sw", "lt", "hu", "nl", "nb", "pl",
    "pt-br", "pt", "ro", "sq", "sk", "fi", "sv", "vi", "tr", "cs", "el", "be", "mn", "ru", "sr",
    "uk", "bg", "mk", "hy", "he", "ar", "fa", "kmr", "ta", "th", "my", "zh-cn", "zh-tw", "ja",
    "ko",
];

#[derive(Debug, Clone)]
pub struct TranscriptConfig {
    /// Scheme and host of the transcript API.
    pub base_url: String,
    pub talk_id: u32,
    pub locales: Vec<Locale>,
    /// Root of the transcript cache; each talk gets a subdirectory.
    pub cache_dir: PathBuf,
}

impl TranscriptConfig {
    pub fn new(cache_dir: impl Into<PathBuf>, talk_id: u32) -> Result<Self> {
        let locales = TALK_LOCALES
            .iter()
            .map(|code| Locale::parse(code))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            talk_id,
            locales,
            cache_dir: cache_dir.into(),
        })
    }

    pub fn talk_dir(&self) -> PathBuf {
        self.cache_dir.join(self.talk_id.to_string())
    }

    pub fn transcript_url(&self, locale: &Locale) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/talks/{}/transcript.json", self.talk_id))
            .with_context(|| format!("Invalid transcript base URL: {base}"))?;
        url.query_pairs_mut().append_pair("language", locale.as_str());
        Ok(url)
    }
}

/// Fetch and validate one locale's transcript.
pub async fn fetch_transcript(
    client: &ApiClient,
    config: &TranscriptConfig,
    locale: &Locale,
) -> Result<Transcript> {
    let url = config.transcript_url(locale)?;
    tracing::debug!(url = %url, locale = %locale, "Fetching transcript");
    let value = client.get_json(url).await?;
    corpus_validate::decode_transcript(value)
        .with_context(|| format!("Invalid transcript response for locale {locale}"))
}

/// Fetch every configured locale of the talk and write `json/<locale>.json`
/// and `txt/<locale>.txt` under the talk directory.
///
/// The talk directory is emptied first. Locales are fetched concurrently
/// and a failing locale is recorded in the report without stopping the rest.
pub async fn acquire(config: &TranscriptConfig, client: &ApiClient) -> Result<RunReport> {
    let talk_dir = config.talk_dir();
    output::reset_dir(&talk_dir, &["json", "txt"]).await?;

    tracing::info!(
        talk_id = config.talk_id,
        locales = config.locales.len(),
        path = %talk_dir.display(),
        "Fetching transcripts"
    );

    let progress = Progress::default();
    let results = join_all(config.locales.iter().map(|locale| {
        labeled(
            locale.to_string(),
            acquire_locale(client, config, &talk_dir, &progress, locale),
        )
    }))
    .await;

    let mut report = RunReport::default();
    report.settle(results);
    report.count_files(&progress);
    Ok(report)
}

async fn acquire_locale(
    client: &ApiClient,
    config: &TranscriptConfig,
    talk_dir: &Path,
    progress: &Progress,
    locale: &Locale,
) -> Result<()> {
    let transcript = fetch_transcript(client, config, locale).await?;

    let json = output::to_tab_json(&transcript)?;
    let text = normalize::transcript_to_plain_text(&transcript, locale);

    let json_path = talk_dir.join("json").join(format!("{locale}.json"));
    let txt_path = talk_dir.join("txt").join(format!("{locale}.txt"));
    tokio::try_join!(
        progress.write(&json_path, &json),
        progress.write(&txt_path, &text),
    )?;

    tracing::debug!(
        locale = %locale,
        paragraphs = transcript.paragraphs.len(),
        cues = transcript.cue_count(),
        "Cached transcript"
    );
    Ok(())
}
