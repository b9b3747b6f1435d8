use corpus_model::{Locale, Transcript};
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Languages written without spaces between words.
const COMPACT_SCRIPT_LANGUAGES: &[&str] = &["zh", "ja"];

/// The string placed between words and cues for `locale`: empty for
/// compact scripts (Chinese, Japanese), a single space otherwise.
pub fn word_joiner(locale: &Locale) -> &'static str {
    let language = locale.language();
    if COMPACT_SCRIPT_LANGUAGES
        .iter()
        .any(|l| l.eq_ignore_ascii_case(language))
    {
        ""
    } else {
        " "
    }
}

/// Replace every whitespace run with `joiner`.
pub fn collapse_whitespace(input: &str, joiner: &str) -> String {
    WHITESPACE.replace_all(input, joiner).into_owned()
}

/// Render a transcript as plain text.
///
/// Cues are collapsed and trimmed, empty ones dropped, and joined with the
/// locale's word joiner; paragraphs are separated by a blank line.
pub fn transcript_to_plain_text(transcript: &Transcript, locale: &Locale) -> String {
    let joiner = word_joiner(locale);

    transcript
        .paragraphs
        .iter()
        .map(|p| {
            p.cues
                .iter()
                .map(|c| collapse_whitespace(c.text.trim(), joiner))
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(joiner)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_model::{Cue, Paragraph};

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn transcript(paragraphs: &[&[&str]]) -> Transcript {
        Transcript {
            paragraphs: paragraphs
                .iter()
                .map(|cues| Paragraph {
                    cues: cues
                        .iter()
                        .enumerate()
                        .map(|(i, text)| Cue {
                            time: (i as u64 * 1000).into(),
                            text: text.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_word_joiner() {
        assert_eq!(word_joiner(&locale("zh-cn")), "");
        assert_eq!(word_joiner(&locale("zh-tw")), "");
        assert_eq!(word_joiner(&locale("ja")), "");
        assert_eq!(word_joiner(&locale("ZH-CN")), "");
        for code in ["en", "pt-br", "ko", "th", "ar", "kmr"] {
            assert_eq!(word_joiner(&locale(code)), " ", "{code}");
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Hello   world", " "), "Hello world");
        assert_eq!(collapse_whitespace("a\n\tb\u{3000}c", " "), "a b c");
        assert_eq!(collapse_whitespace("你好 世界", ""), "你好世界");
    }

    #[test]
    fn test_single_cue() {
        let t = transcript(&[&["Hello   world"]]);
        assert_eq!(transcript_to_plain_text(&t, &locale("en")), "Hello world");
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        let t = transcript(&[&["One", "two"], &["Three"], &["Four\nfive"]]);
        assert_eq!(
            transcript_to_plain_text(&t, &locale("en")),
            "One two\n\nThree\n\nFour five"
        );
    }

    #[test]
    fn test_compact_script_has_no_spaces() {
        let t = transcript(&[&["我们 今天", " 要讲"]]);
        assert_eq!(transcript_to_plain_text(&t, &locale("zh-cn")), "我们今天要讲");
    }

    #[test]
    fn test_no_doubled_joiners_or_extra_blank_lines() {
        let paragraphs: &[&[&str]] = &[
            &["  leading", "trailing  ", "   ", "", "mid  dle"],
            &["\n"],
            &["end"],
        ];
        let t = transcript(paragraphs);
        for code in ["en", "fr", "zh-cn", "ja"] {
            let text = transcript_to_plain_text(&t, &locale(code));
            assert!(!text.contains("  "), "{code}: {text:?}");
            assert_eq!(text.matches("\n\n").count(), paragraphs.len() - 1, "{code}");
        }
        assert_eq!(
            transcript_to_plain_text(&t, &locale("en")),
            "leading trailing mid dle\n\n\n\nend"
        );
    }
}
