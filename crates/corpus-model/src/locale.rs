use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("locale code is empty")]
    Empty,

    #[error("locale code '{code}' has an invalid subtag '{subtag}'")]
    InvalidSubtag { code: String, subtag: String },
}

/// A locale code such as `en`, `pt-br`, `zh-min-nan` or `zh-classical`.
///
/// Codes are `-`-separated, non-empty subtags of ASCII alphanumerics. Subtag
/// length is not limited since encyclopedia codes go past BCP 47's eight. That
/// keeps every `Locale` safe to use as a file name component as well as a
/// query parameter. The original casing is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(code: &str) -> Result<Self, LocaleError> {
        if code.is_empty() {
            return Err(LocaleError::Empty);
        }
        for subtag in code.split('-') {
            let valid =
                !subtag.is_empty() && subtag.chars().all(|c| c.is_ascii_alphanumeric());
            if !valid {
                return Err(LocaleError::InvalidSubtag {
                    code: code.to_string(),
                    subtag: subtag.to_string(),
                });
            }
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag (`zh` for `zh-cn`).
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}
