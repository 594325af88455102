use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_EMITEN_LEN: usize = 12;

/// Normalized issuer ticker (emiten), e.g. `BBCA`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Emiten(String);

impl Emiten {
    /// Parse and normalize a ticker to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyEmiten);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_EMITEN_LEN {
            return Err(ValidationError::EmitenTooLong {
                len,
                max: MAX_EMITEN_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphabetic() {
                return Err(ValidationError::EmitenInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::EmitenInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Split a ticker list separated by whitespace or commas.
    ///
    /// Returns `Ok(None)` when the input holds no tokens, so callers never
    /// build an empty membership filter.
    pub fn parse_list(input: &str) -> Result<Option<Vec<Self>>, ValidationError> {
        let tickers = input
            .split(|ch: char| ch.is_whitespace() || ch == ',')
            .filter(|token| !token.is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if tickers.is_empty() {
            Ok(None)
        } else {
            Ok(Some(tickers))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Emiten {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Emiten {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Emiten {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Emiten> for String {
    fn from(value: Emiten) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_emiten() {
        let parsed = Emiten::parse(" bbca ").expect("emiten should parse");
        assert_eq!(parsed.as_str(), "BBCA");
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Emiten::parse("1BBCA").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmitenInvalidStart { .. }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Emiten::parse("BB,CA").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmitenInvalidChar { .. }));
    }

    #[test]
    fn list_splits_on_any_whitespace() {
        let list = Emiten::parse_list("bbca  tlkm\tasii\n")
            .expect("list should parse")
            .expect("list should not be empty");
        let tickers: Vec<&str> = list.iter().map(Emiten::as_str).collect();
        assert_eq!(tickers, ["BBCA", "TLKM", "ASII"]);
    }

    #[test]
    fn whitespace_only_list_is_absent() {
        assert_eq!(Emiten::parse_list("   ").expect("parse"), None);
        assert_eq!(Emiten::parse_list("").expect("parse"), None);
        assert_eq!(Emiten::parse_list(" , ,").expect("parse"), None);
    }

    #[test]
    fn commas_separate_tickers_like_whitespace() {
        let list = Emiten::parse_list("BBCA, tlkm,")
            .expect("list should parse")
            .expect("list should not be empty");
        let tickers: Vec<&str> = list.iter().map(Emiten::as_str).collect();
        assert_eq!(tickers, ["BBCA", "TLKM"]);
    }
}
