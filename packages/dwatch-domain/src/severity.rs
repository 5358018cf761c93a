use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Sentiment input is cut to this many characters.
pub const SENTIMENT_MAX_CHARS: usize = 512;
/// Negative confidence strictly above this maps to [`Severity::High`].
pub const HIGH_SEVERITY_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Low,
	Medium,
	High,
}
impl Severity {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}

	pub fn from_sentiment(sentiment: &Sentiment) -> Self {
		match sentiment.polarity {
			Polarity::Negative if sentiment.confidence > HIGH_SEVERITY_CONFIDENCE => Self::High,
			Polarity::Negative => Self::Medium,
			Polarity::Positive => Self::Low,
		}
	}
}
impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Severity {
	type Err = ParseSeverityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			_ => Err(ParseSeverityError { raw: s.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized severity {raw:?}.")]
pub struct ParseSeverityError {
	pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
	Positive,
	Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
	pub polarity: Polarity,
	pub confidence: f32,
}

/// The prefix of `text` sent to the sentiment model.
pub fn sentiment_input(text: &str) -> &str {
	match text.char_indices().nth(SENTIMENT_MAX_CHARS) {
		Some((byte_idx, _)) => &text[..byte_idx],
		None => text,
	}
}
