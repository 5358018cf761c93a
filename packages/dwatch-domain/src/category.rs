use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
	Earthquake,
	Flood,
	Cyclone,
	Wildfire,
	Landslide,
	Volcano,
	Drought,
	Tsunami,
	Unknown,
}
impl DisasterType {
	/// The canonical taxonomy, in the order categories are fetched and matched.
	pub const CANONICAL: [Self; 8] = [
		Self::Earthquake,
		Self::Flood,
		Self::Cyclone,
		Self::Wildfire,
		Self::Landslide,
		Self::Volcano,
		Self::Drought,
		Self::Tsunami,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Earthquake => "earthquake",
			Self::Flood => "flood",
			Self::Cyclone => "cyclone",
			Self::Wildfire => "wildfire",
			Self::Landslide => "landslide",
			Self::Volcano => "volcano",
			Self::Drought => "drought",
			Self::Tsunami => "tsunami",
			Self::Unknown => "unknown",
		}
	}

	pub fn is_unknown(self) -> bool {
		matches!(self, Self::Unknown)
	}
}
impl fmt::Display for DisasterType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for DisasterType {
	type Err = ParseDisasterTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();

		Self::CANONICAL
			.into_iter()
			.chain([Self::Unknown])
			.find(|category| category.as_str() == normalized)
			.ok_or_else(|| ParseDisasterTypeError { raw: s.to_string() })
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized disaster type {raw:?}.")]
pub struct ParseDisasterTypeError {
	pub raw: String,
}

/// The value stored when no category could be resolved.
pub fn unknown_only() -> Vec<DisasterType> {
	vec![DisasterType::Unknown]
}

/// True when a resolution produced nothing useful and cheaper fallbacks should be retried.
pub fn is_unresolved(categories: &[DisasterType]) -> bool {
	categories.is_empty() || categories == [DisasterType::Unknown]
}
