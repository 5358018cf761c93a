use regex::Regex;

use crate::DisasterType;

/// At most this many categories survive a synonym match.
pub const MAX_MATCHES: usize = 2;

/// Keyword and phrase aliases for each canonical category.
pub const BUILTIN_SYNONYMS: &[(&str, DisasterType)] = &[
	("quake", DisasterType::Earthquake),
	("tremor", DisasterType::Earthquake),
	("aftershock", DisasterType::Earthquake),
	("seismic", DisasterType::Earthquake),
	("richter", DisasterType::Earthquake),
	("shock", DisasterType::Earthquake),
	("flash flood", DisasterType::Flood),
	("deluge", DisasterType::Flood),
	("inundation", DisasterType::Flood),
	("overflow", DisasterType::Flood),
	("swamped", DisasterType::Flood),
	("flooding", DisasterType::Flood),
	("torrent", DisasterType::Flood),
	("hurricane", DisasterType::Cyclone),
	("typhoon", DisasterType::Cyclone),
	("storm", DisasterType::Cyclone),
	("superstorm", DisasterType::Cyclone),
	("gale", DisasterType::Cyclone),
	("monsoon", DisasterType::Cyclone),
	("cyclonic", DisasterType::Cyclone),
	("tropical storm", DisasterType::Cyclone),
	("bushfire", DisasterType::Wildfire),
	("forest fire", DisasterType::Wildfire),
	("wild fire", DisasterType::Wildfire),
	("firestorm", DisasterType::Wildfire),
	("blaze", DisasterType::Wildfire),
	("grassfire", DisasterType::Wildfire),
	("mudslide", DisasterType::Landslide),
	("rockslide", DisasterType::Landslide),
	("debris flow", DisasterType::Landslide),
	("avalanche", DisasterType::Landslide),
	("landslip", DisasterType::Landslide),
	("earth slip", DisasterType::Landslide),
	("eruption", DisasterType::Volcano),
	("lava", DisasterType::Volcano),
	("pyroclastic", DisasterType::Volcano),
	("magma", DisasterType::Volcano),
	("ash cloud", DisasterType::Volcano),
	("volcanic", DisasterType::Volcano),
	("dry spell", DisasterType::Drought),
	("water scarcity", DisasterType::Drought),
	("famine", DisasterType::Drought),
	("arid", DisasterType::Drought),
	("desertification", DisasterType::Drought),
	("heatwave", DisasterType::Drought),
	("droughts", DisasterType::Drought),
	("parched", DisasterType::Drought),
	("tidal wave", DisasterType::Tsunami),
	("seismic sea wave", DisasterType::Tsunami),
	("giant wave", DisasterType::Tsunami),
	("ocean surge", DisasterType::Tsunami),
	("tsunami waves", DisasterType::Tsunami),
];

/// Deterministic keyword resolver from free text to canonical categories.
///
/// Synonyms are tried longest first and a matched phrase is masked out of the text, so a short
/// synonym never fires inside a longer one ("seismic" inside "seismic sea wave"). Canonical
/// names are then tested on the unmasked text. Results keep first-seen order and are cut to
/// [`MAX_MATCHES`].
#[derive(Debug, Clone)]
pub struct SynonymMatcher {
	synonyms: Vec<(Regex, DisasterType)>,
	canonical: Vec<(Regex, DisasterType)>,
}
impl SynonymMatcher {
	pub fn new(table: &[(&str, DisasterType)]) -> Result<Self, regex::Error> {
		let mut phrases: Vec<(String, DisasterType)> = table
			.iter()
			.map(|(phrase, category)| (normalize_text(phrase), *category))
			.filter(|(phrase, _)| !phrase.is_empty())
			.collect();

		phrases.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
		phrases.dedup_by(|(a, _), (b, _)| a == b);

		let synonyms = phrases
			.into_iter()
			.map(|(phrase, category)| Ok((word_pattern(&phrase)?, category)))
			.collect::<Result<Vec<_>, regex::Error>>()?;
		let canonical = DisasterType::CANONICAL
			.into_iter()
			.map(|category| Ok((word_pattern(category.as_str())?, category)))
			.collect::<Result<Vec<_>, regex::Error>>()?;

		Ok(Self { synonyms, canonical })
	}

	pub fn builtin() -> Result<Self, regex::Error> {
		Self::new(BUILTIN_SYNONYMS)
	}

	/// Returns up to two categories found in `text`, or an empty vec when nothing matches.
	pub fn resolve(&self, text: &str) -> Vec<DisasterType> {
		let normalized = normalize_text(text);

		if normalized.is_empty() {
			return Vec::new();
		}

		let mut found = Vec::with_capacity(MAX_MATCHES);
		let mut masked = normalized.clone();

		for (pattern, category) in &self.synonyms {
			let spans: Vec<(usize, usize)> =
				pattern.find_iter(&masked).map(|m| (m.start(), m.end())).collect();

			if spans.is_empty() {
				continue;
			}

			push_unique(&mut found, *category);

			for (start, end) in spans {
				masked.replace_range(start..end, &" ".repeat(end - start));
			}
		}
		for (pattern, category) in &self.canonical {
			if pattern.is_match(&normalized) {
				push_unique(&mut found, *category);
			}
		}

		found.truncate(MAX_MATCHES);

		found
	}
}

/// Lowercases, replaces anything outside `[a-z0-9]` with a space, and collapses whitespace.
pub fn normalize_text(text: &str) -> String {
	let mapped: String = text
		.to_lowercase()
		.chars()
		.map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
		.collect();

	mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn word_pattern(phrase: &str) -> Result<Regex, regex::Error> {
	Regex::new(&format!(r"\b{}\b", regex::escape(phrase)))
}

fn push_unique(found: &mut Vec<DisasterType>, category: DisasterType) {
	if !found.contains(&category) {
		found.push(category);
	}
}
