use serde::{Deserialize, Serialize};

/// A named entity as emitted by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
	pub text: String,
	pub entity_type: String,
}
impl Entity {
	pub fn new(text: impl Into<String>, entity_type: impl Into<String>) -> Self {
		Self { text: text.into(), entity_type: entity_type.into() }
	}

	/// Location and geo-political tags, with or without a BIO prefix.
	pub fn is_place(&self) -> bool {
		let tag = self.entity_type.trim();
		let tag = tag.strip_prefix("B-").or_else(|| tag.strip_prefix("I-")).unwrap_or(tag);

		tag.eq_ignore_ascii_case("LOC") || tag.eq_ignore_ascii_case("GPE")
	}
}

/// Text handed to entity recognition: non-empty title and description joined by a space.
pub fn location_query(title: &str, description: &str) -> Option<String> {
	let parts: Vec<&str> =
		[title, description].into_iter().map(str::trim).filter(|part| !part.is_empty()).collect();

	(!parts.is_empty()).then(|| parts.join(" "))
}

/// The first place entity in emission order, or `None`.
pub fn first_place(entities: &[Entity]) -> Option<String> {
	entities
		.iter()
		.filter(|entity| entity.is_place())
		.map(|entity| entity.text.trim())
		.find(|text| !text.is_empty())
		.map(str::to_string)
}
