use crate::{DisasterType, category};

pub const DEFAULT_PRIMARY_THRESHOLD: f32 = 0.25;
pub const DEFAULT_SECONDARY_THRESHOLD: f32 = 0.15;
pub const MAX_LABELS: usize = 2;

/// Two-pass confidence cascade applied to a classifier's ranked labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
	pub primary_threshold: f32,
	pub secondary_threshold: f32,
}
impl SelectionPolicy {
	pub fn new(primary_threshold: f32, secondary_threshold: f32) -> Self {
		Self { primary_threshold, secondary_threshold }
	}

	/// Picks at most two categories from `ranked`.
	///
	/// The first pass accepts labels at or above the primary threshold; if fewer than two were
	/// accepted, a second pass fills up with labels at or above the secondary threshold. Labels
	/// outside the canonical taxonomy and non-finite scores are ignored. An empty selection
	/// becomes `[Unknown]`.
	pub fn select(&self, ranked: &[(String, f32)]) -> Vec<DisasterType> {
		let mut candidates: Vec<(DisasterType, f32)> = ranked
			.iter()
			.filter(|(_, score)| score.is_finite())
			.filter_map(|(label, score)| {
				let parsed = label.parse::<DisasterType>().ok()?;

				(!parsed.is_unknown()).then_some((parsed, *score))
			})
			.collect();

		// Providers are expected to rank already; a stable re-sort keeps their tie order.
		candidates.sort_by(|(_, a), (_, b)| b.total_cmp(a));

		let mut accepted = Vec::with_capacity(MAX_LABELS);

		for threshold in [self.primary_threshold, self.secondary_threshold] {
			for (category, score) in &candidates {
				if accepted.len() == MAX_LABELS {
					break;
				}
				if *score >= threshold && !accepted.contains(category) {
					accepted.push(*category);
				}
			}
		}

		if accepted.is_empty() { category::unknown_only() } else { accepted }
	}
}
impl Default for SelectionPolicy {
	fn default() -> Self {
		Self::new(DEFAULT_PRIMARY_THRESHOLD, DEFAULT_SECONDARY_THRESHOLD)
	}
}
