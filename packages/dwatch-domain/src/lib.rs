//! Decision logic for turning raw disaster reports into enriched, deduplicated records.
//!
//! Everything here is deterministic and free of I/O. External capabilities (classification,
//! entity recognition, geocoding, sentiment) feed their raw answers into these functions.

pub mod category;
pub mod classify;
pub mod document;
pub mod location;
pub mod merge;
pub mod record;
pub mod severity;
pub mod synonyms;
pub mod time_serde;

pub use category::{DisasterType, ParseDisasterTypeError};
pub use classify::SelectionPolicy;
pub use document::{IndexDocument, index_document};
pub use location::Entity;
pub use merge::{MergeOutcome, merge_records};
pub use record::{EnrichedRecord, GeoPoint, RawItem};
pub use severity::{ParseSeverityError, Polarity, Sentiment, Severity};
pub use synonyms::SynonymMatcher;
