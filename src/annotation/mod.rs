//! GTF annotation records: attribute tokenization, record model, and indices.

pub mod attrs;
pub mod extract;
pub mod ids;
pub mod index;
pub mod reader;
pub mod record;

pub use attrs::{AttributeValue, Attributes, Dialect, Grammar};
pub use extract::Source;
pub use ids::TranscriptId;
pub use index::{AnnotationIndex, Insertion};
pub use reader::GtfReader;
pub use record::{CanonicalRecord, FeatureRecord, FeatureType, Strand};
