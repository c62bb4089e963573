pub mod decode;
pub mod error;
pub mod fit;
pub mod merge;
pub mod placeholder;
pub mod replace;
pub mod structure;

pub use decode::{decode_image, DecodedImage};
pub use error::{ComposeError, ComposeResult, ErrorClass};
pub use fit::{fit_within, Dimensions, DEFAULT_IMAGE_BOUNDS};
pub use merge::{merge_document, merge_region, MergeDirective, MergePlan, MergeReport};
pub use placeholder::{locate_placeholder, PlaceholderMatcher, DEFAULT_PATTERN};
pub use replace::{ImageRule, ReplaceSummary, Replacer, ReplacementRule, TextRule};
pub use structure::{document_structure, region_structure, StructureEntry};
