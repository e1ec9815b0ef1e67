//! Data model for the publishing pipeline

pub mod artifact;
pub mod publish_result;
pub mod session;

pub use artifact::{normalized_ext, ArtifactRole, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use publish_result::PublishedExperience;
pub use session::{part_path, PublishSession, PublishState, StageOutcome, StageOutcomes};
