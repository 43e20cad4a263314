// Image preparation stages
pub mod formats;
pub mod normalize;
pub mod transform;
pub mod variants;

// Reexport core functionality
pub use formats::{encode_jpeg, load_bitmap, HeifConverter};
pub use normalize::{normalize, FormatConverter};
pub use transform::{transform, transform_bitmap, CandidateImage, TransformSettings};
pub use variants::{generate_variants, CropMode, PreprocessOption, Rotation, VARIANT_COUNT};
