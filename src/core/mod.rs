//! Core feature-composition modules

pub mod composite;
pub mod indices;
pub mod optical;
pub mod radar;
pub mod sample;
pub mod stack;
pub mod terrain;
pub mod texture;

// Re-export main types
pub use optical::{OpticalFeatureBuilder, OpticalParams};
pub use radar::{RadarFeatureBuilder, RadarParams};
pub use sample::{random_split, FeatureTable, SampleExtractor, SamplingParams};
pub use stack::FeatureImage;
pub use terrain::{TerrainFeatureBuilder, TerrainParams};
pub use texture::{GlcmMetric, GlcmParams};
