pub mod features;
pub mod model;
pub mod ranker;

pub use features::DemandFeatures;
pub use model::{DemandModel, DemandScorer};
pub use ranker::{ZoneCandidate, ZoneRecommendation, ZoneRecommender};
