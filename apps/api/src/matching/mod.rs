// Matching engine: normalization, the two scoring signals, fusion and ranking,
// and the refresh orchestrator that persists generations.

pub mod handlers;
pub mod normalize;
pub mod profile_text;
pub mod ranker;
pub mod refresh;
pub mod semantic;
pub mod skill_overlap;
