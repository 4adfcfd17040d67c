mod combinations;
mod max_score;

pub use combinations::*;
pub use max_score::*;
