pub mod connections;
pub mod util;
