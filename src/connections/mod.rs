pub mod category;
pub mod data;
pub mod lexical;
pub mod oracle;
pub mod partition;
pub mod prelude;
pub mod puzzle;
pub mod sim;
pub mod similarity;
pub mod solver;

pub use self::{
    category::*, data::*, lexical::*, oracle::*, partition::*, prelude::*, puzzle::*, sim::*,
    similarity::*, solver::*,
};
