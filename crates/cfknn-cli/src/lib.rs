pub mod cli;
pub mod evaluate;
pub mod query;
pub mod util;
