pub mod builders;
pub mod calculators;
pub mod config;
pub mod constants;
pub mod utils;

pub use builders::*;
pub use calculators::*;
pub use config::*;
pub use constants::*;
pub use utils::*;
