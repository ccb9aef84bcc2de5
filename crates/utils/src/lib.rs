pub mod config;
pub mod logger;
pub mod solana;

pub use config::EnvLoader;
pub use config::*;
pub use logger::*;
pub use solana::*;
