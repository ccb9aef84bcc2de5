pub mod register_with_sol_deposit;
pub use register_with_sol_deposit::*;
