pub mod constants;
pub mod instructions;
pub mod states;

use anchor_lang::prelude::*;

declare_id!("2wFmCLVQ8pSF2aKu43gLv2vzasUHhtmAA9HffBDXcRfF");

/// 与 Anchor `#[program]` 生成的模块同名，调用方式保持一致:
/// `matrix_state::accounts::RegisterWithSolDeposit { .. }` /
/// `matrix_state::instruction::RegisterWithSolDeposit { .. }`
pub mod accounts {
    pub use crate::instructions::register_with_sol_deposit::RegisterWithSolDepositAccounts as RegisterWithSolDeposit;
}

pub mod instruction {
    pub use crate::instructions::register_with_sol_deposit::RegisterWithSolDepositArgs as RegisterWithSolDeposit;
}
