/// 用户账户 PDA: ["user_account", wallet]
pub const USER_ACCOUNT_SEED: &str = "user_account";
/// 程序 SOL 金库 PDA
pub const PROGRAM_SOL_VAULT_SEED: &str = "program_sol_vault";
/// 代币铸造权限 PDA
pub const TOKEN_MINT_AUTHORITY_SEED: &str = "token_mint_authority";
/// 代币金库权限 PDA
pub const TOKEN_VAULT_AUTHORITY_SEED: &str = "token_vault_authority";

/// 链上记录的最大上级数量
pub const MAX_UPLINE_DEPTH: usize = 6;
/// 每个矩阵的槽位数
pub const MATRIX_SLOT_COUNT: usize = 3;

// remaining_accounts 固定前缀
pub const VAULT_A_ACCOUNTS_COUNT: usize = 3;
pub const CHAINLINK_ACCOUNTS_COUNT: usize = 2;
/// 每个上级在 remaining_accounts 中占用 (pda, wallet, ata) 三个位置
pub const UPLINE_TRIO_SIZE: usize = 3;
