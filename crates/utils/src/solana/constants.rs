/// Solana相关常量定义
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_COMMITMENT: &str = "confirmed";

// 矩阵推荐程序 (devnet)
pub const DEFAULT_MATRIX_PROGRAM_ID: &str = "2wFmCLVQ8pSF2aKu43gLv2vzasUHhtmAA9HffBDXcRfF";
pub const DEFAULT_TOKEN_MINT: &str = "3dCXCZd3cbKHT7jQSLzRNJQYu1zEzaD8FHi4MWHLX4DZ";
pub const DEFAULT_STATE_ADDRESS: &str = "2UndNrTvi635pfsM5TZQr9KnMMNS29Ry6mtSCjcBFUyc";

// Meteora 池子
pub const DEFAULT_POOL_ADDRESS: &str = "BEuzx33ecm4rtgjtB2bShqGco4zMkdr6ioyzPh6vY9ot";
pub const DEFAULT_VAULT_PROGRAM: &str = "24Uqj9JCLxUeoC3hGfh5W3s9FM9uCHDS2SG3LYwBpyTi";

// Vault A (DONUT)
pub const DEFAULT_A_VAULT_LP: &str = "BGh2tc4kagmEmVvaogdcAodVDvUxmXWivYL5kxwapm31";
pub const DEFAULT_A_VAULT_LP_MINT: &str = "Bk33KwVZ8hsgr3uSb8GGNJZpAEqH488oYPvoY5W9djVP";
pub const DEFAULT_A_TOKEN_VAULT: &str = "HoASBFustFYysd9aCu6M3G3kve88j22LAyTpvCNp5J65";

// Vault B (SOL)
pub const DEFAULT_B_VAULT: &str = "FERjPVNEa7Udq8CEv68h6tPL46Tq7ieE49HrE2wea3XT";
pub const DEFAULT_B_TOKEN_VAULT: &str = "HZeLxbZ9uHtSpwZC3LBr4Nubd14iHwz7bRSghRZf5VCG";
pub const DEFAULT_B_VAULT_LP_MINT: &str = "BvoAjwEDhpLzs3jtu4H72j96ShKT5rvZE9RP1vgpfSM";
pub const DEFAULT_B_VAULT_LP: &str = "8mNjx5Aww9DX33uFxZwqb7m2vhsavrxyzkME3hE63sT2";

// Chainlink (devnet)
pub const DEFAULT_CHAINLINK_PROGRAM: &str = "HEvSKofvBgfaexv23kMabbYqxasxU3mQ4ibBMEmJWHny";
pub const DEFAULT_SOL_USD_FEED: &str = "99B2bTijsU6f1GCT73HmdR7HCFFjGMBcPZY6jZ96ynrR";

// 注册参数
pub const DEFAULT_DEPOSIT_AMOUNT: u64 = 80_000_000; // 0.08 SOL
pub const DEFAULT_BALANCE_BUFFER: u64 = 30_000_000; // 手续费与租金预留
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;
pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 5_000; // micro-lamports
pub const DEFAULT_SEND_MAX_RETRIES: usize = 5;
pub const DEFAULT_SEND_RETRY_INTERVAL_MS: u64 = 500;
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 60;
