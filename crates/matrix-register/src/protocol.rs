use solana_sdk::{pubkey::Pubkey, system_program, sysvar};
use tracing::debug;
use utils::{
    ConfigManager, PDACalculator, DEFAULT_A_TOKEN_VAULT, DEFAULT_A_VAULT_LP, DEFAULT_A_VAULT_LP_MINT, DEFAULT_B_TOKEN_VAULT,
    DEFAULT_B_VAULT, DEFAULT_B_VAULT_LP, DEFAULT_B_VAULT_LP_MINT, DEFAULT_CHAINLINK_PROGRAM, DEFAULT_POOL_ADDRESS,
    DEFAULT_SOL_USD_FEED, DEFAULT_VAULT_PROGRAM, SOL_MINT,
};

use crate::config::RegistrationSettings;
use crate::error::{RegistrationError, Result};

/// 注册指令用到的协议账户
///
/// 固定地址来自部署常量，PDA 与金库地址在构造时推导一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolAccounts {
    pub program_id: Pubkey,
    pub token_mint: Pubkey,
    pub state: Pubkey,
    pub wsol_mint: Pubkey,

    // Meteora 池子
    pub pool: Pubkey,
    pub vault_program: Pubkey,
    pub a_vault_lp: Pubkey,
    pub a_vault_lp_mint: Pubkey,
    pub a_token_vault: Pubkey,
    pub b_vault: Pubkey,
    pub b_token_vault: Pubkey,
    pub b_vault_lp_mint: Pubkey,
    pub b_vault_lp: Pubkey,

    // Chainlink
    pub sol_usd_feed: Pubkey,
    pub chainlink_program: Pubkey,

    // 推导地址
    pub program_sol_vault: Pubkey,
    pub token_mint_authority: Pubkey,
    pub vault_authority: Pubkey,
    pub program_token_vault: Pubkey,

    pub token_program: Pubkey,
    pub system_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub rent: Pubkey,
}

impl ProtocolAccounts {
    pub fn new(program_id: Pubkey, token_mint: Pubkey, state: Pubkey) -> Result<Self> {
        let (program_sol_vault, _) = PDACalculator::calculate_program_sol_vault_pda(&program_id);
        let (token_mint_authority, _) = PDACalculator::calculate_token_mint_authority_pda(&program_id);
        let (vault_authority, _) = PDACalculator::calculate_vault_authority_pda(&program_id);
        let program_token_vault = PDACalculator::calculate_associated_token_address(&vault_authority, &token_mint);

        let accounts = Self {
            program_id,
            token_mint,
            state,
            wsol_mint: fixed("WSOL Mint", SOL_MINT)?,
            pool: fixed("Pool", DEFAULT_POOL_ADDRESS)?,
            vault_program: fixed("Vault Program", DEFAULT_VAULT_PROGRAM)?,
            a_vault_lp: fixed("A Vault LP", DEFAULT_A_VAULT_LP)?,
            a_vault_lp_mint: fixed("A Vault LP Mint", DEFAULT_A_VAULT_LP_MINT)?,
            a_token_vault: fixed("A Token Vault", DEFAULT_A_TOKEN_VAULT)?,
            b_vault: fixed("B Vault", DEFAULT_B_VAULT)?,
            b_token_vault: fixed("B Token Vault", DEFAULT_B_TOKEN_VAULT)?,
            b_vault_lp_mint: fixed("B Vault LP Mint", DEFAULT_B_VAULT_LP_MINT)?,
            b_vault_lp: fixed("B Vault LP", DEFAULT_B_VAULT_LP)?,
            sol_usd_feed: fixed("SOL/USD Feed", DEFAULT_SOL_USD_FEED)?,
            chainlink_program: fixed("Chainlink Program", DEFAULT_CHAINLINK_PROGRAM)?,
            program_sol_vault,
            token_mint_authority,
            vault_authority,
            program_token_vault,
            token_program: spl_token::id(),
            system_program: system_program::id(),
            associated_token_program: spl_associated_token_account::id(),
            rent: sysvar::rent::id(),
        };

        debug!("🔑 Program SOL Vault: {}", accounts.program_sol_vault);
        debug!("🔑 Token Mint Authority: {}", accounts.token_mint_authority);
        debug!("🔑 Vault Authority: {}", accounts.vault_authority);
        debug!("🔑 Program Token Vault: {}", accounts.program_token_vault);

        Ok(accounts)
    }

    pub fn from_settings(settings: &RegistrationSettings) -> Result<Self> {
        Self::new(settings.program_id, settings.token_mint, settings.state_address)
    }

    /// 参与者的推荐账户地址: ["user_account", wallet]
    pub fn user_account_address(&self, wallet: &Pubkey) -> Pubkey {
        PDACalculator::calculate_user_account_pda(&self.program_id, wallet).0
    }

    /// 某钱包在代币 Mint 下的关联代币账户
    pub fn resource_account(&self, wallet: &Pubkey) -> Pubkey {
        PDACalculator::calculate_associated_token_address(wallet, &self.token_mint)
    }
}

fn fixed(field: &str, value: &str) -> Result<Pubkey> {
    ConfigManager::parse_pubkey(field, value).map_err(|e| RegistrationError::Config(e.to_string()))
}
