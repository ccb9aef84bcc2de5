use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use matrix_state::constants::{PROGRAM_SOL_VAULT_SEED, TOKEN_MINT_AUTHORITY_SEED, TOKEN_VAULT_AUTHORITY_SEED, USER_ACCOUNT_SEED};

/// PDA计算器 - 统一管理地址推导
///
/// 所有方法都是纯函数: 相同输入永远得到相同地址，不访问网络。
pub struct PDACalculator;

impl PDACalculator {
    /// 通用推导: (seed 标签, 所属程序, 可选的附加 key) -> 地址
    pub fn derive_address(seed_labels: &[&[u8]], program_id: &Pubkey, extra_key: Option<&Pubkey>) -> (Pubkey, u8) {
        let mut seeds: Vec<&[u8]> = seed_labels.to_vec();
        if let Some(key) = extra_key {
            seeds.push(key.as_ref());
        }
        Pubkey::find_program_address(&seeds, program_id)
    }

    /// 用户账户PDA: ["user_account", wallet]
    pub fn calculate_user_account_pda(program_id: &Pubkey, wallet: &Pubkey) -> (Pubkey, u8) {
        Self::derive_address(&[USER_ACCOUNT_SEED.as_bytes()], program_id, Some(wallet))
    }

    pub fn calculate_program_sol_vault_pda(program_id: &Pubkey) -> (Pubkey, u8) {
        Self::derive_address(&[PROGRAM_SOL_VAULT_SEED.as_bytes()], program_id, None)
    }

    pub fn calculate_token_mint_authority_pda(program_id: &Pubkey) -> (Pubkey, u8) {
        Self::derive_address(&[TOKEN_MINT_AUTHORITY_SEED.as_bytes()], program_id, None)
    }

    pub fn calculate_vault_authority_pda(program_id: &Pubkey) -> (Pubkey, u8) {
        Self::derive_address(&[TOKEN_VAULT_AUTHORITY_SEED.as_bytes()], program_id, None)
    }

    /// 关联代币账户(ATA): 只由 (mint, wallet) 决定
    pub fn calculate_associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(wallet, mint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_account_pda_uses_wallet_seed() {
        let program_id = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();

        let (pda, bump) = PDACalculator::calculate_user_account_pda(&program_id, &wallet);
        let (expected, expected_bump) = Pubkey::find_program_address(&[b"user_account", wallet.as_ref()], &program_id);

        assert_eq!(pda, expected);
        assert_eq!(bump, expected_bump);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let program_id = Pubkey::new_unique();
        let first = PDACalculator::calculate_vault_authority_pda(&program_id);
        let second = PDACalculator::calculate_vault_authority_pda(&program_id);
        assert_eq!(first, second);

        // 不同 seed 得到不同地址
        assert_ne!(first.0, PDACalculator::calculate_token_mint_authority_pda(&program_id).0);
        assert_ne!(first.0, PDACalculator::calculate_program_sol_vault_pda(&program_id).0);
    }

    #[test]
    fn test_extra_key_changes_address() {
        let program_id = Pubkey::new_unique();
        let (without_key, _) = PDACalculator::derive_address(&[b"user_account"], &program_id, None);
        let (with_key, _) = PDACalculator::derive_address(&[b"user_account"], &program_id, Some(&Pubkey::new_unique()));
        assert_ne!(without_key, with_key);
    }
}
