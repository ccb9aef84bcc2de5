use anchor_lang::prelude::*;
use anchor_lang::{Discriminator, InstructionData};

/// `register_with_sol_deposit` 的具名账户，顺序必须与链上 `RegisterWithSolDeposit` 一致。
/// remaining_accounts 不在此处，由调用方追加。
#[derive(Debug, Clone)]
pub struct RegisterWithSolDepositAccounts {
    pub state: Pubkey,
    pub user_wallet: Pubkey,
    pub referrer: Pubkey,
    pub referrer_wallet: Pubkey,
    pub user: Pubkey,
    pub wsol_mint: Pubkey,
    pub pool: Pubkey,
    pub b_vault: Pubkey,
    pub b_token_vault: Pubkey,
    pub b_vault_lp_mint: Pubkey,
    pub b_vault_lp: Pubkey,
    pub vault_program: Pubkey,
    pub program_sol_vault: Pubkey,
    pub token_mint: Pubkey,
    pub program_token_vault: Pubkey,
    pub referrer_token_account: Pubkey,
    pub token_mint_authority: Pubkey,
    pub vault_authority: Pubkey,
    pub token_program: Pubkey,
    pub system_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub rent: Pubkey,
}

impl ToAccountMetas for RegisterWithSolDepositAccounts {
    fn to_account_metas(&self, is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.state, false),
            AccountMeta::new(self.user_wallet, is_signer.unwrap_or(true)),
            AccountMeta::new(self.referrer, false),
            AccountMeta::new(self.referrer_wallet, false),
            AccountMeta::new(self.user, false),
            AccountMeta::new_readonly(self.wsol_mint, false),
            AccountMeta::new(self.pool, false),
            AccountMeta::new(self.b_vault, false),
            AccountMeta::new(self.b_token_vault, false),
            AccountMeta::new(self.b_vault_lp_mint, false),
            AccountMeta::new(self.b_vault_lp, false),
            AccountMeta::new_readonly(self.vault_program, false),
            AccountMeta::new(self.program_sol_vault, false),
            AccountMeta::new(self.token_mint, false),
            AccountMeta::new(self.program_token_vault, false),
            AccountMeta::new(self.referrer_token_account, false),
            AccountMeta::new_readonly(self.token_mint_authority, false),
            AccountMeta::new_readonly(self.vault_authority, false),
            AccountMeta::new_readonly(self.token_program, false),
            AccountMeta::new_readonly(self.system_program, false),
            AccountMeta::new_readonly(self.associated_token_program, false),
            AccountMeta::new_readonly(self.rent, false),
        ]
    }
}

/// 指令参数
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq)]
pub struct RegisterWithSolDepositArgs {
    pub deposit_amount: u64,
}

impl Discriminator for RegisterWithSolDepositArgs {
    // sha256("global:register_with_sol_deposit")[..8]
    const DISCRIMINATOR: &'static [u8] = &[225, 36, 181, 137, 153, 105, 138, 171];
}

impl InstructionData for RegisterWithSolDepositArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_accounts() -> RegisterWithSolDepositAccounts {
        RegisterWithSolDepositAccounts {
            state: Pubkey::new_unique(),
            user_wallet: Pubkey::new_unique(),
            referrer: Pubkey::new_unique(),
            referrer_wallet: Pubkey::new_unique(),
            user: Pubkey::new_unique(),
            wsol_mint: Pubkey::new_unique(),
            pool: Pubkey::new_unique(),
            b_vault: Pubkey::new_unique(),
            b_token_vault: Pubkey::new_unique(),
            b_vault_lp_mint: Pubkey::new_unique(),
            b_vault_lp: Pubkey::new_unique(),
            vault_program: Pubkey::new_unique(),
            program_sol_vault: Pubkey::new_unique(),
            token_mint: Pubkey::new_unique(),
            program_token_vault: Pubkey::new_unique(),
            referrer_token_account: Pubkey::new_unique(),
            token_mint_authority: Pubkey::new_unique(),
            vault_authority: Pubkey::new_unique(),
            token_program: Pubkey::new_unique(),
            system_program: Pubkey::new_unique(),
            associated_token_program: Pubkey::new_unique(),
            rent: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_instruction_data_layout() {
        let data = RegisterWithSolDepositArgs { deposit_amount: 80_000_000 }.data();
        assert_eq!(data.len(), 16);
        assert_eq!(&data[..8], &[225, 36, 181, 137, 153, 105, 138, 171]);
        assert_eq!(&data[8..], &80_000_000u64.to_le_bytes());
    }

    #[test]
    fn test_only_user_wallet_signs() {
        let accounts = sample_accounts();
        let metas = accounts.to_account_metas(None);
        assert_eq!(metas.len(), 22);

        let signers: Vec<_> = metas.iter().filter(|m| m.is_signer).map(|m| m.pubkey).collect();
        assert_eq!(signers, vec![accounts.user_wallet]);

        // 程序与 sysvar 账户只读
        assert!(metas[18..].iter().all(|m| !m.is_writable));
        assert_eq!(metas[0].pubkey, accounts.state);
        assert_eq!(metas[15].pubkey, accounts.referrer_token_account);
    }
}
