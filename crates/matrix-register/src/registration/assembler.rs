use crate::error::{RegistrationError, Result};
use crate::ledger::BlockhashInfo;
use crate::protocol::ProtocolAccounts;
use anchor_lang::{InstructionData, ToAccountMetas};
use matrix_state::constants::{CHAINLINK_ACCOUNTS_COUNT, UPLINE_TRIO_SIZE, VAULT_A_ACCOUNTS_COUNT};
use solana_sdk::{
    message::AddressLookupTableAccount,
    instruction::{AccountMeta, Instruction},
    message::VersionedMessage,
    pubkey::Pubkey,
};
use tracing::{debug, info};
use utils::{AccountMetaBuilder, TransactionBuilder};

/// 价格源在 remaining_accounts 中的位置
pub const PRICE_FEED_INDEX: usize = VAULT_A_ACCOUNTS_COUNT;
pub const PRICE_FEED_PROGRAM_INDEX: usize = VAULT_A_ACCOUNTS_COUNT + 1;

/// 固定前缀长度: Vault A 3 个 + Chainlink 2 个
pub const FIXED_REMAINING_ACCOUNTS: usize = VAULT_A_ACCOUNTS_COUNT + CHAINLINK_ACCOUNTS_COUNT;

/// 组装 remaining_accounts
///
/// 顺序: A-vault LP, A-vault LP mint, A token vault (可写)，
/// SOL/USD feed, Chainlink program (只读)，之后是上级 trio (可写)。
pub fn build_remaining_accounts(protocol: &ProtocolAccounts, upline_accounts: &[Pubkey]) -> Result<Vec<AccountMeta>> {
    if upline_accounts.len() % UPLINE_TRIO_SIZE != 0 {
        return Err(RegistrationError::IntegrityViolation(upline_accounts.len()));
    }

    let mut accounts = Vec::with_capacity(FIXED_REMAINING_ACCOUNTS + upline_accounts.len());
    accounts.push(AccountMetaBuilder::writable(protocol.a_vault_lp, false));
    accounts.push(AccountMetaBuilder::writable(protocol.a_vault_lp_mint, false));
    accounts.push(AccountMetaBuilder::writable(protocol.a_token_vault, false));
    accounts.push(AccountMetaBuilder::readonly(protocol.sol_usd_feed, false));
    accounts.push(AccountMetaBuilder::readonly(protocol.chainlink_program, false));
    accounts.extend(AccountMetaBuilder::writable_remaining_accounts(upline_accounts));

    verify_fixed_prefix(&accounts, protocol)?;
    Ok(accounts)
}

/// 链上程序按位置读取价格源，位置错位会读到错误账户
pub fn verify_fixed_prefix(accounts: &[AccountMeta], protocol: &ProtocolAccounts) -> Result<()> {
    for (index, expected) in [
        (PRICE_FEED_INDEX, protocol.sol_usd_feed),
        (PRICE_FEED_PROGRAM_INDEX, protocol.chainlink_program),
    ] {
        match accounts.get(index) {
            Some(meta) if meta.pubkey == expected => {}
            Some(meta) => {
                return Err(RegistrationError::OrderMismatch {
                    index,
                    expected,
                    actual: meta.pubkey.to_string(),
                })
            }
            None => {
                return Err(RegistrationError::OrderMismatch {
                    index,
                    expected,
                    actual: "<缺失>".to_string(),
                })
            }
        }
    }
    Ok(())
}

/// 注册交易中与参与者相关的地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationParties {
    pub user_wallet: Pubkey,
    pub user_account: Pubkey,
    pub referrer_wallet: Pubkey,
    pub referrer_account: Pubkey,
    pub referrer_token_account: Pubkey,
}

/// `register_with_sol_deposit` 指令: 具名账户 + remaining_accounts
pub fn build_register_instruction(
    protocol: &ProtocolAccounts,
    parties: &RegistrationParties,
    deposit_amount: u64,
    remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
    let mut accounts = matrix_state::accounts::RegisterWithSolDeposit {
        state: protocol.state,
        user_wallet: parties.user_wallet,
        referrer: parties.referrer_account,
        referrer_wallet: parties.referrer_wallet,
        user: parties.user_account,
        wsol_mint: protocol.wsol_mint,
        pool: protocol.pool,
        b_vault: protocol.b_vault,
        b_token_vault: protocol.b_token_vault,
        b_vault_lp_mint: protocol.b_vault_lp_mint,
        b_vault_lp: protocol.b_vault_lp,
        vault_program: protocol.vault_program,
        program_sol_vault: protocol.program_sol_vault,
        token_mint: protocol.token_mint,
        program_token_vault: protocol.program_token_vault,
        referrer_token_account: parties.referrer_token_account,
        token_mint_authority: protocol.token_mint_authority,
        vault_authority: protocol.vault_authority,
        token_program: protocol.token_program,
        system_program: protocol.system_program,
        associated_token_program: protocol.associated_token_program,
        rent: protocol.rent,
    }
    .to_account_metas(None);
    accounts.extend(remaining_accounts);

    let data = matrix_state::instruction::RegisterWithSolDeposit { deposit_amount }.data();

    Instruction {
        program_id: protocol.program_id,
        accounts,
        data,
    }
}

/// 编译完成、等待签名的注册交易
#[derive(Debug, Clone)]
pub struct AssembledTransaction {
    pub message: VersionedMessage,
    pub blockhash: BlockhashInfo,
    pub remaining_accounts_len: usize,
}

/// 交易组装器
#[derive(Debug, Clone, Copy)]
pub struct TransactionAssembler {
    pub deposit_amount: u64,
    pub compute_unit_limit: u32,
    pub compute_unit_price: u64,
}

impl TransactionAssembler {
    /// 组装指令并编译为 V0 消息，全部指令在同一笔交易中原子执行
    pub fn assemble(
        &self,
        protocol: &ProtocolAccounts,
        parties: &RegistrationParties,
        upline_accounts: &[Pubkey],
        lookup_table: &AddressLookupTableAccount,
        blockhash: BlockhashInfo,
    ) -> Result<AssembledTransaction> {
        let remaining_accounts = build_remaining_accounts(protocol, upline_accounts)?;
        let remaining_accounts_len = remaining_accounts.len();
        info!(
            "🧩 remaining_accounts: {} 个 (固定 {} + 上级 {})",
            remaining_accounts_len,
            FIXED_REMAINING_ACCOUNTS,
            upline_accounts.len()
        );
        for (index, meta) in remaining_accounts.iter().enumerate() {
            debug!("  [{}] {} writable={}", index, meta.pubkey, meta.is_writable);
        }

        let [limit_ix, price_ix] =
            TransactionBuilder::create_compute_budget_instructions(self.compute_unit_limit, self.compute_unit_price);
        let register_ix = build_register_instruction(protocol, parties, self.deposit_amount, remaining_accounts);

        let message = TransactionBuilder::compile_v0_message(
            &[limit_ix, price_ix, register_ix],
            &parties.user_wallet,
            std::slice::from_ref(lookup_table),
            blockhash.blockhash,
        )?;
        debug!("V0 消息静态账户 {} 个", message.static_account_keys().len());

        Ok(AssembledTransaction {
            message,
            blockhash,
            remaining_accounts_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{compute_budget, hash::Hash};

    fn protocol() -> ProtocolAccounts {
        ProtocolAccounts::new(Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()).unwrap()
    }

    fn parties() -> RegistrationParties {
        RegistrationParties {
            user_wallet: Pubkey::new_unique(),
            user_account: Pubkey::new_unique(),
            referrer_wallet: Pubkey::new_unique(),
            referrer_account: Pubkey::new_unique(),
            referrer_token_account: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_fixed_prefix_layout() {
        let protocol = protocol();
        let accounts = build_remaining_accounts(&protocol, &[]).unwrap();

        assert_eq!(accounts.len(), 5);
        assert_eq!(accounts[0].pubkey, protocol.a_vault_lp);
        assert_eq!(accounts[1].pubkey, protocol.a_vault_lp_mint);
        assert_eq!(accounts[2].pubkey, protocol.a_token_vault);
        assert!(accounts[..3].iter().all(|m| m.is_writable && !m.is_signer));
        assert_eq!(accounts[3].pubkey, protocol.sol_usd_feed);
        assert_eq!(accounts[4].pubkey, protocol.chainlink_program);
        assert!(accounts[3..].iter().all(|m| !m.is_writable && !m.is_signer));
    }

    #[test]
    fn test_upline_accounts_are_appended_writable() {
        let protocol = protocol();
        let upline: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        let accounts = build_remaining_accounts(&protocol, &upline).unwrap();

        assert_eq!(accounts.len(), 11);
        let appended: Vec<Pubkey> = accounts[5..].iter().map(|m| m.pubkey).collect();
        assert_eq!(appended, upline);
        assert!(accounts[5..].iter().all(|m| m.is_writable && !m.is_signer));
    }

    #[test]
    fn test_partial_trio_is_integrity_violation() {
        let upline: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let err = build_remaining_accounts(&protocol(), &upline).unwrap_err();
        assert!(matches!(err, RegistrationError::IntegrityViolation(4)));
    }

    #[test]
    fn test_swapped_feed_accounts_are_rejected() {
        let protocol = protocol();
        let mut accounts = build_remaining_accounts(&protocol, &[]).unwrap();
        accounts.swap(3, 4);

        let err = verify_fixed_prefix(&accounts, &protocol).unwrap_err();
        assert!(matches!(err, RegistrationError::OrderMismatch { index: 3, .. }));

        let err = verify_fixed_prefix(&accounts[..3], &protocol).unwrap_err();
        assert!(matches!(err, RegistrationError::OrderMismatch { index: 3, ref actual, .. } if actual == "<缺失>"));
    }

    #[test]
    fn test_register_instruction_layout() {
        let protocol = protocol();
        let parties = parties();
        let remaining = build_remaining_accounts(&protocol, &[]).unwrap();
        let ix = build_register_instruction(&protocol, &parties, 80_000_000, remaining);

        assert_eq!(ix.program_id, protocol.program_id);
        assert_eq!(ix.accounts.len(), 22 + 5);
        assert_eq!(ix.accounts[1].pubkey, parties.user_wallet);
        assert!(ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[2].pubkey, parties.referrer_account);
        assert_eq!(ix.accounts[22].pubkey, protocol.a_vault_lp);
        assert_eq!(&ix.data[..8], &[225, 36, 181, 137, 153, 105, 138, 171]);
        assert_eq!(&ix.data[8..], &80_000_000u64.to_le_bytes());
    }

    #[test]
    fn test_assemble_orders_compute_budget_first() {
        let protocol = protocol();
        let parties = parties();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![protocol.pool, protocol.b_vault, protocol.sol_usd_feed],
        };
        let blockhash = BlockhashInfo {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 100,
        };
        let assembler = TransactionAssembler {
            deposit_amount: 80_000_000,
            compute_unit_limit: 1_400_000,
            compute_unit_price: 5_000,
        };

        let assembled = assembler.assemble(&protocol, &parties, &[], &table, blockhash).unwrap();
        assert_eq!(assembled.remaining_accounts_len, 5);
        assert_eq!(*assembled.message.recent_blockhash(), blockhash.blockhash);

        let keys = assembled.message.static_account_keys();
        assert_eq!(keys[0], parties.user_wallet);

        let instructions = assembled.message.instructions();
        assert_eq!(instructions.len(), 3);
        assert_eq!(keys[instructions[0].program_id_index as usize], compute_budget::id());
        assert_eq!(keys[instructions[1].program_id_index as usize], compute_budget::id());
        assert_eq!(keys[instructions[2].program_id_index as usize], protocol.program_id);

        // lookup table 中的非签名账户不再出现在静态账户中
        assert!(!keys.contains(&protocol.pool));
        assert!(!keys.contains(&protocol.sol_usd_feed));
    }
}
