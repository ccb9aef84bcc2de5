use anyhow::Result;
use solana_sdk::{
    message::AddressLookupTableAccount,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
};

/// 交易构建器 - 统一管理交易构建逻辑
pub struct TransactionBuilder;

impl TransactionBuilder {
    /// 计算预算指令对: (CU 上限, 优先费)
    pub fn create_compute_budget_instructions(compute_units: u32, micro_lamports: u64) -> [Instruction; 2] {
        [
            ComputeBudgetInstruction::set_compute_unit_limit(compute_units),
            ComputeBudgetInstruction::set_compute_unit_price(micro_lamports),
        ]
    }

    /// 编译 V0 消息；lookup table 中的地址以索引形式引用
    pub fn compile_v0_message(
        instructions: &[Instruction],
        payer: &Pubkey,
        lookup_tables: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<VersionedMessage> {
        let message = v0::Message::try_compile(payer, instructions, lookup_tables, recent_blockhash)?;
        Ok(VersionedMessage::V0(message))
    }
}

/// 账户元数据构建器 - 统一管理账户元数据创建
pub struct AccountMetaBuilder;

impl AccountMetaBuilder {
    /// 创建只读账户元数据
    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> AccountMeta {
        AccountMeta { pubkey, is_signer, is_writable: false }
    }

    /// 创建可写账户元数据
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> AccountMeta {
        AccountMeta { pubkey, is_signer, is_writable: true }
    }

    /// 批量创建可写、非签名的 remaining accounts
    pub fn writable_remaining_accounts(pubkeys: &[Pubkey]) -> Vec<AccountMeta> {
        pubkeys.iter().map(|pubkey| Self::writable(*pubkey, false)).collect()
    }
}
