pub mod rpc_ledger;

pub use rpc_ledger::RpcLedgerClient;

use crate::error::{RegistrationError, Result};
use crate::model::ReferralAccount;
use async_trait::async_trait;
use solana_sdk::{
    message::AddressLookupTableAccount, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use std::time::Duration;

/// 已加载的 Address Lookup Table
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTableInfo {
    pub account: AddressLookupTableAccount,
    pub authority: Option<Pubkey>,
}

/// 最近区块哈希及其有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashInfo {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// 发送参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub skip_preflight: bool,
    pub max_retries: usize,
}

/// 账本读写接口
///
/// 注册流程只通过这个接口访问链上数据，测试中用内存实现替换。
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// 账户原始数据；账户不存在时返回 None
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// 不存在、无法解码或为空时返回 `LookupTableUnavailable`
    async fn get_lookup_table(&self, address: &Pubkey) -> Result<LookupTableInfo>;

    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo>;

    /// 发送已签名交易；预检失败时错误中带上模拟日志
    async fn send_transaction(&self, transaction: &VersionedTransaction, options: SendOptions) -> Result<Signature>;

    /// 等待交易确认，直到区块高度超过 last_valid_block_height 或超时
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
        timeout: Duration,
    ) -> Result<()>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.get_account_data(address).await?.is_some())
    }
}

/// 读取并解码推荐账户；不存在时返回 `AccountNotFound`
pub async fn fetch_referral_account(ledger: &dyn LedgerClient, address: &Pubkey) -> Result<ReferralAccount> {
    let data = ledger
        .get_account_data(address)
        .await?
        .ok_or(RegistrationError::AccountNotFound(*address))?;
    ReferralAccount::decode(*address, &data)
}

/// 与 `fetch_referral_account` 相同，但把"不存在"映射为 None
pub async fn fetch_optional_referral_account(
    ledger: &dyn LedgerClient,
    address: &Pubkey,
) -> Result<Option<ReferralAccount>> {
    match fetch_referral_account(ledger, address).await {
        Ok(account) => Ok(Some(account)),
        Err(RegistrationError::AccountNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
