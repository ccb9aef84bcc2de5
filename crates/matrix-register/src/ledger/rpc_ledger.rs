use super::{BlockhashInfo, LedgerClient, LookupTableInfo, SendOptions};
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig},
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::{
    address_lookup_table::state::AddressLookupTable, message::AddressLookupTableAccount,
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 基于 nonblocking RpcClient 的账本实现
pub struct RpcLedgerClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedgerClient {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
        }
    }

    /// 读取已上链交易的日志
    async fn fetch_transaction_logs(&self, signature: &Signature) -> Vec<String> {
        let tx_config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        match self.rpc_client.get_transaction_with_config(signature, tx_config).await {
            Ok(transaction) => transaction
                .transaction
                .meta
                .map(|meta| Option::<Vec<String>>::from(meta.log_messages).unwrap_or_default())
                .unwrap_or_default(),
            Err(e) => {
                warn!("⚠️ 获取交易日志失败 {}: {}", signature, e);
                Vec::new()
            }
        }
    }

    fn confirmation_error(signature: &Signature, message: impl Into<String>, logs: Vec<String>) -> RegistrationError {
        RegistrationError::Confirmation {
            signature: signature.to_string(),
            message: message.into(),
            logs,
        }
    }
}

/// 预检失败时 RPC 会带回模拟日志
fn preflight_logs(err: &ClientError) -> Vec<String> {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.clone().unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.rpc_client.get_balance(address).await?)
    }

    async fn get_lookup_table(&self, address: &Pubkey) -> Result<LookupTableInfo> {
        let unavailable = |reason: String| RegistrationError::LookupTableUnavailable {
            address: *address,
            reason,
        };

        let data = self
            .get_account_data(address)
            .await?
            .ok_or_else(|| unavailable("账户不存在".to_string()))?;
        let table = AddressLookupTable::deserialize(&data).map_err(|e| unavailable(format!("解码失败: {}", e)))?;

        if table.addresses.is_empty() {
            return Err(unavailable("地址列表为空".to_string()));
        }

        Ok(LookupTableInfo {
            account: AddressLookupTableAccount {
                key: *address,
                addresses: table.addresses.to_vec(),
            },
            authority: table.meta.authority,
        })
    }

    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo> {
        let (blockhash, last_valid_block_height) = self
            .rpc_client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(BlockhashInfo {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(&self, transaction: &VersionedTransaction, options: SendOptions) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            max_retries: Some(options.max_retries),
            ..RpcSendTransactionConfig::default()
        };

        self.rpc_client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| {
                let logs = preflight_logs(&e);
                if logs.is_empty() {
                    RegistrationError::SolanaRpc(e.to_string())
                } else {
                    RegistrationError::TransactionSubmission {
                        message: e.to_string(),
                        logs,
                    }
                }
            })
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
        timeout: Duration,
    ) -> Result<()> {
        let start = Instant::now();

        loop {
            match self.rpc_client.get_signature_statuses(&[*signature]).await {
                Ok(response) => {
                    if let Some(Some(status)) = response.value.first() {
                        if let Some(err) = &status.err {
                            let logs = self.fetch_transaction_logs(signature).await;
                            return Err(Self::confirmation_error(signature, format!("交易执行失败: {}", err), logs));
                        }
                        if status.satisfies_commitment(self.commitment) {
                            return Ok(());
                        }
                    }
                }
                // 网络抖动，继续轮询
                Err(e) => debug!("查询签名状态失败: {}", e),
            }

            let block_height = self
                .rpc_client
                .get_block_height_with_commitment(self.commitment)
                .await
                .unwrap_or_default();
            if block_height > last_valid_block_height {
                return Err(Self::confirmation_error(
                    signature,
                    format!("区块哈希已过期 (block height {} > {})", block_height, last_valid_block_height),
                    Vec::new(),
                ));
            }

            if start.elapsed() >= timeout {
                return Err(Self::confirmation_error(
                    signature,
                    format!("确认超时 ({}s)", timeout.as_secs()),
                    Vec::new(),
                ));
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
