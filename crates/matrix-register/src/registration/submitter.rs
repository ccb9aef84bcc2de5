use crate::error::{RegistrationError, Result};
use crate::ledger::{BlockhashInfo, LedgerClient, SendOptions};
use backoff::{future::retry, ExponentialBackoff};
use solana_sdk::{
    message::VersionedMessage,
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tracing::{error, info, warn};

/// 只保留程序日志与错误行；没有匹配时原样返回
pub fn filter_ledger_logs(logs: &[String]) -> Vec<String> {
    let relevant: Vec<String> = logs
        .iter()
        .filter(|line| line.contains("Program log:") || line.contains("Error") || line.contains("error"))
        .cloned()
        .collect();

    if relevant.is_empty() {
        logs.to_vec()
    } else {
        relevant
    }
}

fn with_filtered_logs(err: RegistrationError) -> RegistrationError {
    match err {
        RegistrationError::TransactionSubmission { message, logs } => RegistrationError::TransactionSubmission {
            message,
            logs: filter_ledger_logs(&logs),
        },
        RegistrationError::Confirmation {
            signature,
            message,
            logs,
        } => RegistrationError::Confirmation {
            signature,
            message,
            logs: filter_ledger_logs(&logs),
        },
        other => other,
    }
}

/// 签名、发送并确认交易
pub struct Submitter<'a> {
    ledger: &'a dyn LedgerClient,
    options: SendOptions,
    confirm_timeout: Duration,
    retry_interval: Duration,
}

impl<'a> Submitter<'a> {
    pub fn new(
        ledger: &'a dyn LedgerClient,
        options: SendOptions,
        confirm_timeout: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            options,
            confirm_timeout,
            retry_interval,
        }
    }

    pub async fn submit(&self, message: VersionedMessage, blockhash: BlockhashInfo, signer: &Keypair) -> Result<Signature> {
        let transaction = VersionedTransaction::try_new(message, &[signer])
            .map_err(|e| RegistrationError::TransactionSubmission {
                message: format!("交易签名失败: {}", e),
                logs: Vec::new(),
            })?;

        let signature = self.send_with_retry(&transaction).await.map_err(with_filtered_logs)?;
        info!("📤 交易已发送: {}", signature);

        self.ledger
            .confirm_transaction(&signature, blockhash.last_valid_block_height, self.confirm_timeout)
            .await
            .map_err(|e| {
                let e = with_filtered_logs(e);
                error!("❌ 交易确认失败: {}", e);
                for line in e.logs() {
                    error!("  {}", line);
                }
                e
            })?;

        info!("✅ 交易已确认: {}", signature);
        Ok(signature)
    }

    /// 传输层错误按指数退避重试，最多 `max_retries` 次；预检失败等其他错误立即返回
    async fn send_with_retry(&self, transaction: &VersionedTransaction) -> Result<Signature> {
        let max_attempts = self.options.max_retries;
        let attempts = AtomicUsize::new(0);

        retry(self.retry_policy(), || {
            let attempts = &attempts;
            let ledger = self.ledger;
            let options = self.options;
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                match ledger.send_transaction(transaction, options).await {
                    Ok(signature) => Ok(signature),
                    Err(RegistrationError::SolanaRpc(message)) if attempt < max_attempts => {
                        warn!("⚠️ 发送失败 (第 {}/{} 次)，将重试: {}", attempt, max_attempts, message);
                        Err(backoff::Error::transient(RegistrationError::SolanaRpc(message)))
                    }
                    Err(RegistrationError::SolanaRpc(message)) => {
                        Err(backoff::Error::permanent(RegistrationError::TransactionSubmission {
                            message: format!("重试 {} 次后仍失败: {}", attempt, message),
                            logs: Vec::new(),
                        }))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }

    fn retry_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.retry_interval,
            initial_interval: self.retry_interval,
            max_interval: self.retry_interval * 8,
            multiplier: 2.0,
            // 次数由 max_retries 限定
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mock_ledger::MockLedger;
    use solana_sdk::{hash::Hash, signature::Signer};
    use utils::TransactionBuilder;

    fn budget_message(payer: &Keypair) -> (VersionedMessage, BlockhashInfo) {
        let blockhash = BlockhashInfo {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 1_000,
        };
        let instructions = TransactionBuilder::create_compute_budget_instructions(200_000, 1);
        let message =
            TransactionBuilder::compile_v0_message(&instructions, &payer.pubkey(), &[], blockhash.blockhash).unwrap();
        (message, blockhash)
    }

    fn submitter(ledger: &MockLedger, max_retries: usize) -> Submitter<'_> {
        Submitter::new(
            ledger,
            SendOptions {
                skip_preflight: false,
                max_retries,
            },
            Duration::from_secs(1),
            Duration::from_millis(1),
        )
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_program_logs_and_errors() {
        let logs = lines(&[
            "Program ComputeBudget111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: RegisterWithSolDeposit",
            "Program log: Referrer slot 2",
            "Program 2wFm... failed: custom program error: 0x1771",
            "Error: insufficient funds",
        ]);

        let filtered = filter_ledger_logs(&logs);
        assert_eq!(
            filtered,
            lines(&[
                "Program log: Instruction: RegisterWithSolDeposit",
                "Program log: Referrer slot 2",
                "Program 2wFm... failed: custom program error: 0x1771",
                "Error: insufficient funds",
            ])
        );
    }

    #[test]
    fn test_filter_falls_back_to_all_lines() {
        let logs = lines(&["Program X invoke [1]", "Program X consumed 100 of 200 compute units"]);
        assert_eq!(filter_ledger_logs(&logs), logs);
    }

    #[test]
    fn test_errors_without_logs_are_untouched() {
        let err = with_filtered_logs(RegistrationError::MatrixFull {
            referrer: solana_sdk::pubkey::Pubkey::new_unique(),
            filled_slots: 3,
        });
        assert!(err.logs().is_empty());
    }

    #[tokio::test]
    async fn test_transport_errors_back_off_then_succeed() {
        let ledger = MockLedger::new();
        ledger.fail_next_sends(3);
        let payer = Keypair::new();
        let (message, blockhash) = budget_message(&payer);

        let signature = submitter(&ledger, 4).submit(message, blockhash, &payer).await.unwrap();
        assert_eq!(ledger.send_attempts(), 4);
        assert_eq!(ledger.sent_transactions()[0].signatures[0], signature);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_become_submission_error() {
        let ledger = MockLedger::new();
        ledger.fail_next_sends(usize::MAX);
        let payer = Keypair::new();
        let (message, blockhash) = budget_message(&payer);

        let err = submitter(&ledger, 2).submit(message, blockhash, &payer).await.unwrap_err();
        assert!(matches!(err, RegistrationError::TransactionSubmission { ref message, .. } if message.contains("2")));
        assert_eq!(ledger.send_attempts(), 2);
    }

    #[tokio::test]
    async fn test_preflight_failure_is_not_retried() {
        let ledger = MockLedger::new();
        ledger.fail_preflight(&[
            "Program 2wFm... invoke [1]",
            "Program log: Error: referrer matrix is full",
        ]);
        let payer = Keypair::new();
        let (message, blockhash) = budget_message(&payer);

        let err = submitter(&ledger, 5).submit(message, blockhash, &payer).await.unwrap_err();
        assert_eq!(ledger.send_attempts(), 1);
        assert_eq!(err.logs(), ["Program log: Error: referrer matrix is full".to_string()]);
    }
}
