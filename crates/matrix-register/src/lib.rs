pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod protocol;
pub mod registration;


pub use error::{RegistrationError, Result};

use crate::{
    config::RegistrationSettings,
    ledger::{LedgerClient, LookupTableInfo, RpcLedgerClient, SendOptions},
    protocol::ProtocolAccounts,
    registration::{
        assembler::RegistrationParties, referrer_validator::describe_slot, report::verify_registration,
        upline_resolver::ResolvedUpline, RegistrationReport, ReferrerValidator, Submitter, TransactionAssembler,
        UplineResolver,
    },
};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utils::{TokenUtils, TransactionBuilder};

/// 矩阵注册主服务
///
/// 按顺序执行:
/// - 余额预检
/// - 加载 Address Lookup Table
/// - 校验推荐人与槽位
/// - 解析上级链（仅填充最后一个槽位时）
/// - 组装交易；推荐人代币账户缺失时此后才单独创建
/// - 签名、发送并确认交易
/// - 重新读取链上状态生成报告
pub struct RegistrationService {
    settings: Arc<RegistrationSettings>,
    ledger: Arc<dyn LedgerClient>,
    protocol: ProtocolAccounts,
}

impl RegistrationService {
    /// 使用 RPC 账本创建服务
    pub fn new(settings: RegistrationSettings) -> Result<Self> {
        let ledger = Arc::new(RpcLedgerClient::new(&settings.rpc_url, settings.commitment));
        Self::with_ledger(settings, ledger)
    }

    pub fn with_ledger(settings: RegistrationSettings, ledger: Arc<dyn LedgerClient>) -> Result<Self> {
        settings.validate()?;
        let protocol = ProtocolAccounts::from_settings(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            ledger,
            protocol,
        })
    }

    /// 执行一次注册
    pub async fn register(&self, user: &Keypair) -> Result<RegistrationReport> {
        let user_wallet = user.pubkey();
        info!("🚀 开始注册: {}", user_wallet);
        self.settings.log_summary();

        let balance_before = self.check_balance(&user_wallet).await?;
        let lookup_table = self.load_lookup_table().await?;

        let ledger = self.ledger.as_ref();
        let context = ReferrerValidator::new(ledger, &self.protocol)
            .validate(&self.settings.referrer, &user_wallet)
            .await?;
        let referrer_account = context.referrer.address();
        info!("📍 新用户将占用槽位 {} ({})", context.next_slot, describe_slot(context.next_slot));

        let reward_wallet = context.reward_wallet();
        let referrer_token_account = self.protocol.resource_account(&reward_wallet);
        let needs_referrer_token_account = self.referrer_token_account_missing(&referrer_token_account).await?;
        self.log_program_vault().await;

        let upline = if context.fills_last_slot() {
            let ancestors: Vec<Pubkey> = context.referrer.ancestor_chain().iter().map(|entry| entry.pda).collect();
            UplineResolver::new(ledger, &self.protocol, self.settings.wallet_fallback)
                .resolve(&ancestors)
                .await?
        } else {
            debug!("槽位 {} 不触发上级递归", context.next_slot);
            ResolvedUpline::default()
        };

        let parties = RegistrationParties {
            user_wallet,
            user_account: context.user_account,
            referrer_wallet: context.referrer_wallet,
            referrer_account,
            referrer_token_account,
        };

        let blockhash = self.ledger.get_latest_blockhash().await?;
        let mut assembled = self.assembler().assemble(
            &self.protocol,
            &parties,
            &upline.accounts,
            &lookup_table.account,
            blockhash,
        )?;

        // 组装成功后才写链
        if needs_referrer_token_account {
            self.create_referrer_token_account(user, &reward_wallet, &referrer_token_account)
                .await?;
            let blockhash = self.ledger.get_latest_blockhash().await?;
            assembled = self.assembler().assemble(
                &self.protocol,
                &parties,
                &upline.accounts,
                &lookup_table.account,
                blockhash,
            )?;
        }

        let signature = self
            .submitter()
            .submit(assembled.message, assembled.blockhash, user)
            .await?;

        let verification = match verify_registration(
            ledger,
            &user_wallet,
            &context.user_account,
            &referrer_account,
            &upline.trios,
        )
        .await
        {
            Ok(verification) => Some(verification),
            Err(e) => {
                warn!("⚠️ 注册已确认，但验证读取失败: {}", e);
                None
            }
        };

        let balance_after = match self.ledger.get_balance(&user_wallet).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!("⚠️ 读取注册后余额失败: {}", e);
                None
            }
        };

        let report = RegistrationReport {
            signature: signature.to_string(),
            user_wallet,
            user_account: context.user_account,
            referrer_wallet: context.referrer_wallet,
            referrer_account,
            slot_filled: context.next_slot,
            upline_count: upline.trios.len(),
            remaining_accounts: assembled.remaining_accounts_len,
            balance_before,
            balance_after,
            verification,
        };
        report.log_summary();

        Ok(report)
    }

    fn assembler(&self) -> TransactionAssembler {
        TransactionAssembler {
            deposit_amount: self.settings.deposit_amount,
            compute_unit_limit: self.settings.compute_unit_limit,
            compute_unit_price: self.settings.compute_unit_price,
        }
    }

    fn submitter(&self) -> Submitter<'_> {
        Submitter::new(
            self.ledger.as_ref(),
            SendOptions {
                skip_preflight: self.settings.skip_preflight,
                max_retries: self.settings.max_retries,
            },
            self.settings.confirm_timeout,
            self.settings.send_retry_interval,
        )
    }

    /// 余额必须覆盖存款与手续费预留
    async fn check_balance(&self, wallet: &Pubkey) -> Result<u64> {
        let balance = self.ledger.get_balance(wallet).await?;
        let required = self.settings.required_balance();
        info!("💰 钱包余额: {} SOL", TokenUtils::lamports_to_sol(balance));

        if balance < required {
            return Err(RegistrationError::InsufficientBalance {
                required,
                available: balance,
            });
        }
        Ok(balance)
    }

    async fn load_lookup_table(&self) -> Result<LookupTableInfo> {
        let table = self.ledger.get_lookup_table(&self.settings.lookup_table).await?;
        info!(
            "🗂️ Lookup Table {}: {} 个地址, authority {}",
            table.account.key,
            table.account.addresses.len(),
            table
                .authority
                .map(|authority| authority.to_string())
                .unwrap_or_else(|| "无".to_string())
        );
        for (index, address) in table.account.addresses.iter().enumerate() {
            debug!("  [{}] {}", index, address);
        }
        Ok(table)
    }

    /// 推荐人代币账户不存在且允许创建时返回 true
    async fn referrer_token_account_missing(&self, token_account: &Pubkey) -> Result<bool> {
        if self.ledger.account_exists(token_account).await? {
            debug!("推荐人代币账户已存在: {}", token_account);
            return Ok(false);
        }

        if !self.settings.create_referrer_ata {
            warn!("⚠️ 推荐人代币账户 {} 不存在，跳过创建", token_account);
            return Ok(false);
        }

        Ok(true)
    }

    /// 单独发送一笔幂等创建交易
    async fn create_referrer_token_account(&self, payer: &Keypair, owner: &Pubkey, token_account: &Pubkey) -> Result<()> {
        info!("🔧 创建推荐人代币账户: {} (owner {})", token_account, owner);
        let instruction = create_associated_token_account_idempotent(
            &payer.pubkey(),
            owner,
            &self.protocol.token_mint,
            &self.protocol.token_program,
        );
        let blockhash = self.ledger.get_latest_blockhash().await?;
        let message = TransactionBuilder::compile_v0_message(&[instruction], &payer.pubkey(), &[], blockhash.blockhash)?;
        let signature = self.submitter().submit(message, blockhash, payer).await?;
        info!("✅ 推荐人代币账户已创建: {}", signature);

        Ok(())
    }

    async fn log_program_vault(&self) {
        match self.ledger.account_exists(&self.protocol.program_token_vault).await {
            Ok(true) => debug!("程序代币金库已存在: {}", self.protocol.program_token_vault),
            Ok(false) => warn!("⚠️ 程序代币金库不存在: {}", self.protocol.program_token_vault),
            Err(e) => debug!("检查程序代币金库失败: {}", e),
        }
    }
}
