use crate::error::{RegistrationError, Result};
use crate::ledger::{fetch_referral_account, LedgerClient};
use crate::model::{ReferralAccount, ResolvedTrio};
use crate::protocol::ProtocolAccounts;
use futures::future::join_all;
use matrix_state::constants::{MAX_UPLINE_DEPTH, UPLINE_TRIO_SIZE};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

/// 上级账户没有记录 owner_wallet、自身链中也找不到自己时的回退策略
///
/// `FirstChainEntry` 取上级自身链的第一个钱包。多分支树中该钱包
/// 不一定属于这个上级，这是已知的局限；`Disabled` 直接跳过该上级。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalletFallbackPolicy {
    #[default]
    FirstChainEntry,
    Disabled,
}

impl WalletFallbackPolicy {
    fn fallback_wallet(&self, ancestor: &ReferralAccount) -> Option<Pubkey> {
        match self {
            WalletFallbackPolicy::FirstChainEntry => ancestor.ancestor_chain().first().map(|entry| entry.wallet),
            WalletFallbackPolicy::Disabled => None,
        }
    }
}

/// 解析上级的控制钱包
///
/// 优先级: 显式 owner_wallet > 自身链中 pda 等于自己的条目 > 回退策略。
pub fn resolve_controlling_wallet(
    ancestor_pda: &Pubkey,
    ancestor: &ReferralAccount,
    policy: WalletFallbackPolicy,
) -> Option<Pubkey> {
    if let Some(wallet) = ancestor.controlling_wallet() {
        return Some(wallet);
    }

    let chain = ancestor.ancestor_chain();
    if chain.is_empty() {
        return None;
    }

    chain
        .iter()
        .find(|entry| entry.pda == *ancestor_pda)
        .map(|entry| entry.wallet)
        .or_else(|| policy.fallback_wallet(ancestor))
}

/// 把已读取的上级账户转换为 trio，保持输入顺序
///
/// 读取失败、未注册或无法解析钱包的上级被跳过。
pub fn resolve_trios(
    fetched: Vec<(Pubkey, Result<ReferralAccount>)>,
    token_mint: &Pubkey,
    policy: WalletFallbackPolicy,
) -> Vec<ResolvedTrio> {
    let mut trios = Vec::with_capacity(fetched.len());

    for (index, (pda, result)) in fetched.into_iter().enumerate() {
        let ancestor = match result {
            Ok(account) => account,
            Err(e) => {
                warn!("⚠️ 跳过上级 #{} {}: 读取失败 {}", index + 1, pda, e);
                continue;
            }
        };

        if !ancestor.is_registered() {
            warn!("⚠️ 跳过上级 #{} {}: 未注册", index + 1, pda);
            continue;
        }

        let Some(wallet) = resolve_controlling_wallet(&pda, &ancestor, policy) else {
            warn!("⚠️ 跳过上级 #{} {}: 无法确定控制钱包", index + 1, pda);
            continue;
        };

        let resource_account = utils::PDACalculator::calculate_associated_token_address(&wallet, token_mint);
        debug!(
            "上级 #{} pda={} wallet={} ata={} depth={}",
            index + 1,
            pda,
            wallet,
            resource_account,
            ancestor.depth()
        );

        trios.push(ResolvedTrio {
            pda,
            wallet,
            resource_account,
            depth: ancestor.depth(),
        });
    }

    trios
}

/// depth 降序，相同 depth 保持输入顺序
pub fn sort_by_depth(trios: &mut [ResolvedTrio]) {
    trios.sort_by(|a, b| b.depth.cmp(&a.depth));
}

/// 展开为 (pda, wallet, ata) 序列
pub fn flatten_trios(trios: &[ResolvedTrio]) -> Result<Vec<Pubkey>> {
    let flattened: Vec<Pubkey> = trios
        .iter()
        .flat_map(|trio| [trio.pda, trio.wallet, trio.resource_account])
        .collect();

    if flattened.len() % UPLINE_TRIO_SIZE != 0 {
        return Err(RegistrationError::IntegrityViolation(flattened.len()));
    }

    Ok(flattened)
}

/// 上级解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedUpline {
    /// 排序后的 trio
    pub trios: Vec<ResolvedTrio>,
    /// 展开后的账户，直接追加到 remaining_accounts
    pub accounts: Vec<Pubkey>,
}

/// 上级链解析器
pub struct UplineResolver<'a> {
    ledger: &'a dyn LedgerClient,
    protocol: &'a ProtocolAccounts,
    policy: WalletFallbackPolicy,
}

impl<'a> UplineResolver<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, protocol: &'a ProtocolAccounts, policy: WalletFallbackPolicy) -> Self {
        Self {
            ledger,
            protocol,
            policy,
        }
    }

    /// 解析推荐人的上级链（最多前 6 个），只读且幂等
    pub async fn resolve(&self, ancestors: &[Pubkey]) -> Result<ResolvedUpline> {
        let ancestors = &ancestors[..ancestors.len().min(MAX_UPLINE_DEPTH)];
        info!("🔄 解析 {} 个上级账户", ancestors.len());

        let fetched = join_all(ancestors.iter().map(|pda| fetch_referral_account(self.ledger, pda))).await;
        let fetched = ancestors.iter().copied().zip(fetched).collect();

        let mut trios = resolve_trios(fetched, &self.protocol.token_mint, self.policy);
        self.log_resource_accounts(&trios).await;

        sort_by_depth(&mut trios);
        let accounts = flatten_trios(&trios)?;
        info!("✅ 上级解析完成: {} 个有效上级, {} 个账户", trios.len(), accounts.len());

        Ok(ResolvedUpline { trios, accounts })
    }

    /// ATA 是否存在只用于诊断
    async fn log_resource_accounts(&self, trios: &[ResolvedTrio]) {
        let checks = join_all(trios.iter().map(|trio| self.ledger.account_exists(&trio.resource_account))).await;
        for (trio, exists) in trios.iter().zip(checks) {
            match exists {
                Ok(true) => debug!("上级代币账户 {} 已存在", trio.resource_account),
                Ok(false) => warn!("⚠️ 上级代币账户 {} 不存在 (wallet {})", trio.resource_account, trio.wallet),
                Err(e) => debug!("检查上级代币账户 {} 失败: {}", trio.resource_account, e),
            }
        }
    }
}
