use crate::error::Result;
use crate::ledger::{fetch_referral_account, LedgerClient};
use crate::model::{ReferralAccount, ResolvedTrio};
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};
use utils::TokenUtils;

/// 地址以 base58 输出
fn serialize_pubkey<S: Serializer>(key: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

/// 上级在本次递归后的状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UplineVerification {
    #[serde(serialize_with = "serialize_pubkey")]
    pub pda: Pubkey,
    pub filled_slots: u8,
    /// 推荐人账户是否已进入该上级的槽位
    pub contains_referrer: bool,
    pub reserved_sol: u64,
    pub reserved_tokens: u64,
}

/// 注册后重新读取的链上状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountVerification {
    pub registered: bool,
    pub referrer_matches: bool,
    pub owner_wallet_matches: bool,
    pub depth: u8,
    pub upline_entries: usize,
    pub referrer_filled_slots: Option<u8>,
    pub reserved_sol: u64,
    pub reserved_tokens: u64,
    pub uplines: Vec<UplineVerification>,
}

/// 一次注册的最终结果
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReport {
    pub signature: String,
    #[serde(serialize_with = "serialize_pubkey")]
    pub user_wallet: Pubkey,
    #[serde(serialize_with = "serialize_pubkey")]
    pub user_account: Pubkey,
    #[serde(serialize_with = "serialize_pubkey")]
    pub referrer_wallet: Pubkey,
    #[serde(serialize_with = "serialize_pubkey")]
    pub referrer_account: Pubkey,
    pub slot_filled: u8,
    pub upline_count: usize,
    pub remaining_accounts: usize,
    pub balance_before: u64,
    pub balance_after: Option<u64>,
    /// 验证读取失败时为 None，注册本身仍然成功
    pub verification: Option<AccountVerification>,
}

impl RegistrationReport {
    pub fn balance_spent(&self) -> Option<u64> {
        self.balance_after.map(|after| self.balance_before.saturating_sub(after))
    }

    pub fn log_summary(&self) {
        info!("🎉 注册完成: {}", self.signature);
        info!("👤 用户账户: {}", self.user_account);
        info!("📍 占用推荐人槽位: {}", self.slot_filled);
        if let Some(spent) = self.balance_spent() {
            info!("💸 花费: {} SOL", TokenUtils::lamports_to_sol(spent));
        }

        let Some(verification) = &self.verification else {
            warn!("⚠️ 未能验证注册结果");
            return;
        };

        if !verification.registered {
            warn!("⚠️ 用户账户未标记为已注册");
        }
        if !verification.referrer_matches {
            warn!("⚠️ 用户账户记录的推荐人与预期不一致");
        }
        if !verification.owner_wallet_matches {
            warn!("⚠️ owner_wallet 与用户钱包不一致");
        }
        info!(
            "🔢 深度 {}, 上级 {} 个, 推荐人槽位 {:?}/3",
            verification.depth, verification.upline_entries, verification.referrer_filled_slots
        );

        for upline in &verification.uplines {
            if upline.contains_referrer {
                info!("  ✅ 上级 {} 已收录推荐人 ({}/3)", upline.pda, upline.filled_slots);
            } else {
                info!("  ➖ 上级 {} 未收录推荐人 ({}/3)", upline.pda, upline.filled_slots);
            }
        }
    }
}

/// 比对新用户账户与预期值
pub fn check_user_account(
    user: &ReferralAccount,
    user_wallet: &Pubkey,
    referrer_account: &Pubkey,
) -> AccountVerification {
    AccountVerification {
        registered: user.is_registered(),
        referrer_matches: user.referrer() == Some(*referrer_account),
        owner_wallet_matches: user.controlling_wallet() == Some(*user_wallet),
        depth: user.depth(),
        upline_entries: user.ancestor_chain().len(),
        referrer_filled_slots: None,
        reserved_sol: user.reserved_native(),
        reserved_tokens: user.reserved_resource(),
        uplines: Vec::new(),
    }
}

pub fn check_upline(upline: &ReferralAccount, referrer_account: &Pubkey) -> UplineVerification {
    UplineVerification {
        pda: upline.address(),
        filled_slots: upline.filled_slots(),
        contains_referrer: upline.occupied_slots().any(|slot| slot == *referrer_account),
        reserved_sol: upline.reserved_native(),
        reserved_tokens: upline.reserved_resource(),
    }
}

/// 重新读取用户、推荐人和上级账户
///
/// 单个上级读取失败只记日志；用户账户读取失败返回错误。
pub async fn verify_registration(
    ledger: &dyn LedgerClient,
    user_wallet: &Pubkey,
    user_account: &Pubkey,
    referrer_account: &Pubkey,
    trios: &[ResolvedTrio],
) -> Result<AccountVerification> {
    let user = fetch_referral_account(ledger, user_account).await?;
    let mut verification = check_user_account(&user, user_wallet, referrer_account);

    match fetch_referral_account(ledger, referrer_account).await {
        Ok(referrer) => verification.referrer_filled_slots = Some(referrer.filled_slots()),
        Err(e) => warn!("⚠️ 读取推荐人账户失败: {}", e),
    }

    for trio in trios {
        match fetch_referral_account(ledger, &trio.pda).await {
            Ok(upline) => verification.uplines.push(check_upline(&upline, referrer_account)),
            Err(e) => warn!("⚠️ 读取上级 {} 失败: {}", trio.pda, e),
        }
    }

    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::user_account;

    #[test]
    fn test_check_user_account() {
        let wallet = Pubkey::new_unique();
        let referrer_account = Pubkey::new_unique();
        let mut account = user_account(true, Some(wallet), 2, vec![], 0);
        account.referrer = Some(referrer_account);
        let user = ReferralAccount::from_user_account(Pubkey::new_unique(), &account).unwrap();

        let verification = check_user_account(&user, &wallet, &referrer_account);
        assert!(verification.registered);
        assert!(verification.referrer_matches);
        assert!(verification.owner_wallet_matches);
        assert_eq!(verification.depth, 2);

        let verification = check_user_account(&user, &Pubkey::new_unique(), &Pubkey::new_unique());
        assert!(!verification.referrer_matches);
        assert!(!verification.owner_wallet_matches);
    }

    #[test]
    fn test_check_upline_only_reads_filled_slots() {
        let referrer_account = Pubkey::new_unique();
        let mut account = user_account(true, None, 1, vec![], 1);
        account.chain.slots[1] = Some(referrer_account);
        let upline = ReferralAccount::from_user_account(Pubkey::new_unique(), &account).unwrap();
        assert!(!check_upline(&upline, &referrer_account).contains_referrer);

        account.chain.filled_slots = 2;
        let upline = ReferralAccount::from_user_account(Pubkey::new_unique(), &account).unwrap();
        assert!(check_upline(&upline, &referrer_account).contains_referrer);
    }

    #[test]
    fn test_report_serializes_balance() {
        let report = RegistrationReport {
            signature: "sig".to_string(),
            user_wallet: Pubkey::new_unique(),
            user_account: Pubkey::new_unique(),
            referrer_wallet: Pubkey::new_unique(),
            referrer_account: Pubkey::new_unique(),
            slot_filled: 1,
            upline_count: 0,
            remaining_accounts: 5,
            balance_before: 200_000_000,
            balance_after: Some(115_000_000),
            verification: None,
        };
        assert_eq!(report.balance_spent(), Some(85_000_000));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["slot_filled"], 1);
        assert_eq!(json["remaining_accounts"], 5);
        assert!(json["verification"].is_null());
        assert_eq!(json["user_wallet"], report.user_wallet.to_string());
    }
}
