use crate::error::{RegistrationError, Result};
use crate::ledger::{fetch_optional_referral_account, LedgerClient};
use crate::model::ReferralAccount;
use crate::protocol::ProtocolAccounts;
use matrix_state::constants::MATRIX_SLOT_COUNT;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

/// 推荐人校验结果
#[derive(Debug, Clone)]
pub struct ReferrerContext {
    pub referrer_wallet: Pubkey,
    pub referrer: ReferralAccount,
    pub user_account: Pubkey,
    /// 新用户将占用的槽位
    pub next_slot: u8,
}

impl ReferrerContext {
    /// 填满最后一个槽位时才需要沿上级链递归
    pub fn fills_last_slot(&self) -> bool {
        self.next_slot as usize == MATRIX_SLOT_COUNT - 1
    }

    /// 接收推荐奖励代币的钱包: 优先使用推荐人账户中记录的 owner_wallet
    pub fn reward_wallet(&self) -> Pubkey {
        self.referrer.controlling_wallet().unwrap_or(self.referrer_wallet)
    }
}

/// 推荐人校验器
pub struct ReferrerValidator<'a> {
    ledger: &'a dyn LedgerClient,
    protocol: &'a ProtocolAccounts,
}

impl<'a> ReferrerValidator<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, protocol: &'a ProtocolAccounts) -> Self {
        Self { ledger, protocol }
    }

    /// 校验推荐人可以接收新成员，且新用户尚未注册
    pub async fn validate(&self, referrer_wallet: &Pubkey, user_wallet: &Pubkey) -> Result<ReferrerContext> {
        let referrer_address = self.protocol.user_account_address(referrer_wallet);
        debug!("推荐人账户: {}", referrer_address);

        let referrer = match fetch_optional_referral_account(self.ledger, &referrer_address).await? {
            Some(account) if account.is_registered() => account,
            _ => return Err(RegistrationError::NotRegistered(*referrer_wallet)),
        };

        let next_slot = next_slot(&referrer)?;
        info!("✅ 推荐人已注册，已填充槽位 {}/{}", referrer.filled_slots(), MATRIX_SLOT_COUNT);

        let user_account = self.protocol.user_account_address(user_wallet);
        if let Some(existing) = fetch_optional_referral_account(self.ledger, &user_account).await? {
            if existing.is_registered() {
                return Err(RegistrationError::AlreadyRegistered(*user_wallet));
            }
        }
        debug!("用户账户 {} 尚未注册", user_account);

        Ok(ReferrerContext {
            referrer_wallet: *referrer_wallet,
            referrer,
            user_account,
            next_slot,
        })
    }
}

/// 新成员占用的槽位等于已填充数量
pub fn next_slot(referrer: &ReferralAccount) -> Result<u8> {
    let filled = referrer.filled_slots();
    if filled as usize >= MATRIX_SLOT_COUNT {
        return Err(RegistrationError::MatrixFull {
            referrer: referrer.address(),
            filled_slots: filled,
        });
    }
    Ok(filled)
}

/// 槽位含义
pub fn describe_slot(slot: u8) -> &'static str {
    match slot {
        0 => "池子存款",
        1 => "预留",
        2 => "上级递归",
        _ => "未知",
    }
}
