use matrix_state::{
    constants::{MATRIX_SLOT_COUNT, MAX_UPLINE_DEPTH},
    states::{UplineEntry, UserAccount},
};
use solana_sdk::pubkey::Pubkey;

use crate::error::{RegistrationError, Result};

/// 上级快照 (pda, wallet)，建立关系时写入链上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestorEntry {
    pub pda: Pubkey,
    pub wallet: Pubkey,
}

impl From<&UplineEntry> for AncestorEntry {
    fn from(entry: &UplineEntry) -> Self {
        Self {
            pda: entry.pda,
            wallet: entry.wallet,
        }
    }
}

/// 推荐账户的只读视图
///
/// 由链上 `UserAccount` 转换而来，构造时校验槽位数与上级数量，
/// 之后不可变。
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralAccount {
    address: Pubkey,
    registered: bool,
    controlling_wallet: Option<Pubkey>,
    referrer: Option<Pubkey>,
    depth: u8,
    ancestor_chain: Vec<AncestorEntry>,
    filled_slots: u8,
    slots: [Option<Pubkey>; MATRIX_SLOT_COUNT],
    reserved_native: u64,
    reserved_resource: u64,
}

impl ReferralAccount {
    pub fn from_user_account(address: Pubkey, account: &UserAccount) -> Result<Self> {
        let filled_slots = account.chain.filled_slots;
        if filled_slots as usize > MATRIX_SLOT_COUNT {
            return Err(RegistrationError::InvalidAccountData {
                address,
                reason: format!("filled_slots={} 超过 {}", filled_slots, MATRIX_SLOT_COUNT),
            });
        }

        if account.upline.upline.len() > MAX_UPLINE_DEPTH {
            return Err(RegistrationError::InvalidAccountData {
                address,
                reason: format!("上级数量 {} 超过 {}", account.upline.upline.len(), MAX_UPLINE_DEPTH),
            });
        }

        // 全零 owner_wallet 视为未设置
        let controlling_wallet = (account.owner_wallet != Pubkey::default()).then_some(account.owner_wallet);

        Ok(Self {
            address,
            registered: account.is_registered,
            controlling_wallet,
            referrer: account.referrer,
            depth: account.upline.depth,
            ancestor_chain: account.upline.upline.iter().map(AncestorEntry::from).collect(),
            filled_slots,
            slots: account.chain.slots,
            reserved_native: account.reserved_sol,
            reserved_resource: account.reserved_tokens,
        })
    }

    /// 从账户原始数据（含8字节 discriminator）解码
    pub fn decode(address: Pubkey, data: &[u8]) -> Result<Self> {
        use anchor_lang::AccountDeserialize;

        let mut data = data;
        let account = UserAccount::try_deserialize(&mut data).map_err(|e| RegistrationError::InvalidAccountData {
            address,
            reason: e.to_string(),
        })?;
        Self::from_user_account(address, &account)
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn controlling_wallet(&self) -> Option<Pubkey> {
        self.controlling_wallet
    }

    pub fn referrer(&self) -> Option<Pubkey> {
        self.referrer
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn ancestor_chain(&self) -> &[AncestorEntry] {
        &self.ancestor_chain
    }

    pub fn filled_slots(&self) -> u8 {
        self.filled_slots
    }

    /// 已填充的槽位，长度等于 filled_slots
    pub fn occupied_slots(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.slots[..self.filled_slots as usize].iter().flatten().copied()
    }

    pub fn reserved_native(&self) -> u64 {
        self.reserved_native
    }

    pub fn reserved_resource(&self) -> u64 {
        self.reserved_resource
    }
}

/// 解析完成的上级: 仅在一次注册中存在
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTrio {
    pub pda: Pubkey,
    pub wallet: Pubkey,
    pub resource_account: Pubkey,
    pub depth: u8,
}
