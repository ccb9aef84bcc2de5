use anchor_lang::prelude::*;

use crate::constants::{MATRIX_SLOT_COUNT, MAX_UPLINE_DEPTH};

/// 上级快照，在建立关系时写入，之后不再重新推导
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, Debug, PartialEq)]
pub struct UplineEntry {
    pub pda: Pubkey,
    pub wallet: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, Debug)]
pub struct ReferralUpline {
    pub id: u32,
    pub depth: u8,
    pub upline: Vec<UplineEntry>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, Debug)]
pub struct ReferralChain {
    pub id: u32,
    pub slots: [Option<Pubkey>; MATRIX_SLOT_COUNT],
    pub filled_slots: u8,
}

#[account]
#[derive(Default, Debug)]
pub struct UserAccount {
    pub is_registered: bool,
    pub referrer: Option<Pubkey>,  // 推荐人账户 (PDA)
    pub owner_wallet: Pubkey,      // 全零表示未设置
    pub upline: ReferralUpline,
    pub chain: ReferralChain,
    pub reserved_sol: u64,
    pub reserved_tokens: u64,
}

impl UserAccount {
    pub const SIZE: usize =
        1 + 1 + 32 + 32 + 4 + 1 + 4 + (MAX_UPLINE_DEPTH * (32 + 32)) + 4 + (MATRIX_SLOT_COUNT * (1 + 32)) + 1 + 8 + 8;
}
