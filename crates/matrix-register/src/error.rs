use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// 注册流程错误类型定义
///
/// 除上级解析过程中被跳过的单个上级外，所有错误都是致命的：
/// 立即终止本次注册，且不会产生部分上链的状态。
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("缺少必需参数: {0}")]
    MissingArgument(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("账户不存在: {0}")]
    AccountNotFound(Pubkey),

    #[error("账户数据无效 {address}: {reason}")]
    InvalidAccountData { address: Pubkey, reason: String },

    #[error("推荐人未注册: {0}")]
    NotRegistered(Pubkey),

    #[error("用户已注册: {0}")]
    AlreadyRegistered(Pubkey),

    #[error("推荐人矩阵已满: {referrer} ({filled_slots}/3)")]
    MatrixFull { referrer: Pubkey, filled_slots: u8 },

    #[error("余额不足: 需要 {required} lamports，当前 {available} lamports")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("上级账户数量不是3的倍数: {0}")]
    IntegrityViolation(usize),

    #[error("remaining_accounts 顺序错误: 索引 {index} 期望 {expected}，实际 {actual}")]
    OrderMismatch { index: usize, expected: Pubkey, actual: String },

    #[error("Address Lookup Table 不可用 {address}: {reason}")]
    LookupTableUnavailable { address: Pubkey, reason: String },

    #[error("交易发送失败: {message}")]
    TransactionSubmission { message: String, logs: Vec<String> },

    #[error("交易确认失败 {signature}: {message}")]
    Confirmation {
        signature: String,
        message: String,
        logs: Vec<String>,
    },

    #[error("密钥加载失败: {0}")]
    Keypair(String),

    #[error("Solana RPC错误: {0}")]
    SolanaRpc(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    IO(#[from] std::io::Error),

    #[error("未知错误: {0}")]
    Unknown(String),
}

impl RegistrationError {
    /// 链上返回的日志（如果有）
    pub fn logs(&self) -> &[String] {
        match self {
            RegistrationError::TransactionSubmission { logs, .. } | RegistrationError::Confirmation { logs, .. } => logs,
            _ => &[],
        }
    }
}

impl From<anyhow::Error> for RegistrationError {
    fn from(err: anyhow::Error) -> Self {
        RegistrationError::Unknown(err.to_string())
    }
}

impl From<solana_client::client_error::ClientError> for RegistrationError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        RegistrationError::SolanaRpc(err.to_string())
    }
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, RegistrationError>;
