use crate::error::{RegistrationError, Result};
use crate::registration::WalletFallbackPolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{info, warn};
use utils::{
    CargoEnv, ConfigManager, DEFAULT_BALANCE_BUFFER, DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_COMPUTE_UNIT_PRICE,
    DEFAULT_COMMITMENT, DEFAULT_CONFIRM_TIMEOUT_SECS, DEFAULT_DEPOSIT_AMOUNT, DEFAULT_MATRIX_PROGRAM_ID,
    DEFAULT_RPC_URL, DEFAULT_SEND_MAX_RETRIES, DEFAULT_SEND_RETRY_INTERVAL_MS, DEFAULT_STATE_ADDRESS,
    DEFAULT_TOKEN_MINT,
};

/// 命令行参数，所有参数都可以通过环境变量提供
#[derive(Parser, Debug, Clone)]
#[clap(name = "matrix-register", about = "使用 SOL 存款注册到三槽推荐矩阵")]
pub struct Cli {
    /// 钱包密钥文件 (JSON 数组或 Base58)
    #[clap(long, env = "WALLET_PATH")]
    pub wallet: Option<PathBuf>,

    /// 合约地址覆盖配置文件
    #[clap(long, env = "MATRIX_CONFIG", default_value = "./matrix-config.json")]
    pub config: PathBuf,

    /// 推荐人钱包地址
    #[clap(long, env = "REFERRER")]
    pub referrer: Option<String>,

    /// Address Lookup Table 地址
    #[clap(long, env = "LOOKUP_TABLE")]
    pub lookup_table: Option<String>,

    #[clap(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// processed / confirmed / finalized
    #[clap(long, env = "COMMITMENT", default_value = DEFAULT_COMMITMENT)]
    pub commitment: String,

    #[clap(long, env = "CARGO_ENV", value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    /// 生产环境日志目录，未指定时使用可执行文件旁的 logs/
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 存款金额 (lamports)
    #[clap(long, env = "DEPOSIT_AMOUNT", default_value_t = DEFAULT_DEPOSIT_AMOUNT)]
    pub deposit_amount: u64,

    #[clap(long, env = "COMPUTE_UNIT_LIMIT", default_value_t = DEFAULT_COMPUTE_UNIT_LIMIT)]
    pub compute_unit_limit: u32,

    /// 优先费 (micro-lamports / CU)
    #[clap(long, env = "COMPUTE_UNIT_PRICE", default_value_t = DEFAULT_COMPUTE_UNIT_PRICE)]
    pub compute_unit_price: u64,

    #[clap(long, env = "MAX_RETRIES", default_value_t = DEFAULT_SEND_MAX_RETRIES)]
    pub max_retries: usize,

    /// 首次重试间隔，之后指数增长
    #[clap(long, env = "SEND_RETRY_INTERVAL_MS", default_value_t = DEFAULT_SEND_RETRY_INTERVAL_MS)]
    pub send_retry_interval_ms: u64,

    #[clap(long, env = "CONFIRM_TIMEOUT_SECS", default_value_t = DEFAULT_CONFIRM_TIMEOUT_SECS)]
    pub confirm_timeout_secs: u64,

    #[clap(long, env = "SKIP_PREFLIGHT", default_value_t = true, action = clap::ArgAction::Set)]
    pub skip_preflight: bool,

    /// 关闭"取上级链首个钱包"的回退策略
    #[clap(long, env = "DISABLE_WALLET_FALLBACK")]
    pub disable_wallet_fallback: bool,

    /// 推荐人代币账户不存在时先单独创建
    #[clap(long, env = "CREATE_REFERRER_ATA", default_value_t = true, action = clap::ArgAction::Set)]
    pub create_referrer_ata: bool,
}

/// 合约地址覆盖配置文件 (camelCase JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixConfigFile {
    pub program_id: Option<String>,
    pub token_mint: Option<String>,
    pub state_address: Option<String>,
}

impl MatrixConfigFile {
    /// 加载配置文件；文件不存在时只告警并返回 None
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            warn!("⚠️ 配置文件 {:?} 不存在，使用默认合约地址", path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("✅ 已加载配置文件: {:?}", path);
        Ok(Some(config))
    }
}

/// 一次注册所需的全部配置，构造后不可变
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub wallet_path: PathBuf,
    pub referrer: Pubkey,
    pub lookup_table: Pubkey,
    pub program_id: Pubkey,
    pub token_mint: Pubkey,
    pub state_address: Pubkey,
    pub deposit_amount: u64,
    pub balance_buffer: u64,
    pub compute_unit_limit: u32,
    pub compute_unit_price: u64,
    pub max_retries: usize,
    pub send_retry_interval: Duration,
    pub confirm_timeout: Duration,
    pub skip_preflight: bool,
    pub wallet_fallback: WalletFallbackPolicy,
    pub create_referrer_ata: bool,
}

impl RegistrationSettings {
    /// 从命令行参数构建配置
    ///
    /// 必需参数在访问任何链上数据之前检查。
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let referrer = cli
            .referrer
            .as_deref()
            .ok_or_else(|| RegistrationError::MissingArgument("--referrer / REFERRER".to_string()))?;
        let lookup_table = cli
            .lookup_table
            .as_deref()
            .ok_or_else(|| RegistrationError::MissingArgument("--lookup-table / LOOKUP_TABLE".to_string()))?;
        let wallet_path = cli
            .wallet
            .clone()
            .ok_or_else(|| RegistrationError::MissingArgument("--wallet / WALLET_PATH".to_string()))?;

        let file = MatrixConfigFile::load(&cli.config)?.unwrap_or_default();

        let settings = Self {
            rpc_url: cli.rpc_url.clone(),
            commitment: CommitmentConfig::from_str(&cli.commitment)
                .map_err(|e| RegistrationError::Config(format!("无效的 commitment {}: {}", cli.commitment, e)))?,
            wallet_path,
            referrer: parse_pubkey("推荐人", referrer)?,
            lookup_table: parse_pubkey("Lookup Table", lookup_table)?,
            program_id: parse_pubkey("程序", file.program_id.as_deref().unwrap_or(DEFAULT_MATRIX_PROGRAM_ID))?,
            token_mint: parse_pubkey("代币Mint", file.token_mint.as_deref().unwrap_or(DEFAULT_TOKEN_MINT))?,
            state_address: parse_pubkey("State", file.state_address.as_deref().unwrap_or(DEFAULT_STATE_ADDRESS))?,
            deposit_amount: cli.deposit_amount,
            balance_buffer: DEFAULT_BALANCE_BUFFER,
            compute_unit_limit: cli.compute_unit_limit,
            compute_unit_price: cli.compute_unit_price,
            max_retries: cli.max_retries,
            send_retry_interval: Duration::from_millis(cli.send_retry_interval_ms),
            confirm_timeout: Duration::from_secs(cli.confirm_timeout_secs),
            skip_preflight: cli.skip_preflight,
            wallet_fallback: if cli.disable_wallet_fallback {
                WalletFallbackPolicy::Disabled
            } else {
                WalletFallbackPolicy::FirstChainEntry
            },
            create_referrer_ata: cli.create_referrer_ata,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if !self.rpc_url.starts_with("http") {
            return Err(RegistrationError::Config("RPC URL必须以http或https开头".to_string()));
        }

        if self.deposit_amount == 0 {
            return Err(RegistrationError::Config("存款金额必须大于0".to_string()));
        }

        if self.compute_unit_limit == 0 {
            return Err(RegistrationError::Config("计算单元上限必须大于0".to_string()));
        }

        if self.max_retries == 0 {
            return Err(RegistrationError::Config("发送重试次数必须大于0".to_string()));
        }

        if self.confirm_timeout.is_zero() {
            return Err(RegistrationError::Config("确认超时必须大于0".to_string()));
        }

        Ok(())
    }

    /// 预检所需最低余额: 存款 + 手续费/租金预留
    pub fn required_balance(&self) -> u64 {
        self.deposit_amount.saturating_add(self.balance_buffer)
    }

    pub fn log_summary(&self) {
        info!("🌐 RPC URL: {} ({:?})", self.rpc_url, self.commitment.commitment);
        info!("📋 程序: {}", self.program_id);
        info!("🪙 代币Mint: {}", self.token_mint);
        info!("🏛️ State: {}", self.state_address);
        info!("👥 推荐人: {}", self.referrer);
        info!("🗂️ Lookup Table: {}", self.lookup_table);
        info!(
            "⚙️ 存款 {} lamports, CU {} @ {} micro-lamports, 重试 {} 次",
            self.deposit_amount, self.compute_unit_limit, self.compute_unit_price, self.max_retries
        );
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    ConfigManager::parse_pubkey(field, value).map_err(|e| RegistrationError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_cli(args: &[&str]) -> Cli {
        let mut full = vec!["matrix-register"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    fn required_args(referrer: &str, table: &str) -> Vec<String> {
        vec![
            "--wallet".to_string(),
            "wallet.json".to_string(),
            "--referrer".to_string(),
            referrer.to_string(),
            "--lookup-table".to_string(),
            table.to_string(),
            "--config".to_string(),
            "/nonexistent/matrix-config.json".to_string(),
        ]
    }

    #[test]
    fn test_missing_referrer_is_reported_first() {
        let mut cli = parse_cli(&["--lookup-table", "not-even-a-key"]);
        cli.referrer = None;
        let err = RegistrationSettings::from_cli(&cli).unwrap_err();
        assert!(matches!(err, RegistrationError::MissingArgument(ref arg) if arg.contains("referrer")));
    }

    #[test]
    fn test_missing_lookup_table() {
        let mut cli = parse_cli(&["--referrer", &Pubkey::new_unique().to_string()]);
        cli.lookup_table = None;
        let err = RegistrationSettings::from_cli(&cli).unwrap_err();
        assert!(matches!(err, RegistrationError::MissingArgument(ref arg) if arg.contains("lookup-table")));
    }

    #[test]
    fn test_defaults_without_config_file() {
        let referrer = Pubkey::new_unique();
        let table = Pubkey::new_unique();
        let args = required_args(&referrer.to_string(), &table.to_string());
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());

        let settings = RegistrationSettings::from_cli(&cli).unwrap();
        assert_eq!(settings.referrer, referrer);
        assert_eq!(settings.lookup_table, table);
        assert_eq!(settings.program_id, matrix_state::ID);
        assert_eq!(settings.deposit_amount, DEFAULT_DEPOSIT_AMOUNT);
        assert_eq!(settings.required_balance(), 110_000_000);
        assert_eq!(settings.wallet_fallback, WalletFallbackPolicy::FirstChainEntry);
        assert!(settings.skip_preflight);
        assert!(settings.create_referrer_ata);
        assert_eq!(settings.commitment, CommitmentConfig::confirmed());
        assert_eq!(settings.send_retry_interval, Duration::from_millis(DEFAULT_SEND_RETRY_INTERVAL_MS));
        assert_eq!(cli.log_dir, None);
    }

    #[test]
    fn test_commitment_and_log_dir_flags() {
        let mut args = required_args(&Pubkey::new_unique().to_string(), &Pubkey::new_unique().to_string());
        args.extend(["--commitment", "finalized", "--log-dir", "/var/log/matrix"].map(String::from));
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());

        let settings = RegistrationSettings::from_cli(&cli).unwrap();
        assert_eq!(settings.commitment, CommitmentConfig::finalized());
        assert_eq!(cli.log_dir, Some(PathBuf::from("/var/log/matrix")));
    }

    #[test]
    fn test_unknown_commitment_is_config_error() {
        let mut args = required_args(&Pubkey::new_unique().to_string(), &Pubkey::new_unique().to_string());
        args.extend(["--commitment", "eventually"].map(String::from));
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(matches!(RegistrationSettings::from_cli(&cli), Err(RegistrationError::Config(_))));
    }

    #[test]
    fn test_config_file_overrides_addresses() {
        let program_id = Pubkey::new_unique();
        let path = std::env::temp_dir().join(format!("matrix-config-{}.json", Pubkey::new_unique()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"programId":"{}"}}"#, program_id).unwrap();

        let mut args = required_args(&Pubkey::new_unique().to_string(), &Pubkey::new_unique().to_string());
        let last = args.len() - 1;
        args[last] = path.to_string_lossy().to_string();
        args.push("--disable-wallet-fallback".to_string());
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());

        let settings = RegistrationSettings::from_cli(&cli).unwrap();
        assert_eq!(settings.program_id, program_id);
        assert_eq!(settings.token_mint.to_string(), DEFAULT_TOKEN_MINT);
        assert_eq!(settings.wallet_fallback, WalletFallbackPolicy::Disabled);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_referrer_is_config_error() {
        let args = required_args("not-a-key", &Pubkey::new_unique().to_string());
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(matches!(RegistrationSettings::from_cli(&cli), Err(RegistrationError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let args = required_args(&Pubkey::new_unique().to_string(), &Pubkey::new_unique().to_string());
        let cli = parse_cli(&args.iter().map(String::as_str).collect::<Vec<_>>());
        let settings = RegistrationSettings::from_cli(&cli).unwrap();

        let mut bad = settings.clone();
        bad.rpc_url = "ws://localhost:8900".to_string();
        assert!(bad.validate().is_err());

        let mut bad = settings.clone();
        bad.deposit_amount = 0;
        assert!(bad.validate().is_err());

        let mut bad = settings.clone();
        bad.compute_unit_limit = 0;
        assert!(bad.validate().is_err());

        let mut bad = settings.clone();
        bad.max_retries = 0;
        assert!(bad.validate().is_err());

        let mut bad = settings;
        bad.confirm_timeout = Duration::ZERO;
        assert!(matches!(bad.validate(), Err(RegistrationError::Config(ref message)) if message.contains("确认超时")));
    }
}
