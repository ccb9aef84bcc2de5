use anyhow::Result;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::{path::Path, str::FromStr};
use tracing::info;

/// 配置管理器 - 统一管理地址解析与密钥加载
pub struct ConfigManager;

impl ConfigManager {
    /// 解析地址字符串，错误信息带上字段名
    pub fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
        Pubkey::from_str(value.trim()).map_err(|e| anyhow::anyhow!("无效的{}地址 {}: {}", field, value, e))
    }

    /// 从钱包文件加载密钥
    pub fn load_keypair_file(path: impl AsRef<Path>) -> Result<Keypair> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("读取钱包文件失败 {:?}: {}", path, e))?;
        let keypair = Self::parse_keypair(&content)?;
        info!("🔑 已加载钱包: {}", keypair.pubkey());
        Ok(keypair)
    }

    /// 支持多种私钥格式: JSON 数组 [1,2,3,...] 或 Base58
    pub fn parse_keypair(private_key_str: &str) -> Result<Keypair> {
        let private_key_str = private_key_str.trim();

        let bytes: Vec<u8> = if private_key_str.starts_with('[') && private_key_str.ends_with(']') {
            serde_json::from_str(private_key_str).map_err(|e| anyhow::anyhow!("解析私钥JSON格式失败: {}", e))?
        } else {
            bs58::decode(private_key_str)
                .into_vec()
                .map_err(|e| anyhow::anyhow!("解码Base58私钥失败: {}", e))?
        };

        if bytes.len() != 64 {
            return Err(anyhow::anyhow!("私钥长度必须是64字节，实际为{}字节", bytes.len()));
        }

        Keypair::from_bytes(&bytes).map_err(|e| anyhow::anyhow!("无效的私钥: {}", e))
    }
}
