use clap::Parser;
use matrix_register::{
    config::{Cli, RegistrationSettings},
    RegistrationError, RegistrationService,
};
use tracing::{error, info};
use utils::{ConfigManager, EnvLoader, Logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境配置文件
    if let Err(e) = EnvLoader::load_env_file() {
        eprintln!("⚠️ 加载环境配置文件失败: {}", e);
    }

    let cli = Cli::parse();
    let guard = Logger::new(cli.cargo_env, cli.log_dir.as_deref());

    info!("🎯 启动矩阵注册");

    if let Err(e) = run(&cli).await {
        error!("❌ 注册失败: {}", e);
        for line in e.logs() {
            error!("  {}", line);
        }
        // 退出前刷新日志
        drop(guard);
        std::process::exit(1);
    }

    drop(guard);
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), RegistrationError> {
    let settings = RegistrationSettings::from_cli(cli)?;
    let user = ConfigManager::load_keypair_file(&settings.wallet_path).map_err(|e| RegistrationError::Keypair(e.to_string()))?;

    let service = RegistrationService::new(settings)?;
    let report = service.register(&user).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
