use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::CargoEnv;

const LOG_FILE_PREFIX: &str = "matrix-register.log";
const DEFAULT_FILTER: &str = "matrix_register=debug,utils=debug,info";

pub struct Logger;
impl Logger {
    /// 初始化全局日志
    ///
    /// 开发环境输出到 stdout；生产环境按天滚动写入 `log_dir`
    /// （未指定时为可执行文件旁的 `logs/`）。返回的 guard 在进程退出前必须保留。
    pub fn new(cargo_env: CargoEnv, log_dir: Option<&Path>) -> WorkerGuard {
        let (non_blocking, guard) = match cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => {
                let mut log_directory = Self::resolve_log_directory(log_dir);

                if let Err(e) = std::fs::create_dir_all(&log_directory) {
                    eprintln!("⚠️ 无法创建日志目录 {:?}: {}，回退到 ./logs", log_directory, e);
                    log_directory = PathBuf::from("logs");
                    std::fs::create_dir_all(&log_directory).ok();
                }

                println!("✅ 日志将输出到目录: {:?}", log_directory);
                let file_logger = tracing_appender::rolling::daily(&log_directory, LOG_FILE_PREFIX);
                tracing_appender::non_blocking(file_logger)
            }
        };

        // env var: `RUST_LOG`
        let env_filter =
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

        // 重复初始化（例如测试中）时忽略错误
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .try_init();

        guard
    }

    /// `--log-dir` / `LOG_DIR` 优先，其次可执行文件目录，最后当前目录
    pub fn resolve_log_directory(log_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = log_dir {
            return dir.to_path_buf();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe_path| exe_path.parent().map(|exe_dir| exe_dir.join("logs")))
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join("logs")
            })
    }
}
