//! # eunio
//!
//! Eunio 설정 관리 CLI 진입점.
//! 설정 파일 로드, tracing 초기화, DI 와이어링 후 하위 명령을 실행한다.

mod commands;
mod lifecycle;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use eunio_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// 설정 DB 파일 이름
const DB_FILE_NAME: &str = "eunio.db";

/// Eunio 사용자 설정 도구
///
/// 로컬 저장소와 원격 문서 저장소 사이에서 사용자 설정을 관리하고 동기화한다
#[derive(Parser, Debug)]
#[command(name = "eunio")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 사용자 ID
    #[arg(long, short = 'u', default_value = "local-user")]
    user: String,

    /// 오프라인 모드로 실행 (설정 파일의 서버 URL 무시)
    #[arg(long, short = 'o')]
    offline: bool,

    /// 원격 설정 저장소 URL (설정 파일보다 우선)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn")]
    log_level: String,

    /// 데이터 저장 경로 (설정 파일과 DB 모두 이 경로에 둔다)
    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// 설정 파일/DB 디렉토리 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/com.eunio.settings/`
/// - Windows: `%APPDATA%\eunio\settings\`
/// - Linux: `~/.config/settings/` (설정), `~/.local/share/settings/` (DB)
fn resolve_dirs(data_dir: Option<&str>) -> (PathBuf, PathBuf) {
    if let Some(dir) = data_dir {
        let dir = PathBuf::from(dir);
        return (dir.clone(), dir);
    }
    ProjectDirs::from("com", "eunio", "settings")
        .map(|p| (p.config_dir().to_path_buf(), p.data_dir().to_path_buf()))
        .unwrap_or_else(|| (PathBuf::from("."), PathBuf::from(".")))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "eunio={lvl},eunio_app={lvl},eunio_core={lvl},eunio_storage={lvl},eunio_network={lvl},eunio_settings={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정 로드
    let (config_dir, data_dir) = resolve_dirs(args.data_dir.as_deref());
    let config_manager = ConfigManager::with_path(config_dir.join(CONFIG_FILE_NAME))?;
    let mut config = config_manager.get();

    // CLI 인자로 설정 오버라이드
    if let Some(server_url) = args.server {
        config.sync.server_url = Some(server_url);
    }
    if args.offline {
        info!("오프라인 모드: 원격 동기화 비활성화");
        config.sync.server_url = None;
    }

    let db_path = match config.storage.db_path.clone() {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&data_dir).with_context(|| {
                format!("데이터 디렉토리 생성 실패: {}", data_dir.display())
            })?;
            data_dir.join(DB_FILE_NAME)
        }
    };

    let context = eunio_app::wiring::build(&config, &args.user, &db_path)?;
    info!("Eunio 설정 관리 시작: user={}", args.user);

    commands::run(&context, args.command).await
}
