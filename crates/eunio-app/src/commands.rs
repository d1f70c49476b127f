//! CLI 하위 명령 처리.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use eunio_app::wiring::AppContext;
use eunio_core::models::backup::MergeStrategy;
use eunio_core::models::settings::{SyncStatus, UserSettings};
use eunio_core::models::units::UnitSystem;
use eunio_settings::UpdateOutcome;
use tokio_stream::StreamExt;
use tracing::info;

use crate::lifecycle::LifecycleManager;

/// 하위 명령
#[derive(Subcommand, Debug)]
pub enum Command {
    /// 현재 설정 출력
    Show {
        /// 전송 형식(JSON)으로 출력
        #[arg(long)]
        json: bool,
    },
    /// 설정 내보내기 (경로 생략 시 표준 출력)
    Export { path: Option<PathBuf> },
    /// 설정 가져오기
    Import {
        path: PathBuf,
        /// 병합 전략
        #[arg(long, value_enum, default_value_t = StrategyArg::Replace)]
        strategy: StrategyArg,
    },
    /// 기본값으로 초기화
    Reset {
        /// 단위 선호는 유지
        #[arg(long)]
        keep_units: bool,
    },
    /// 원격 저장소와 동기화
    Sync,
    /// 단위 체계 직접 선택 (metric, imperial)
    Units { system: UnitSystem },
    /// 국가 코드 기본 단위 적용 (직접 고른 단위는 유지)
    Locale { country: String },
    /// 주기 선호 변경
    Cycle {
        /// 평균 주기 길이 (21~45일)
        #[arg(long)]
        length: Option<u32>,
        /// 평균 황체기 길이 (10~16일)
        #[arg(long)]
        luteal: Option<u32>,
        /// 생리 기간 (1~8일)
        #[arg(long)]
        period: Option<u32>,
    },
    /// 전역 알림 켜기/끄기
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// 백업 목록
    Backups,
    /// 백업 복원
    Restore { backup_id: String },
    /// 연결 상태를 감시하며 설정 변경 출력 (Ctrl+C로 종료)
    Watch {
        /// 동기화 재시도 간격 (초)
        #[arg(long, default_value = "300")]
        interval_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Replace,
    PreferNewer,
    KeepManualUnits,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Replace => MergeStrategy::Replace,
            StrategyArg::PreferNewer => MergeStrategy::PreferNewer,
            StrategyArg::KeepManualUnits => MergeStrategy::KeepManualUnits,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// 하위 명령 실행
pub async fn run(context: &AppContext, command: Command) -> Result<()> {
    let manager = &context.manager;

    match command {
        Command::Show { json } => {
            let settings = manager.get_user_settings().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                print_summary(&settings);
            }
        }
        Command::Export { path } => {
            let data = manager.export_settings().await?;
            match path {
                Some(path) => {
                    std::fs::write(&path, data)
                        .with_context(|| format!("내보내기 파일 쓰기 실패: {}", path.display()))?;
                    println!("✅ 설정 내보내기: {}", path.display());
                }
                None => println!("{data}"),
            }
        }
        Command::Import { path, strategy } => {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("가져오기 파일 읽기 실패: {}", path.display()))?;
            let outcome = manager.import_settings_with(&data, strategy.into()).await?;
            println!("✅ 설정 가져오기 완료 (v{})", outcome.settings.version);
            print_warnings(&outcome);
        }
        Command::Reset { keep_units } => {
            let outcome = manager.reset_to_defaults(keep_units).await?;
            println!("✅ 기본값으로 초기화 (v{})", outcome.settings.version);
            print_warnings(&outcome);
        }
        Command::Sync => {
            if context.connectivity.is_none() {
                println!("🔌 원격 서버 미설정, 로컬 설정만 사용합니다");
                println!("💡 서버 연결: eunio --server https://your-server sync");
            }
            let outcome = manager.sync_settings().await?;
            print_sync_status(&outcome.settings);
            print_warnings(&outcome);
        }
        Command::Units { system } => {
            let outcome = manager.set_unit_system(system).await?;
            println!("✅ 단위 체계: {system}");
            print_warnings(&outcome);
        }
        Command::Locale { country } => {
            let applied = manager.initialize_units_from_locale(&country).await;
            let manual = manager.unit_preferences().await?.is_manually_set;
            let suffix = if manual {
                " (직접 선택한 단위 유지)"
            } else {
                ""
            };
            println!("🌐 {country} → {applied}{suffix}");
        }
        Command::Cycle {
            length,
            luteal,
            period,
        } => {
            let mut prefs = manager.cycle_preferences().await?;
            if length.is_none() && luteal.is_none() && period.is_none() {
                println!(
                    "🩸 주기 {}일 / 황체기 {}일 / 생리 {}일",
                    prefs.average_cycle_length,
                    prefs.average_luteal_phase_length,
                    prefs.period_duration
                );
                return Ok(());
            }
            if let Some(length) = length {
                prefs.average_cycle_length = length;
            }
            if let Some(luteal) = luteal {
                prefs.average_luteal_phase_length = luteal;
            }
            if let Some(period) = period {
                prefs.period_duration = period;
            }
            prefs.is_customized = true;

            let outcome = manager.update_cycle_preferences(prefs).await?;
            println!("✅ 주기 선호 저장 (v{})", outcome.settings.version);
            print_warnings(&outcome);
        }
        Command::Notifications { state } => {
            let mut prefs = manager.notification_preferences().await?;
            prefs.global_notifications_enabled = matches!(state, Toggle::On);
            let outcome = manager.update_notification_preferences(prefs).await?;
            print_warnings(&outcome);

            let scheduled = context.notifier.scheduled().await;
            if scheduled.is_empty() {
                println!("🔕 예약된 알림 없음");
            } else {
                println!("🔔 예약된 알림 {}건", scheduled.len());
                for request in scheduled {
                    println!("   {} {} ({:?})", request.time, request.title, request.repeat);
                }
            }
        }
        Command::Backups => {
            let backups = manager.list_backups().await?;
            if backups.is_empty() {
                println!("📦 백업 없음");
            }
            for backup in backups {
                println!(
                    "📦 {}  v{}  {}  {}B",
                    backup.backup_id,
                    backup.settings_version,
                    backup.created_at.format("%Y-%m-%d %H:%M:%S"),
                    backup.size_bytes
                );
            }
        }
        Command::Restore { backup_id } => {
            let outcome = manager.restore_backup(&backup_id).await?;
            println!("✅ 백업 복원 완료 (v{})", outcome.settings.version);
            print_warnings(&outcome);
        }
        Command::Watch { interval_secs } => {
            watch(context, Duration::from_secs(interval_secs.max(1))).await?;
        }
    }

    Ok(())
}

/// 설정 변경을 출력하며 대기. 연결 복구와 주기 재시도 시 자동 동기화.
async fn watch(context: &AppContext, interval: Duration) -> Result<()> {
    let lifecycle = LifecycleManager::new();
    let mut shutdown = lifecycle.subscribe();
    tokio::spawn(async move { lifecycle.wait_for_signal().await });

    let listener = context.connectivity.as_ref().map(|connectivity| {
        context
            .manager
            .clone()
            .spawn_connectivity_listener(connectivity.subscribe())
    });

    let mut changes = Box::pin(context.manager.observe_settings_changes().await?);
    let mut ticker = tokio::time::interval(interval);

    println!("👀 설정 변경 감시 중 (Ctrl+C로 종료)");

    loop {
        tokio::select! {
            Some(settings) = changes.next() => {
                println!(
                    "🔄 v{} {} ({})",
                    settings.version,
                    settings.sync_status.as_str(),
                    settings.last_modified.format("%H:%M:%S")
                );
            }
            _ = ticker.tick() => {
                if context.connectivity.is_some() {
                    context.manager.on_connectivity_changed(true).await;
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Some(handle) = listener {
        handle.abort();
    }
    info!("설정 감시 종료");
    Ok(())
}

fn print_summary(settings: &UserSettings) {
    let units = &settings.unit_preferences;
    let cycle = &settings.cycle_preferences;
    let notifications = &settings.notification_preferences;
    let sync = &settings.sync_preferences;

    let on_off = |enabled: bool| if enabled { "켜짐" } else { "꺼짐" };
    let manual = if units.is_manually_set {
        " (직접 선택)"
    } else {
        ""
    };
    let last_sync = sync
        .last_sync_time
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "없음".to_string());

    println!(
        "👤 {} (v{}, {})",
        settings.user_id,
        settings.version,
        settings.sync_status.as_str()
    );
    println!("   단위      {}{manual}", units.system());
    println!(
        "   주기      {}일 / 황체기 {}일 / 생리 {}일",
        cycle.average_cycle_length,
        cycle.average_luteal_phase_length,
        cycle.period_duration
    );
    println!(
        "   알림      {} ({}종 활성)",
        on_off(notifications.global_notifications_enabled),
        notifications.enabled_types().count()
    );
    println!(
        "   자동 동기화 {}, 마지막 동기화 {last_sync}",
        on_off(sync.auto_sync_enabled)
    );
    println!(
        "   수정 시각 {}",
        settings.last_modified.format("%Y-%m-%d %H:%M:%S")
    );
}

fn print_sync_status(settings: &UserSettings) {
    match settings.sync_status {
        SyncStatus::Synced => println!("✅ 동기화 완료 (v{})", settings.version),
        SyncStatus::Conflict => {
            println!("⚠️  동기화 충돌: 같은 시각에 로컬과 원격이 서로 다르게 수정되었습니다")
        }
        SyncStatus::Error => println!("❌ 동기화 실패: 다음 연결 시 다시 시도합니다"),
        other => println!("ℹ️  동기화 상태: {}", other.as_str()),
    }
}

fn print_warnings(outcome: &UpdateOutcome) {
    for warning in &outcome.warnings {
        eprintln!("⚠️  {warning}");
    }
}
