use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

use config::BoardConfig;
use domain::date_key::DateKey;
use error::Result;
use infrastructure::legacy_json::ImportedState;
use infrastructure::schedule_repo::{write_day, ScheduleRepository};
use infrastructure::state_repo::{write_imported_state, StateRepository};

// 全てのリポジトリを保持するコンテナ
pub struct AppServices {
    pub schedule: ScheduleRepository,
    pub state: StateRepository,
    pool: SqlitePool,
}

impl AppServices {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            // poolは内部で参照カウントされているのでcloneしても低コスト
            schedule: ScheduleRepository::new(pool.clone()),
            state: StateRepository::new(pool.clone()),
            pool,
        }
    }

    /// スナップショットの中身をまとめて書き込む
    /// ボードと kv_store を1つのトランザクションで書く。失敗したら何も変わらない
    pub async fn import_state(&self, state: &ImportedState, current_date: DateKey) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (date, schedule) in &state.days {
            write_day(&mut *tx, *date, schedule).await?;
        }
        write_imported_state(
            &mut *tx,
            state.workers.as_ref(),
            &state.highlights,
            state.selected_service.as_deref(),
            current_date,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(days = state.days.len(), date = %current_date, "Imported state saved");
        Ok(())
    }
}

// =====================
// DB 接続
// =====================

/// DB を開いてマイグレーションまで済ませる
pub async fn open_pool(config: &BoardConfig) -> Result<SqlitePool> {
    if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!(db = %config.db_path.display(), "Database ready");
    Ok(pool)
}
