use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::date_key::DateKey;
use crate::domain::selection::{HighlightSet, SelectionMode};
use crate::domain::service_model::{normalize_code, ServiceCode};
use crate::domain::worker_model::WorkerCatalog;
use crate::error::Result;

// =====================
// kv_store のキー
// =====================
const KEY_WORKERS: &str = "workers";
const KEY_HIGHLIGHTS: &str = "highlights";
const KEY_SELECTED_SERVICE: &str = "selectedService";
const KEY_CURRENT_DATE: &str = "currentDate";
const KEY_SELECTION_MODE: &str = "selectionMode";

/// 日付に依存しない状態を保存する
/// (スタッフ一覧 / ハイライト / 選択メニュー / 表示中の日付)
/// 値はすべて JSON 文字列で持つ
pub struct StateRepository {
    pool: SqlitePool,
}

impl StateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        put_raw(&mut *conn, key, value).await
    }

    /// 壊れた JSON は警告を出して「データ無し」として扱う
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = key, error = %e, "Malformed stored value, using defaults");
                Ok(None)
            }
        }
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        put_json(&mut *conn, key, value).await
    }

    // =====================
    // スタッフ一覧
    // =====================

    /// 保存されていなければ初期ロスター
    pub async fn load_workers(&self) -> Result<WorkerCatalog> {
        Ok(self
            .get_json::<WorkerCatalog>(KEY_WORKERS)
            .await?
            .unwrap_or_else(WorkerCatalog::default_roster))
    }

    pub async fn save_workers(&self, workers: &WorkerCatalog) -> Result<()> {
        self.put_json(KEY_WORKERS, workers).await?;
        tracing::debug!(workers = workers.len(), "Worker catalog saved");
        Ok(())
    }

    // =====================
    // ハイライト
    // =====================

    pub async fn load_highlights(&self) -> Result<HighlightSet> {
        let names: Vec<String> = self.get_json(KEY_HIGHLIGHTS).await?.unwrap_or_default();
        Ok(HighlightSet::from_names(names))
    }

    pub async fn save_highlights(&self, highlights: &HighlightSet) -> Result<()> {
        self.put_json(KEY_HIGHLIGHTS, highlights).await
    }

    // =====================
    // 選択中のメニュー
    // =====================

    /// 空文字は未選択
    pub async fn load_selected_service(&self) -> Result<Option<ServiceCode>> {
        let code: Option<String> = self.get_json(KEY_SELECTED_SERVICE).await?;
        Ok(code.map(|c| normalize_code(&c)).filter(|c| !c.is_empty()))
    }

    pub async fn save_selected_service(&self, code: Option<&str>) -> Result<()> {
        self.put_json(KEY_SELECTED_SERVICE, code.unwrap_or("")).await
    }

    /// 保存されていない (古いデータ) ときは None
    pub async fn load_selection_mode(&self) -> Result<Option<SelectionMode>> {
        self.get_json(KEY_SELECTION_MODE).await
    }

    pub async fn save_selection_mode(&self, mode: &SelectionMode) -> Result<()> {
        self.put_json(KEY_SELECTION_MODE, mode).await
    }

    // =====================
    // 表示中の日付
    // =====================

    pub async fn load_current_date(&self) -> Result<Option<DateKey>> {
        self.get_json(KEY_CURRENT_DATE).await
    }

    pub async fn save_current_date(&self, date: DateKey) -> Result<()> {
        self.put_json(KEY_CURRENT_DATE, &date).await
    }
}

// =====================
// トランザクション内で使う書き込み
// =====================

async fn put_raw(conn: &mut SqliteConnection, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn put_json<T: Serialize + ?Sized>(
    conn: &mut SqliteConnection,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    put_raw(conn, key, &raw).await
}

/// 取り込んだ状態を kv_store に書く
///
/// スナップショットにはハイライトの状態 (mode) が無いので消しておき、
/// 次に開いたときにメニュー選択とハイライトから判断させる
pub(crate) async fn write_imported_state(
    conn: &mut SqliteConnection,
    workers: Option<&WorkerCatalog>,
    highlights: &HighlightSet,
    selected_service: Option<&str>,
    current_date: DateKey,
) -> Result<()> {
    if let Some(workers) = workers {
        put_json(conn, KEY_WORKERS, workers).await?;
    }
    put_json(conn, KEY_HIGHLIGHTS, highlights).await?;
    put_json(conn, KEY_SELECTED_SERVICE, selected_service.unwrap_or("")).await?;
    put_json(conn, KEY_CURRENT_DATE, &current_date).await?;
    sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(KEY_SELECTION_MODE)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
