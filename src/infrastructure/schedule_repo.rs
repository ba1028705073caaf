use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::domain::date_key::DateKey;
use crate::domain::schedule_model::{ColumnIndex, DaySchedule, Placement, RowSlot, ServiceSlot};
use crate::domain::service_model::ServiceCatalog;
use crate::domain::worker_model::WorkerCatalog;
use crate::error::Result;

/// 日付ごとのボードを保存する
/// 更新系はすべてここを通すので保存漏れが起きない
pub struct ScheduleRepository {
    pool: SqlitePool,
}

// =====================
// DB読み込み用ヘルパー構造体
// =====================

#[derive(FromRow)]
struct ScheduleRowRecord {
    row_no: i64,
    worker_name: String,
    time_in: String,
}

#[derive(FromRow)]
struct ServiceSlotRecord {
    row_no: i64,
    column_no: i64,
    top_code: String,
    bottom_code: String,
    full_code: String,
}

fn to_row(row_no: i64) -> Option<RowSlot> {
    u32::try_from(row_no).ok().and_then(|n| RowSlot::new(n).ok())
}

fn to_column(column_no: i64) -> Option<ColumnIndex> {
    u32::try_from(column_no).ok().and_then(|n| ColumnIndex::new(n).ok())
}

impl ScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 保存済みのボードを返す。無ければ空のボード (エラーにはしない)
    pub async fn load(&self, date: DateKey) -> Result<DaySchedule> {
        let key = date.to_string();
        let mut schedule = DaySchedule::new();

        let rows: Vec<ScheduleRowRecord> = sqlx::query_as(
            "SELECT row_no, worker_name, time_in FROM schedule_rows
             WHERE date_key = ?1 ORDER BY row_no ASC",
        )
        .bind(&key)
        .fetch_all(&self.pool)
        .await?;

        for record in rows {
            let Some(row) = to_row(record.row_no) else {
                tracing::warn!(date = %date, row_no = record.row_no, "Skipping out-of-range row");
                continue;
            };
            let entry = schedule.entry_mut(row);
            entry.worker_name = record.worker_name;
            entry.time_in = record.time_in;
        }

        let slots: Vec<ServiceSlotRecord> = sqlx::query_as(
            "SELECT row_no, column_no, top_code, bottom_code, full_code
             FROM service_slots WHERE date_key = ?1 ORDER BY row_no ASC, column_no ASC",
        )
        .bind(&key)
        .fetch_all(&self.pool)
        .await?;

        for record in slots {
            let position = (to_row(record.row_no), to_column(record.column_no));
            let (Some(row), Some(column)) = position else {
                tracing::warn!(
                    date = %date,
                    row_no = record.row_no,
                    column_no = record.column_no,
                    "Skipping out-of-range service slot"
                );
                continue;
            };
            *schedule.entry_mut(row).slot_mut(column) =
                ServiceSlot::from_parts(&record.top_code, &record.bottom_code, &record.full_code);
        }

        Ok(schedule)
    }

    /// 指定日のボードを丸ごと置き換える (1トランザクション)
    pub async fn save(&self, date: DateKey, schedule: &DaySchedule) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_day(&mut *tx, date, schedule).await?;
        tx.commit().await?;

        tracing::debug!(date = %date, "Schedule saved");
        Ok(())
    }

    /// その日に何か入力されているか
    pub async fn has_schedule(&self, date: DateKey) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM schedule_rows WHERE date_key = ?1)",
        )
        .bind(date.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    /// 保存済みの日付 (昇順)
    pub async fn list_dates(&self) -> Result<Vec<DateKey>> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT date_key FROM day_schedules ORDER BY date_key ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(keys
            .into_iter()
            .filter_map(|key| match key.parse::<DateKey>() {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Ignoring malformed date key");
                    None
                }
            })
            .collect())
    }

    pub async fn delete(&self, date: DateKey) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        clear_day(&mut *tx, &date.to_string()).await?;
        let result = sqlx::query("DELETE FROM day_schedules WHERE date_key = ?1")
            .bind(date.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // =================================================================
    // 1行だけ書き換えて保存する操作
    // =================================================================

    pub async fn set_worker_name(
        &self,
        date: DateKey,
        row: RowSlot,
        name: &str,
    ) -> Result<DaySchedule> {
        let mut schedule = self.load(date).await?;
        schedule.set_worker_name(row, name);
        self.save(date, &schedule).await?;
        Ok(schedule)
    }

    /// 名前の書き込みと出勤時刻の打刻を1回の保存で行う
    /// 名前も時刻も空だった行に名前が入ったときだけ `time_in` を入れる
    pub async fn sign_in(
        &self,
        date: DateKey,
        row: RowSlot,
        name: &str,
        time_in: &str,
    ) -> Result<DaySchedule> {
        let mut schedule = self.load(date).await?;
        let entry = schedule.entry(row);
        let stamp = entry.worker_name.is_empty() && entry.time_in.is_empty() && !name.is_empty();

        schedule.set_worker_name(row, name);
        if stamp {
            schedule.set_time_in(row, time_in);
        }
        self.save(date, &schedule).await?;
        Ok(schedule)
    }

    pub async fn set_time_in(
        &self,
        date: DateKey,
        row: RowSlot,
        time_in: &str,
    ) -> Result<DaySchedule> {
        let mut schedule = self.load(date).await?;
        schedule.set_time_in(row, time_in);
        self.save(date, &schedule).await?;
        Ok(schedule)
    }

    /// 施術コードを書き込む
    /// 検証エラーのときは何も保存せずにエラーを返す
    #[allow(clippy::too_many_arguments)]
    pub async fn set_service_slot(
        &self,
        date: DateKey,
        row: RowSlot,
        column: ColumnIndex,
        placement: Placement,
        code: &str,
        services: &ServiceCatalog,
        skill_check: Option<&WorkerCatalog>,
    ) -> Result<DaySchedule> {
        let mut schedule = self.load(date).await?;
        schedule.apply_service_code(row, column, placement, code, services, skill_check)?;
        self.save(date, &schedule).await?;
        Ok(schedule)
    }
}

async fn clear_day(conn: &mut SqliteConnection, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM service_slots WHERE date_key = ?1")
        .bind(key)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM schedule_rows WHERE date_key = ?1")
        .bind(key)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn write_day(
    conn: &mut SqliteConnection,
    date: DateKey,
    schedule: &DaySchedule,
) -> Result<()> {
    let key = date.to_string();

    // 1. 親テーブル
    sqlx::query("INSERT OR IGNORE INTO day_schedules (date_key) VALUES (?1)")
        .bind(&key)
        .execute(&mut *conn)
        .await?;

    // 2. 前の内容を消す
    clear_day(conn, &key).await?;

    // 3. 空でない行とセルだけ書き込む
    for (row, entry) in schedule.iter().filter(|(_, entry)| !entry.is_blank()) {
        sqlx::query(
            "INSERT INTO schedule_rows (date_key, row_no, worker_name, time_in)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&key)
        .bind(row.number() as i64)
        .bind(&entry.worker_name)
        .bind(&entry.time_in)
        .execute(&mut *conn)
        .await?;

        for column in ColumnIndex::all() {
            let slot = entry.slot(column);
            if slot.is_empty() {
                continue;
            }
            let (top, bottom, full) = slot.to_parts();
            sqlx::query(
                "INSERT INTO service_slots
                    (date_key, row_no, column_no, top_code, bottom_code, full_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&key)
            .bind(row.number() as i64)
            .bind(column.number() as i64)
            .bind(top)
            .bind(bottom)
            .bind(full)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}
