use std::path::Path;

use chrono::NaiveTime;

use crate::application::dto::BoardView;
use crate::application::time::{format_time_in, parse_time_in, today_local};
use crate::config::BoardConfig;
use crate::domain::date_key::DateKey;
use crate::domain::schedule_model::{ColumnIndex, DaySchedule, Placement, RowSlot};
use crate::domain::selection::{RotationInput, SelectionState};
use crate::domain::service_model::{normalize_code, ServiceCatalog};
use crate::domain::worker_model::{parse_skills, WorkerCatalog};
use crate::error::{BoardError, Result};
use crate::infrastructure::legacy_json::{read_snapshot, write_snapshot, LegacySnapshot};
use crate::AppServices;

/// 画面1つ分のアプリケーション状態
///
/// 表示中の日付とボード、スタッフ一覧、ハイライト状態をまとめて持つ
/// ユーザー操作はすべてこのメソッドを通し、変更はその場で保存する
pub struct BoardSession {
    repo: AppServices,
    services: ServiceCatalog,
    validate_skills: bool,
    date: DateKey,
    schedule: DaySchedule,
    workers: WorkerCatalog,
    selection: SelectionState,
}

impl BoardSession {
    /// 保存済みの状態からセッションを作る
    ///
    /// `date` が None なら前回表示していた日付、それも無ければ今日
    pub async fn open(
        repo: AppServices,
        services: ServiceCatalog,
        config: &BoardConfig,
        date: Option<DateKey>,
    ) -> Result<Self> {
        let date = match date {
            Some(date) => date,
            None => repo.state.load_current_date().await?.unwrap_or_else(today_local),
        };
        let schedule = repo.schedule.load(date).await?;
        let workers = repo.state.load_workers().await?;
        let mode = repo.state.load_selection_mode().await?;
        let selected = repo.state.load_selected_service().await?;
        let highlights = repo.state.load_highlights().await?;

        let selection = {
            let input = RotationInput {
                schedule: &schedule,
                workers: &workers,
                services: &services,
            };
            SelectionState::restore(mode, selected, highlights, &input)
        };

        repo.state.save_current_date(date).await?;
        tracing::info!(date = %date, workers = workers.len(), "Board opened");

        Ok(Self {
            repo,
            services,
            validate_skills: config.validate_skills,
            date,
            schedule,
            workers,
            selection,
        })
    }

    pub fn date(&self) -> DateKey {
        self.date
    }

    pub fn schedule(&self) -> &DaySchedule {
        &self.schedule
    }

    pub fn workers(&self) -> &WorkerCatalog {
        &self.workers
    }

    pub fn services(&self) -> &ServiceCatalog {
        &self.services
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn view(&self) -> BoardView {
        BoardView::build(
            self.date,
            &self.schedule,
            &self.workers,
            &self.services,
            &self.selection,
        )
    }

    fn rotation_input(&self) -> RotationInput<'_> {
        RotationInput {
            schedule: &self.schedule,
            workers: &self.workers,
            services: &self.services,
        }
    }

    async fn save_selection(&self) -> Result<()> {
        self.repo.state.save_highlights(self.selection.highlights()).await?;
        self.repo
            .state
            .save_selected_service(self.selection.selected_service())
            .await?;
        self.repo.state.save_selection_mode(self.selection.mode()).await
    }

    // =================================================================
    // 日付の移動
    // =================================================================

    /// ハイライトとメニュー選択は日付をまたいで維持する
    pub async fn goto(&mut self, date: DateKey) -> Result<&DaySchedule> {
        self.schedule = self.repo.schedule.load(date).await?;
        self.date = date;
        self.repo.state.save_current_date(date).await?;
        tracing::info!(date = %date, "Moved to date");
        Ok(&self.schedule)
    }

    pub async fn previous_day(&mut self) -> Result<&DaySchedule> {
        self.goto(self.date.previous_day()).await
    }

    pub async fn next_day(&mut self) -> Result<&DaySchedule> {
        self.goto(self.date.next_day()).await
    }

    pub async fn has_schedule(&self, date: DateKey) -> Result<bool> {
        self.repo.schedule.has_schedule(date).await
    }

    pub async fn list_dates(&self) -> Result<Vec<DateKey>> {
        self.repo.schedule.list_dates().await
    }

    // =================================================================
    // ボードの編集
    // =================================================================

    /// 名前の入力
    ///
    /// 登録名と大文字小文字違いなら登録名にそろえる
    /// 空だった行に名前が入り出勤時刻が空なら `now` を打刻する
    pub async fn set_worker_name(
        &mut self,
        row: RowSlot,
        input: &str,
        now: NaiveTime,
    ) -> Result<&DaySchedule> {
        let name = self.workers.resolve_name(input);
        let time_in = format_time_in(now);
        self.schedule = self.repo.schedule.sign_in(self.date, row, &name, &time_in).await?;

        tracing::info!(date = %self.date, row = %row, worker = %name, "Worker name set");
        Ok(&self.schedule)
    }

    /// "HH:MM" か空文字 (クリア)
    pub async fn set_time_in(&mut self, row: RowSlot, input: &str) -> Result<&DaySchedule> {
        let time_in = parse_time_in(input)?;
        self.schedule = self.repo.schedule.set_time_in(self.date, row, &time_in).await?;
        tracing::info!(date = %self.date, row = %row, time_in = %time_in, "Time-in set");
        Ok(&self.schedule)
    }

    /// 施術コードの記録
    ///
    /// 検証エラーのときはボードもハイライトも変更しない
    /// 記録できたらその行のスタッフのハイライトを外し
    /// メニュー選択をリセットする
    pub async fn record_service(
        &mut self,
        row: RowSlot,
        column: ColumnIndex,
        placement: Placement,
        code: &str,
    ) -> Result<&DaySchedule> {
        let skill_check = self.validate_skills.then_some(&self.workers);
        let updated = self
            .repo
            .schedule
            .set_service_slot(self.date, row, column, placement, code, &self.services, skill_check)
            .await?;
        self.schedule = updated;

        let code = normalize_code(code);
        let worker = self.schedule.entry(row).worker_name.clone();
        if code.is_empty() {
            tracing::info!(
                date = %self.date,
                row = %row,
                column = column.number(),
                %placement,
                "Service cleared"
            );
        } else {
            self.selection.record_service_for(&worker);
            self.save_selection().await?;
            tracing::info!(
                date = %self.date,
                row = %row,
                column = column.number(),
                worker = %worker,
                service = %code,
                "Service recorded"
            );
        }
        Ok(&self.schedule)
    }

    /// 名前入力の候補 (他の行で使われている名前は除く)
    pub fn suggest(&self, row: RowSlot, prefix: &str) -> Vec<String> {
        let assigned = self.schedule.assigned_names_except(row);
        self.workers.suggest(prefix, &assigned)
    }

    // =================================================================
    // ハイライト
    // =================================================================

    /// メニューを選んで次の担当者をハイライトする。空文字は選択解除
    pub async fn select_service(&mut self, code: &str) -> Result<Option<String>> {
        let normalized = normalize_code(code);
        if !normalized.is_empty() && self.services.lookup(&normalized).is_none() {
            return Err(BoardError::UnknownService(normalized));
        }

        let input = RotationInput {
            schedule: &self.schedule,
            workers: &self.workers,
            services: &self.services,
        };
        let picked = self.selection.select_service(&normalized, &input);
        self.save_selection().await?;

        tracing::info!(service = %normalized, picked = ?picked, "Service selected");
        Ok(picked)
    }

    /// 「次の人」。メニュー未選択なら何もしない
    pub async fn advance(&mut self) -> Result<Option<String>> {
        let input = RotationInput {
            schedule: &self.schedule,
            workers: &self.workers,
            services: &self.services,
        };
        let next = self.selection.advance(&input);
        if next.is_some() {
            self.save_selection().await?;
        }
        Ok(next)
    }

    /// 名前クリックでハイライトを付け外しする。付いたら true
    pub async fn toggle_highlight(&mut self, name: &str) -> Result<bool> {
        let highlighted = self.selection.toggle_manual(name);
        self.save_selection().await?;
        tracing::info!(worker = %name.trim(), highlighted, "Highlight toggled");
        Ok(highlighted)
    }

    // =================================================================
    // スタッフ管理
    // =================================================================

    /// `skills` はカンマ区切り ("P, M, G")
    pub async fn add_worker(&mut self, name: &str, skills: &str) -> Result<()> {
        self.workers.add_worker(name, parse_skills(skills))?;
        self.repo.state.save_workers(&self.workers).await?;
        tracing::info!(worker = %name.trim(), "Worker added");
        Ok(())
    }

    pub async fn rename_worker(&mut self, old: &str, new: &str) -> Result<()> {
        self.workers.rename_worker(old, new)?;
        self.repo.state.save_workers(&self.workers).await?;
        tracing::info!(from = %old, to = %new.trim(), "Worker renamed");
        Ok(())
    }

    pub async fn set_worker_skills(&mut self, name: &str, skills: &str) -> Result<()> {
        self.workers.set_skills(name, parse_skills(skills))?;
        self.repo.state.save_workers(&self.workers).await?;
        tracing::info!(worker = %name, "Worker skills updated");
        Ok(())
    }

    /// ボード上の名前はそのまま残る (以後はスキル確認の対象外になる)
    pub async fn remove_worker(&mut self, name: &str) -> Result<()> {
        self.workers.remove_worker(name)?;
        self.repo.state.save_workers(&self.workers).await?;
        tracing::info!(worker = %name, "Worker removed");
        Ok(())
    }

    // =================================================================
    // スナップショット (ブラウザ版の JSON 形式)
    // =================================================================

    /// 取り込み。含まれる日付のボードとスタッフ一覧、ハイライト状態を置き換える
    /// ファイルが読めない / 書き込みに失敗したときは何も変更しない
    pub async fn import_snapshot(&mut self, path: &Path) -> Result<usize> {
        let state = read_snapshot(path)?.into_state();
        let imported_days = state.days.len();
        let date = state.current_date.unwrap_or(self.date);

        self.repo.import_state(&state, date).await?;

        // 保存した内容で状態を読み直す
        self.workers = self.repo.state.load_workers().await?;
        self.schedule = self.repo.schedule.load(date).await?;
        self.date = date;
        let selection = SelectionState::restore(
            None,
            state.selected_service,
            state.highlights,
            &self.rotation_input(),
        );
        self.selection = selection;
        self.repo.state.save_selection_mode(self.selection.mode()).await?;

        tracing::info!(path = %path.display(), days = imported_days, "Snapshot imported");
        Ok(imported_days)
    }

    /// 保存済みの全日付を書き出す
    pub async fn export_snapshot(&self, path: &Path) -> Result<usize> {
        let mut days = Vec::new();
        for date in self.repo.schedule.list_dates().await? {
            let schedule = self.repo.schedule.load(date).await?;
            if !schedule.is_blank() {
                days.push((date, schedule));
            }
        }

        let snapshot = LegacySnapshot::from_state(
            &days,
            &self.workers,
            self.selection.highlights(),
            self.selection.selected_service(),
            Some(self.date),
        );
        write_snapshot(path, &snapshot)?;

        tracing::info!(path = %path.display(), days = days.len(), "Snapshot exported");
        Ok(days.len())
    }
}
