mod tools;

#[cfg(test)]
mod command_tests {
    use chrono::NaiveTime;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use salon_turn_board_lib::{
        application::commands::BoardSession,
        config::BoardConfig,
        domain::{
            date_key::DateKey,
            schedule_model::{ColumnIndex, DaySchedule, Placement, RowSlot, ServiceSlot},
            selection::{HighlightSet, SelectionMode},
            service_model::ServiceCatalog,
            worker_model::WorkerCatalog,
        },
        error::BoardError,
        infrastructure::legacy_json::{write_snapshot, LegacySnapshot},
        AppServices,
    };

    use crate::tools;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create memory pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    async fn open_session(
        pool: &SqlitePool,
        config: &BoardConfig,
        date: Option<DateKey>,
    ) -> BoardSession {
        let services = ServiceCatalog::standard().unwrap();
        BoardSession::open(AppServices::new(pool.clone()), services, config, date)
            .await
            .expect("Failed to open session")
    }

    fn monday() -> DateKey {
        "2026-01-05".parse().unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn row(n: u32) -> RowSlot {
        RowSlot::new(n).unwrap()
    }

    fn col(n: u32) -> ColumnIndex {
        ColumnIndex::new(n).unwrap()
    }

    /// Amanda / Ana / Joy / Lily が出勤したボード
    async fn signed_in_session(pool: &SqlitePool) -> BoardSession {
        let mut session = open_session(pool, &BoardConfig::default(), Some(monday())).await;
        session.set_worker_name(row(1), "amanda", at(9, 30)).await.unwrap();
        session.set_worker_name(row(2), "Ana", at(9, 45)).await.unwrap();
        session.set_worker_name(row(3), "JOY", at(10, 0)).await.unwrap();
        session.set_worker_name(row(4), "Lily", at(10, 5)).await.unwrap();
        session
    }

    // ========================================================================
    // 名前入力と出勤時刻
    // ========================================================================

    #[tokio::test]
    async fn test_name_entry_resolves_and_stamps_time() {
        let pool = setup_test_db().await;
        let mut session = open_session(&pool, &BoardConfig::default(), Some(monday())).await;

        session.set_worker_name(row(1), "  amanda ", at(9, 30)).await.unwrap();
        let entry = session.schedule().entry(row(1));
        assert_eq!(entry.worker_name, "Amanda");
        assert_eq!(entry.time_in, "09:30");

        // 既に名前がある行の書き換えでは打刻しない
        session.set_time_in(row(1), "").await.unwrap();
        session.set_worker_name(row(1), "Ana", at(11, 0)).await.unwrap();
        assert_eq!(session.schedule().entry(row(1)).time_in, "");

        // 先に時刻が入っていれば上書きしない
        session.set_time_in(row(2), "8:05").await.unwrap();
        session.set_worker_name(row(2), "Walk-in", at(11, 0)).await.unwrap();
        let entry = session.schedule().entry(row(2));
        assert_eq!(entry.worker_name, "Walk-in");
        assert_eq!(entry.time_in, "08:05");

        let err = session.set_time_in(row(3), "25:61").await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidTime(_)));
    }

    // ========================================================================
    // ローテーションの一連の流れ
    // ========================================================================

    #[tokio::test]
    async fn test_rotation_flow() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;

        // P: Amanda, Ana, Lily (Joy はできない)。全員 0 なので上の行から
        assert_eq!(session.select_service("p").await.unwrap().as_deref(), Some("Amanda"));
        assert_eq!(session.advance().await.unwrap().as_deref(), Some("Ana"));
        assert_eq!(session.advance().await.unwrap().as_deref(), Some("Lily"));
        assert_eq!(session.advance().await.unwrap().as_deref(), Some("Amanda"));

        // Amanda に P を記録 → ハイライトが外れてメニューもリセット
        session
            .record_service(row(1), col(1), Placement::Unified, "P")
            .await
            .unwrap();
        assert!(session.selection().highlights().is_empty());
        assert_eq!(session.selection().selected_service(), None);
        assert_eq!(session.selection().mode(), &SelectionMode::Idle);
        assert_eq!(session.advance().await.unwrap(), None);

        // 次は Ana
        assert_eq!(session.select_service("P").await.unwrap().as_deref(), Some("Ana"));
        session
            .record_service(row(2), col(1), Placement::Unified, "M")
            .await
            .unwrap();
        assert_eq!(
            session.schedule().entry(row(2)).slot(col(1)),
            &ServiceSlot::Half { top: Some("M".into()), bottom: None }
        );

        // Ana 0.5 / Lily 0 → Lily
        assert_eq!(session.select_service("P").await.unwrap().as_deref(), Some("Lily"));

        let view = session.view();
        tools::show_output::show_board_debug_data(&view);

        assert_eq!(view.date_label, "MON 1/5/2026");
        assert_eq!(view.selected_service.as_deref(), Some("P"));
        assert_eq!(view.highlights, vec!["Lily".to_string()]);
        assert_eq!(view.rows[0].load, 1.0);
        assert_eq!(view.rows[0].cells[0], "P");
        assert_eq!(view.rows[0].skills.as_deref(), Some("X, P, M, G, PG"));
        assert_eq!(view.rows[1].load, 0.5);
        assert_eq!(view.rows[1].cells[0], "M/");
        assert!(view.rows[3].highlighted);
        assert!(!view.rows[0].highlighted);
        assert_eq!(view.occupied_rows().count(), 4);
    }

    #[tokio::test]
    async fn test_skill_mismatch_changes_nothing() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;

        session.select_service("P").await.unwrap();
        let before = session.schedule().clone();

        let err = session
            .record_service(row(3), col(1), Placement::Unified, "P")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Joy cannot perform service P"));
        assert!(err.to_string().contains("X, M, G, D, F, FS"));

        assert_eq!(session.schedule(), &before);
        assert_eq!(session.selection().selected_service(), Some("P"));
        assert!(session.selection().is_highlighted("Amanda"));

        // 保存されている内容も変わらない
        let reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.schedule(), &before);
    }

    #[tokio::test]
    async fn test_skill_check_can_be_disabled() {
        let pool = setup_test_db().await;
        signed_in_session(&pool).await;

        let config = BoardConfig {
            validate_skills: false,
            ..BoardConfig::default()
        };
        let mut session = open_session(&pool, &config, None).await;
        session
            .record_service(row(3), col(1), Placement::Unified, "P")
            .await
            .unwrap();
        assert_eq!(session.schedule().entry(row(3)).slot(col(1)), &ServiceSlot::Full("P".into()));

        // メニューに無いコードはスキル確認と関係なく拒否
        let err = session
            .record_service(row(3), col(2), Placement::Unified, "ZZ")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::UnknownService(_)));
    }

    #[tokio::test]
    async fn test_select_unknown_or_unstaffed_service() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;

        let err = session.select_service("ZZ").await.unwrap_err();
        assert!(matches!(err, BoardError::UnknownService(_)));

        // LM は誰もできない → ハイライト無し
        session.toggle_highlight("Joy").await.unwrap();
        assert_eq!(session.select_service("LM").await.unwrap(), None);
        assert!(session.selection().highlights().is_empty());

        // 空文字で選択解除
        assert_eq!(session.select_service("").await.unwrap(), None);
        assert_eq!(session.selection().selected_service(), None);
    }

    // ========================================================================
    // 手動ハイライト
    // ========================================================================

    #[tokio::test]
    async fn test_manual_toggle_and_persistence() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;

        assert!(session.toggle_highlight("Joy").await.unwrap());
        assert!(session.toggle_highlight("Ana").await.unwrap());
        assert!(!session.toggle_highlight("Joy").await.unwrap());
        assert_eq!(session.selection().mode(), &SelectionMode::ManualToggle);
        assert_eq!(session.advance().await.unwrap(), None);

        let reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.selection().highlights().names(), &["Ana".to_string()]);
        assert_eq!(reopened.selection().mode(), &SelectionMode::ManualToggle);
    }

    #[tokio::test]
    async fn test_advance_continues_across_sessions() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        assert_eq!(session.select_service("P").await.unwrap().as_deref(), Some("Amanda"));
        drop(session);

        // コマンドごとに開き直しても順番が進む
        let mut picked = Vec::new();
        for _ in 0..3 {
            let mut session = open_session(&pool, &BoardConfig::default(), None).await;
            picked.push(session.advance().await.unwrap().unwrap());
        }
        assert_eq!(picked, vec!["Ana", "Lily", "Amanda"]);

        let mut reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.date(), monday());
        assert_eq!(reopened.selection().selected_service(), Some("P"));
        assert_eq!(reopened.selection().mode(), &SelectionMode::ServiceSelected("P".into()));
        assert_eq!(reopened.selection().highlights().first(), Some("Amanda"));

        // 対象外になったスタッフは引き継がず選び直す
        reopened.remove_worker("Amanda").await.unwrap();
        drop(reopened);
        let reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.selection().highlights().names(), &["Ana".to_string()]);
    }

    #[tokio::test]
    async fn test_manual_toggle_survives_reopen() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        assert_eq!(session.select_service("P").await.unwrap().as_deref(), Some("Amanda"));
        assert!(!session.toggle_highlight("Amanda").await.unwrap());
        assert!(session.toggle_highlight("Joy").await.unwrap());
        drop(session);

        let mut reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.selection().mode(), &SelectionMode::ManualToggle);
        assert_eq!(reopened.selection().selected_service(), Some("P"));
        assert_eq!(reopened.selection().highlights().names(), &["Joy".to_string()]);

        // 手動切り替え中は「次の人」が効かない
        assert_eq!(reopened.advance().await.unwrap(), None);
        assert_eq!(reopened.selection().highlights().names(), &["Joy".to_string()]);

        // メニューを選び直すとローテーションに戻る
        assert_eq!(reopened.select_service("P").await.unwrap().as_deref(), Some("Amanda"));
        drop(reopened);
        let again = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(again.selection().mode(), &SelectionMode::ServiceSelected("P".into()));
        assert_eq!(again.selection().highlights().names(), &["Amanda".to_string()]);
    }

    // ========================================================================
    // 日付の移動
    // ========================================================================

    #[tokio::test]
    async fn test_day_navigation() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        session.toggle_highlight("Joy").await.unwrap();

        let next = session.next_day().await.unwrap();
        assert!(next.is_blank());
        assert_eq!(session.date().to_string(), "2026-01-06");
        // ハイライトは日付をまたいで残る
        assert!(session.selection().is_highlighted("Joy"));
        assert!(!session.has_schedule(session.date()).await.unwrap());

        let back = session.previous_day().await.unwrap();
        assert_eq!(back.entry(row(1)).worker_name, "Amanda");
        assert!(session.has_schedule(monday()).await.unwrap());

        session.goto("2025-12-31".parse().unwrap()).await.unwrap();
        let reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert_eq!(reopened.date().to_string(), "2025-12-31");
        assert_eq!(session.list_dates().await.unwrap(), vec![monday()]);
    }

    // ========================================================================
    // 名前の候補
    // ========================================================================

    #[tokio::test]
    async fn test_suggest_excludes_other_rows() {
        let pool = setup_test_db().await;
        let session = signed_in_session(&pool).await;

        // Lily は4行目に居るので5行目の候補から外れる
        assert_eq!(session.suggest(row(5), "l"), vec!["Lan", "Lucy", "Lynn"]);
        // 自分の行の名前は候補に残る
        assert_eq!(session.suggest(row(4), "li"), vec!["Lily"]);
        assert_eq!(session.suggest(row(5), "an"), vec!["Angela", "Annie"]);
    }

    // ========================================================================
    // スタッフ管理
    // ========================================================================

    #[tokio::test]
    async fn test_worker_management() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;

        session.add_worker("Mia", "p, m,,pg").await.unwrap();
        assert_eq!(session.workers().skills_of("Mia").unwrap(), &["P", "M", "PG"]);
        assert!(matches!(
            session.add_worker("Mia", "P").await.unwrap_err(),
            BoardError::WorkerExists(_)
        ));
        assert!(matches!(
            session.add_worker("  ", "P").await.unwrap_err(),
            BoardError::EmptyWorkerName
        ));

        session.rename_worker("Mia", "Mia B").await.unwrap();
        session.set_worker_skills("Mia B", "G").await.unwrap();
        assert!(session.workers().can_perform("Mia B", "G"));
        assert!(!session.workers().contains("Mia"));

        // 削除されたスタッフはボードに名前が残ってもスキル確認しない
        session.remove_worker("Joy").await.unwrap();
        session
            .record_service(row(3), col(1), Placement::Unified, "P")
            .await
            .unwrap();
        assert!(matches!(
            session.remove_worker("Joy").await.unwrap_err(),
            BoardError::WorkerNotFound(_)
        ));

        let reopened = open_session(&pool, &BoardConfig::default(), None).await;
        assert!(reopened.workers().contains("Mia B"));
        assert!(!reopened.workers().contains("Joy"));
        assert_eq!(reopened.workers().len(), 18);
    }

    // ========================================================================
    // スナップショット
    // ========================================================================

    #[tokio::test]
    async fn test_export_then_import_into_new_db() {
        let path = std::env::temp_dir()
            .join(format!("salon-board-export-{}.json", std::process::id()));

        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        session
            .record_service(row(1), col(1), Placement::Unified, "M")
            .await
            .unwrap();
        session
            .record_service(row(1), col(1), Placement::Bottom, "M")
            .await
            .unwrap();
        session.select_service("P").await.unwrap();
        assert_eq!(session.export_snapshot(&path).await.unwrap(), 1);

        let other_pool = setup_test_db().await;
        let february: DateKey = "2026-02-01".parse().unwrap();
        let mut restored = open_session(&other_pool, &BoardConfig::default(), Some(february)).await;
        assert_eq!(restored.import_snapshot(&path).await.unwrap(), 1);

        assert_eq!(restored.date(), monday());
        assert_eq!(restored.schedule(), session.schedule());
        assert_eq!(restored.workers(), session.workers());
        assert_eq!(restored.selection().selected_service(), Some("P"));
        assert_eq!(restored.selection().highlights(), session.selection().highlights());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_failed_import_leaves_store_untouched() {
        let path = std::env::temp_dir()
            .join(format!("salon-board-rejected-{}.json", std::process::id()));
        let tuesday: DateKey = "2026-01-06".parse().unwrap();

        let mut replacement = DaySchedule::new();
        replacement.set_worker_name(row(1), "Mia");
        let mut workers = WorkerCatalog::new();
        workers.add_worker("Mia", vec!["P".into()]).unwrap();
        let snapshot = LegacySnapshot::from_state(
            &[(monday(), replacement.clone()), (tuesday, replacement)],
            &workers,
            &HighlightSet::from_names(vec!["Mia".to_string()]),
            Some("P"),
            Some(tuesday),
        );
        write_snapshot(&path, &snapshot).unwrap();

        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        let before = session.schedule().clone();

        // 最後に書く currentDate で失敗させる
        for sql in [
            "CREATE TRIGGER reject_date_insert BEFORE INSERT ON kv_store
             WHEN NEW.key = 'currentDate' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            "CREATE TRIGGER reject_date_update BEFORE UPDATE ON kv_store
             WHEN NEW.key = 'currentDate' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }

        let err = session.import_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, BoardError::Database(_)));
        assert_eq!(session.schedule(), &before);
        assert_eq!(session.date(), monday());

        let repo = AppServices::new(pool.clone());
        assert_eq!(repo.schedule.list_dates().await.unwrap(), vec![monday()]);
        assert_eq!(repo.schedule.load(monday()).await.unwrap(), before);
        assert_eq!(repo.state.load_workers().await.unwrap(), WorkerCatalog::default_roster());
        assert!(repo.state.load_highlights().await.unwrap().is_empty());
        assert_eq!(repo.state.load_selected_service().await.unwrap(), None);
        assert_eq!(repo.state.load_current_date().await.unwrap(), Some(monday()));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_import_missing_file_changes_nothing() {
        let pool = setup_test_db().await;
        let mut session = signed_in_session(&pool).await;
        let before = session.schedule().clone();

        let missing = std::env::temp_dir().join("salon-board-does-not-exist.json");
        let err = session.import_snapshot(&missing).await.unwrap_err();
        assert!(matches!(err, BoardError::Io(_)));
        assert_eq!(session.schedule(), &before);
        assert_eq!(session.date(), monday());
    }
}
