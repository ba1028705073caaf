// =====================
// ハイライト / メニュー選択の状態
// =====================

use serde::{Deserialize, Serialize};

use crate::domain::rotation::{eligible_workers, pick_least_loaded, pick_next_after_current};
use crate::domain::schedule_model::DaySchedule;
use crate::domain::service_model::{normalize_code, ServiceCatalog, ServiceCode};
use crate::domain::worker_model::WorkerCatalog;

/// 「次の番」として強調表示されているスタッフ名の集合
/// 追加順を保持する (ローテーションは先頭だけを見る)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightSet(Vec<String>);

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        let mut set = Self::new();
        for name in names {
            set.insert(&name);
        }
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|n| n != name);
        before != self.0.len()
    }

    /// 中身を `name` だけ (None なら空) にする
    pub fn replace_with(&mut self, name: Option<&str>) {
        self.0.clear();
        if let Some(name) = name {
            self.insert(name);
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// メニュー未選択 (ハイライトは空か、手動のもの)
    Idle,
    /// ローテーションがハイライトを決めている
    ServiceSelected(ServiceCode),
    /// 名前を直接クリックしてハイライトを切り替えた
    ManualToggle,
}

/// ハイライトとメニュー選択をまとめた状態機械
///
/// 日付を切り替えても保持される (日付ごとの値ではない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    mode: SelectionMode,
    selected_service: Option<ServiceCode>,
    highlights: HighlightSet,
}

/// ローテーション計算に必要な読み取り専用データ
pub struct RotationInput<'a> {
    pub schedule: &'a DaySchedule,
    pub workers: &'a WorkerCatalog,
    pub services: &'a ServiceCatalog,
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            mode: SelectionMode::Idle,
            selected_service: None,
            highlights: HighlightSet::new(),
        }
    }

    /// 保存済みの値から復元する
    ///
    /// 手動切り替え中 / 未選択ならハイライトをそのまま使う
    /// メニュー選択中は保存されたハイライトの先頭がまだ対象者なら引き継ぐ
    /// 空か対象外になっていればローテーションで選び直す
    /// `mode` が無い古いデータはメニュー選択とハイライトから判断する
    pub fn restore(
        mode: Option<SelectionMode>,
        selected_service: Option<ServiceCode>,
        highlights: HighlightSet,
        input: &RotationInput<'_>,
    ) -> Self {
        let selected_service = selected_service
            .map(|code| normalize_code(&code))
            .filter(|code| !code.is_empty());

        match (mode, selected_service) {
            (Some(SelectionMode::ManualToggle), selected_service) => Self {
                mode: SelectionMode::ManualToggle,
                selected_service,
                highlights,
            },
            (Some(SelectionMode::Idle), _) => Self {
                mode: SelectionMode::Idle,
                selected_service: None,
                highlights,
            },
            (_, Some(code)) => {
                let mut state = Self::new();
                if is_current_turn(&code, &highlights, input) {
                    state.highlights = highlights;
                    state.selected_service = Some(code.clone());
                    state.mode = SelectionMode::ServiceSelected(code);
                } else {
                    state.select_service(&code, input);
                }
                state
            }
            (_, None) => Self {
                mode: if highlights.is_empty() {
                    SelectionMode::Idle
                } else {
                    SelectionMode::ManualToggle
                },
                selected_service: None,
                highlights,
            },
        }
    }

    pub fn mode(&self) -> &SelectionMode {
        &self.mode
    }

    pub fn selected_service(&self) -> Option<&str> {
        self.selected_service.as_deref()
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn is_highlighted(&self, name: &str) -> bool {
        self.highlights.contains(name)
    }

    /// メニューを選ぶ → 施術量が一番少ないスタッフ1人をハイライト
    /// 空のコードは選択解除
    pub fn select_service(&mut self, raw_code: &str, input: &RotationInput<'_>) -> Option<String> {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            self.selected_service = None;
            self.highlights.replace_with(None);
            self.mode = SelectionMode::Idle;
            return None;
        }

        let eligible = eligible_workers(input.schedule, &code, input.workers, input.services);
        let picked = pick_least_loaded(&eligible).map(str::to_string);
        tracing::debug!(
            service = %code,
            candidates = eligible.len(),
            picked = ?picked,
            "Rotation decided"
        );

        self.highlights.replace_with(picked.as_deref());
        self.selected_service = Some(code.clone());
        self.mode = SelectionMode::ServiceSelected(code);
        picked
    }

    /// 「次の人」ボタン
    /// メニュー選択中でなければ何もしない
    /// 対象者がいなければハイライトは変えない
    pub fn advance(&mut self, input: &RotationInput<'_>) -> Option<String> {
        let code = match &self.mode {
            SelectionMode::ServiceSelected(code) => code.clone(),
            _ => return None,
        };

        let eligible = eligible_workers(input.schedule, &code, input.workers, input.services);
        let next = pick_next_after_current(&eligible, self.highlights.first()).map(str::to_string);
        tracing::debug!(
            service = %code,
            current = ?self.highlights.first(),
            next = ?next,
            "Rotation advanced"
        );

        if let Some(name) = &next {
            self.highlights.replace_with(Some(name.as_str()));
        }
        next
    }

    /// 名前の手動クリック: ハイライトの付け外し
    /// メニューの選択値は残すが
    /// 再選択されるまでハイライトには使わない
    pub fn toggle_manual(&mut self, name: &str) -> bool {
        let name = name.trim();
        let now_highlighted = if self.highlights.contains(name) {
            self.highlights.remove(name);
            false
        } else {
            self.highlights.insert(name)
        };
        self.mode = SelectionMode::ManualToggle;
        now_highlighted
    }

    /// 施術コードが記録されたときの遷移
    /// ハイライトされていたスタッフは外す
    /// メニュー選択はリセットする
    pub fn record_service_for(&mut self, worker_name: &str) {
        let worker_name = worker_name.trim();
        if !worker_name.is_empty() {
            self.highlights.remove(worker_name);
        }
        self.selected_service = None;
        self.mode = SelectionMode::Idle;
    }
}

/// ハイライトの先頭が `code` の対象者に入っているか
fn is_current_turn(code: &str, highlights: &HighlightSet, input: &RotationInput<'_>) -> bool {
    let Some(current) = highlights.first() else {
        return false;
    };
    eligible_workers(input.schedule, code, input.workers, input.services)
        .iter()
        .any(|w| w.name == current)
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}
