use serde::Serialize;

use crate::domain::date_key::DateKey;
use crate::domain::rotation::weighted_load;
use crate::domain::schedule_model::DaySchedule;
use crate::domain::selection::SelectionState;
use crate::domain::service_model::ServiceCatalog;
use crate::domain::worker_model::WorkerCatalog;

/// メニュー1件 (画面のボタン用)
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDto {
    pub code: String,
    pub name: String,
    pub weight: &'static str, // "1" / "1/2"
}

/// ボード1行分 (表示用)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub row: u32,
    pub worker_name: String,
    pub time_in: String,
    pub highlighted: bool,
    /// 登録済みスタッフなら施術可能なコード ("P, M, G")
    pub skills: Option<String>,
    pub load: f64,
    pub cells: Vec<String>, // 15列分の表示文字列
}

/// 描画側に渡す1画面分のデータ
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub date: DateKey,
    pub date_label: String,
    pub selected_service: Option<String>,
    pub highlights: Vec<String>,
    pub services: Vec<ServiceDto>,
    pub rows: Vec<RowView>,
}

impl BoardView {
    pub fn build(
        date: DateKey,
        schedule: &DaySchedule,
        workers: &WorkerCatalog,
        services: &ServiceCatalog,
        selection: &SelectionState,
    ) -> Self {
        let rows = schedule
            .iter()
            .map(|(row, entry)| {
                let name = entry.worker_name.trim();
                RowView {
                    row: row.number(),
                    worker_name: entry.worker_name.clone(),
                    time_in: entry.time_in.clone(),
                    highlighted: !name.is_empty() && selection.is_highlighted(name),
                    skills: workers.skills_of(name).map(|skills| skills.join(", ")),
                    load: if name.is_empty() {
                        0.0
                    } else {
                        weighted_load(schedule, name, services)
                    },
                    cells: entry.slots.iter().map(|slot| slot.display_text()).collect(),
                }
            })
            .collect();

        Self {
            date,
            date_label: date.display_label(),
            selected_service: selection.selected_service().map(str::to_string),
            highlights: selection.highlights().names().to_vec(),
            services: services
                .iter()
                .map(|s| ServiceDto {
                    code: s.code.clone(),
                    name: s.name.clone(),
                    weight: s.weight.label(),
                })
                .collect(),
            rows,
        }
    }

    /// 名前か時刻か施術が入っている行だけ
    pub fn occupied_rows(&self) -> impl Iterator<Item = &RowView> {
        self.rows.iter().filter(|row| {
            !row.worker_name.is_empty()
                || !row.time_in.is_empty()
                || row.cells.iter().any(|cell| !cell.is_empty())
        })
    }
}
