// =====================
// ブラウザ版 (localStorage) と同じ形の JSON スナップショット
// =====================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::date_key::DateKey;
use crate::domain::schedule_model::{ColumnIndex, DaySchedule, RowSlot, ServiceSlot, SLOT_COUNT};
use crate::domain::selection::HighlightSet;
use crate::domain::service_model::{normalize_code, ServiceCode};
use crate::domain::worker_model::WorkerCatalog;
use crate::error::Result;

/// スナップショット全体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySnapshot {
    #[serde(default)]
    pub all_schedules: BTreeMap<String, BTreeMap<String, LegacyRow>>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub selected_service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<WorkerCatalog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_date: Option<String>,
}

/// "row<N>" の中身
/// セルは "service<i>_top" / "service<i>_bottom" / "service<i>_full" の平らなキーで持つ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyRow {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "timeIn")]
    pub time_in: String,
    #[serde(flatten)]
    pub cells: BTreeMap<String, serde_json::Value>,
}

/// スナップショットを読み解いた結果
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedState {
    pub days: Vec<(DateKey, DaySchedule)>,
    pub workers: Option<WorkerCatalog>,
    pub highlights: HighlightSet,
    pub selected_service: Option<ServiceCode>,
    pub current_date: Option<DateKey>,
}

#[derive(Clone, Copy)]
enum CellPart {
    Top,
    Bottom,
    Full,
}

/// "service3_top" -> (列3, Top)
fn parse_cell_key(key: &str) -> Option<(ColumnIndex, CellPart)> {
    let rest = key.strip_prefix("service")?;
    let (number, part) = rest.split_once('_')?;
    let part = match part {
        "top" => CellPart::Top,
        "bottom" => CellPart::Bottom,
        "full" => CellPart::Full,
        _ => return None,
    };
    let column = ColumnIndex::new(number.parse().ok()?).ok()?;
    Some((column, part))
}

fn parse_row_key(key: &str) -> Option<RowSlot> {
    let number = key.strip_prefix("row")?.parse().ok()?;
    RowSlot::new(number).ok()
}

fn as_code(value: &serde_json::Value) -> String {
    value.as_str().map(normalize_code).unwrap_or_default()
}

// =====================
// JSON -> ドメイン
// =====================

pub fn day_from_rows(date: &str, rows: &BTreeMap<String, LegacyRow>) -> DaySchedule {
    let mut schedule = DaySchedule::new();

    for (row_key, record) in rows {
        let Some(row) = parse_row_key(row_key) else {
            tracing::warn!(date = date, key = %row_key, "Skipping unknown row key");
            continue;
        };

        let entry = schedule.entry_mut(row);
        entry.worker_name = record.name.trim().to_string();
        entry.time_in = record.time_in.trim().to_string();

        let mut parts: [[String; 3]; SLOT_COUNT] = Default::default();
        for (cell_key, value) in &record.cells {
            let Some((column, part)) = parse_cell_key(cell_key) else {
                tracing::warn!(
                    date = date,
                    row = %row,
                    key = %cell_key,
                    "Skipping unknown cell key"
                );
                continue;
            };
            parts[column.number() as usize - 1][part as usize] = as_code(value);
        }

        for (column, [top, bottom, full]) in ColumnIndex::all().zip(parts.iter()) {
            *entry.slot_mut(column) = ServiceSlot::from_parts(top, bottom, full);
        }
    }

    schedule
}

// =====================
// ドメイン -> JSON
// =====================

/// 空の行は出力しない。セルは値のある列だけ3つのキーをまとめて出す
pub fn rows_from_day(schedule: &DaySchedule) -> BTreeMap<String, LegacyRow> {
    schedule
        .iter()
        .filter(|(_, entry)| !entry.is_blank())
        .map(|(row, entry)| {
            let mut cells = BTreeMap::new();
            for column in ColumnIndex::all() {
                let slot = entry.slot(column);
                if slot.is_empty() {
                    continue;
                }
                let (top, bottom, full) = slot.to_parts();
                let n = column.number();
                cells.insert(format!("service{n}_top"), top.into());
                cells.insert(format!("service{n}_bottom"), bottom.into());
                cells.insert(format!("service{n}_full"), full.into());
            }
            let record = LegacyRow {
                name: entry.worker_name.clone(),
                time_in: entry.time_in.clone(),
                cells,
            };
            (format!("row{}", row.number()), record)
        })
        .collect()
}

impl LegacySnapshot {
    pub fn from_state(
        days: &[(DateKey, DaySchedule)],
        workers: &WorkerCatalog,
        highlights: &HighlightSet,
        selected_service: Option<&str>,
        current_date: Option<DateKey>,
    ) -> Self {
        Self {
            all_schedules: days
                .iter()
                .map(|(date, schedule)| (date.to_string(), rows_from_day(schedule)))
                .collect(),
            highlights: highlights.names().to_vec(),
            selected_service: selected_service.unwrap_or("").to_string(),
            workers: Some(workers.clone()),
            current_date: current_date.map(|d| d.to_string()),
        }
    }

    /// 日付キーが読めない日は警告してスキップする
    pub fn into_state(self) -> ImportedState {
        let days = self
            .all_schedules
            .iter()
            .filter_map(|(key, rows)| match key.parse::<DateKey>() {
                Ok(date) => Some((date, day_from_rows(key, rows))),
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Skipping schedule with malformed date key"
                    );
                    None
                }
            })
            .collect();

        let current_date = self.current_date.as_deref().and_then(|raw| match raw.parse() {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!(value = raw, error = %e, "Ignoring malformed current date");
                None
            }
        });

        let selected = normalize_code(&self.selected_service);

        ImportedState {
            days,
            workers: self.workers,
            highlights: HighlightSet::from_names(self.highlights),
            selected_service: (!selected.is_empty()).then_some(selected),
            current_date,
        }
    }
}

pub fn read_snapshot(path: &Path) -> Result<LegacySnapshot> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_snapshot(path: &Path, snapshot: &LegacySnapshot) -> Result<()> {
    let raw = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod legacy_json_tests {
    use super::*;
    use crate::domain::schedule_model::Placement;
    use crate::domain::service_model::ServiceCatalog;

    const SAMPLE: &str = r#"{
        "allSchedules": {
            "2026-01-05": {
                "row1": { "name": "Amanda", "timeIn": "09:30",
                          "service1_top": "m", "service1_bottom": "", "service1_full": "",
                          "service2_top": "", "service2_bottom": "", "service2_full": "P" },
                "row2": { "name": "Ana", "timeIn": "", "service16_top": "M", "service1_side": "X" },
                "rowX": { "name": "Ghost" }
            },
            "not-a-date": { "row1": { "name": "Joy" } }
        },
        "highlights": ["Ana", "Ana"],
        "selectedService": "p",
        "workers": { "Amanda": ["X", "P", "M", "G", "PG"] },
        "currentDate": "2026-01-05"
    }"#;

    #[test]
    fn test_import_sample() {
        let snapshot: LegacySnapshot = serde_json::from_str(SAMPLE).unwrap();
        let state = snapshot.into_state();

        assert_eq!(state.days.len(), 1);
        let (date, day) = &state.days[0];
        assert_eq!(date.to_string(), "2026-01-05");

        let row1 = day.entry(RowSlot::new(1).unwrap());
        assert_eq!(row1.worker_name, "Amanda");
        assert_eq!(row1.time_in, "09:30");
        assert_eq!(
            row1.slot(ColumnIndex::new(1).unwrap()),
            &ServiceSlot::Half { top: Some("M".into()), bottom: None }
        );
        assert_eq!(row1.slot(ColumnIndex::new(2).unwrap()), &ServiceSlot::Full("P".into()));

        // 範囲外の列や知らないキーは無視
        let row2 = day.entry(RowSlot::new(2).unwrap());
        assert_eq!(row2.worker_name, "Ana");
        assert!(row2.slots.iter().all(ServiceSlot::is_empty));

        assert_eq!(state.highlights.names(), &["Ana".to_string()]);
        assert_eq!(state.selected_service.as_deref(), Some("P"));
        assert_eq!(state.current_date, Some(*date));
        assert!(state.workers.unwrap().can_perform("Amanda", "PG"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let snapshot: LegacySnapshot = serde_json::from_str("{}").unwrap();
        let state = snapshot.into_state();
        assert!(state.days.is_empty());
        assert!(state.workers.is_none());
        assert!(state.highlights.is_empty());
        assert_eq!(state.selected_service, None);
        assert_eq!(state.current_date, None);
    }

    #[test]
    fn test_export_then_import_keeps_populated_fields() {
        let services = ServiceCatalog::standard().unwrap();
        let workers = WorkerCatalog::default_roster();
        let date: DateKey = "2026-01-05".parse().unwrap();

        let mut day = DaySchedule::new();
        let r1 = RowSlot::new(1).unwrap();
        let r7 = RowSlot::new(7).unwrap();
        day.set_worker_name(r1, "Amanda");
        day.set_time_in(r1, "09:30");
        let c1 = ColumnIndex::new(1).unwrap();
        let c15 = ColumnIndex::new(15).unwrap();
        day.apply_service_code(r1, c1, Placement::Unified, "M", &services, None).unwrap();
        day.apply_service_code(r1, c1, Placement::Bottom, "F", &services, None).unwrap();
        day.apply_service_code(r1, c15, Placement::Unified, "P", &services, None).unwrap();
        day.set_worker_name(r7, "Joy");

        let highlights = HighlightSet::from_names(vec!["Ana".to_string()]);
        let days = [(date, day.clone())];
        let snapshot =
            LegacySnapshot::from_state(&days, &workers, &highlights, Some("P"), Some(date));

        let exported = serde_json::to_value(&snapshot).unwrap();
        let row1 = &exported["allSchedules"]["2026-01-05"]["row1"];
        assert_eq!(row1["timeIn"], "09:30");
        assert_eq!(row1["service1_top"], "M");
        assert_eq!(row1["service1_bottom"], "F");
        assert_eq!(row1["service15_full"], "P");
        assert!(row1.get("service2_top").is_none());
        assert!(exported["allSchedules"]["2026-01-05"].get("row2").is_none());

        let text = serde_json::to_string(&snapshot).unwrap();
        let state = serde_json::from_str::<LegacySnapshot>(&text).unwrap().into_state();
        assert_eq!(state.days, vec![(date, day)]);
        assert_eq!(state.workers, Some(workers));
        assert_eq!(state.highlights, highlights);
        assert_eq!(state.selected_service.as_deref(), Some("P"));
        assert_eq!(state.current_date, Some(date));
    }
}
