// =====================
// 順番決め (ローテーション) ロジック
// =====================
//
// すべて純粋関数。スケジュールは読むだけ
// 結果の保存は呼び出し側が行う

use std::collections::HashMap;

use crate::domain::schedule_model::{DaySchedule, RowSlot};
use crate::domain::service_model::ServiceCatalog;
use crate::domain::worker_model::WorkerCatalog;

/// 指定メニューを担当できるスタッフ1人分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleWorker {
    pub name: String,
    /// ボード上で最初に現れた行 (同点時はこちらが小さい方が先)
    pub first_row: RowSlot,
    /// 今日の施術量 (0.5 = 1)
    pub load_half_units: u32,
}

impl EligibleWorker {
    pub fn load(&self) -> f64 {
        self.load_half_units as f64 / 2.0
    }
}

fn load_half_units(schedule: &DaySchedule, worker_name: &str, services: &ServiceCatalog) -> u32 {
    schedule
        .iter()
        .filter(|(_, entry)| entry.worker_name.trim() == worker_name)
        .flat_map(|(_, entry)| entry.slots.iter())
        .map(|slot| slot.half_units(services))
        .sum()
}

/// スタッフの今日の施術量
///
/// 同じ名前が複数行にある場合はすべて合算する
/// Full セルは 1.0、上下段はそれぞれ 0.5。メニューに無いコードは 0
pub fn weighted_load(schedule: &DaySchedule, worker_name: &str, services: &ServiceCatalog) -> f64 {
    load_half_units(schedule, worker_name, services) as f64 / 2.0
}

/// 指定メニューを担当できるスタッフを並び順つきで返す
///
/// - 1行目から順に見て、初めて出てきた行をそのスタッフの順位にする
/// - スキル一覧に `service_code` を含むスタッフだけ残す
///   (未登録のスタッフは対象外)
/// - 返り値は (施術量 昇順, 最初の行 昇順) で並べ替え済み
pub fn eligible_workers(
    schedule: &DaySchedule,
    service_code: &str,
    workers: &WorkerCatalog,
    services: &ServiceCatalog,
) -> Vec<EligibleWorker> {
    let mut first_seen: Vec<(&str, RowSlot)> = Vec::new();
    let mut totals: HashMap<&str, u32> = HashMap::new();

    for (row, entry) in schedule.iter() {
        let name = entry.worker_name.trim();
        if name.is_empty() {
            continue;
        }
        let units: u32 = entry.slots.iter().map(|slot| slot.half_units(services)).sum();
        match totals.get_mut(name) {
            Some(total) => *total += units,
            None => {
                totals.insert(name, units);
                first_seen.push((name, row));
            }
        }
    }

    let mut eligible: Vec<EligibleWorker> = first_seen
        .into_iter()
        .filter(|(name, _)| workers.can_perform(name, service_code))
        .map(|(name, first_row)| EligibleWorker {
            name: name.to_string(),
            first_row,
            load_half_units: totals.get(name).copied().unwrap_or(0),
        })
        .collect();

    // 安定ソート
    eligible.sort_by_key(|w| (w.load_half_units, w.first_row));
    eligible
}

/// 施術量が一番少ないスタッフ (同点なら上の行)
/// 対象者がいなければ None。エラーではない
pub fn pick_least_loaded(eligible: &[EligibleWorker]) -> Option<&str> {
    eligible.first().map(|w| w.name.as_str())
}

/// 今ハイライトされているスタッフの次の人
///
/// `current` が最後の人、または一覧に居ない場合は先頭に戻る
pub fn pick_next_after_current<'a>(
    eligible: &'a [EligibleWorker],
    current: Option<&str>,
) -> Option<&'a str> {
    let position = current.and_then(|c| eligible.iter().position(|w| w.name == c));
    let next = match position {
        Some(i) if i + 1 < eligible.len() => i + 1,
        _ => 0,
    };
    eligible.get(next).map(|w| w.name.as_str())
}
