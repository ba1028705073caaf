// =====================
// 1日分のボード (DaySchedule) 定義
// =====================

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::service_model::{normalize_code, ServiceCatalog, ServiceCode, Weight};
use crate::domain::worker_model::WorkerCatalog;
use crate::error::{BoardError, Result};

/// ボードの行数 (固定)
pub const ROW_COUNT: usize = 30;
/// 1行あたりの施術セル数 (固定)
pub const SLOT_COUNT: usize = 15;

/// 行番号 1..=30
/// 行の位置はローテーションの同点決着に使うので並べ替えない
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowSlot(u8);

impl RowSlot {
    pub fn new(number: u32) -> Result<Self> {
        if (1..=ROW_COUNT as u32).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(BoardError::InvalidRow(number))
        }
    }

    pub fn number(self) -> u32 {
        self.0 as u32
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = RowSlot> {
        (1..=ROW_COUNT as u8).map(RowSlot)
    }
}

impl fmt::Display for RowSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 施術セルの列番号 1..=15
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnIndex(u8);

impl ColumnIndex {
    pub fn new(number: u32) -> Result<Self> {
        if (1..=SLOT_COUNT as u32).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(BoardError::InvalidColumn(number))
        }
    }

    pub fn number(self) -> u32 {
        self.0 as u32
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = ColumnIndex> {
        (1..=SLOT_COUNT as u8).map(ColumnIndex)
    }
}

/// 編集されたセルの部位
/// - Top / Bottom: 半分セルの上段 / 下段
/// - Full: 1単位表示のセル
/// - Unified: まだ分割されていない空セル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
    Full,
    Unified,
}

impl FromStr for Placement {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Placement::Top),
            "bottom" => Ok(Placement::Bottom),
            "full" => Ok(Placement::Full),
            "unified" => Ok(Placement::Unified),
            other => Err(BoardError::InvalidPlacement(other.to_string())),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Placement::Top => "top",
            Placement::Bottom => "bottom",
            Placement::Full => "full",
            Placement::Unified => "unified",
        };
        f.write_str(s)
    }
}

/// 1つの施術セル
/// Full と Half は排他 (Full のときに上下段の値を持つことはない)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceSlot {
    #[default]
    Empty,
    Full(ServiceCode),
    Half {
        top: Option<ServiceCode>,
        bottom: Option<ServiceCode>,
    },
}

impl ServiceSlot {
    /// 保存形式の (top, bottom, full) から組み立てる。空文字は未設定扱い
    /// full が入っていれば上下段は捨てる
    pub fn from_parts(top: &str, bottom: &str, full: &str) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        if let Some(code) = non_empty(full) {
            return ServiceSlot::Full(code);
        }
        ServiceSlot::Half {
            top: non_empty(top),
            bottom: non_empty(bottom),
        }
        .normalized()
    }

    /// (top, bottom, full) の順で保存形式に戻す
    pub fn to_parts(&self) -> (&str, &str, &str) {
        match self {
            ServiceSlot::Empty => ("", "", ""),
            ServiceSlot::Full(code) => ("", "", code.as_str()),
            ServiceSlot::Half { top, bottom } => (
                top.as_deref().unwrap_or(""),
                bottom.as_deref().unwrap_or(""),
                "",
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ServiceSlot::Empty)
    }

    fn normalized(self) -> Self {
        match self {
            ServiceSlot::Half {
                top: None,
                bottom: None,
            } => ServiceSlot::Empty,
            other => other,
        }
    }

    /// 空入力: 指定部位だけを消す。Unified の場合は全部消す
    pub fn clear(&mut self, placement: Placement) {
        let current = std::mem::take(self);
        *self = match (placement, current) {
            (Placement::Unified, _) => ServiceSlot::Empty,
            (Placement::Full, ServiceSlot::Full(_)) => ServiceSlot::Empty,
            (Placement::Top, ServiceSlot::Half { bottom, .. }) => {
                ServiceSlot::Half { top: None, bottom }.normalized()
            }
            (Placement::Bottom, ServiceSlot::Half { top, .. }) => {
                ServiceSlot::Half { top, bottom: None }.normalized()
            }
            (_, other) => other,
        };
    }

    /// 重みに応じてコードを書き込む
    /// Full なら上下段を消して full に入れる
    /// Half なら full を消して指定段に入れる (反対側の段は残す)
    pub fn assign(&mut self, code: ServiceCode, weight: Weight, placement: Placement) {
        let current = std::mem::take(self);
        *self = match weight {
            Weight::Full => ServiceSlot::Full(code),
            Weight::Half => {
                let (top, bottom) = match current {
                    ServiceSlot::Half { top, bottom } => (top, bottom),
                    _ => (None, None),
                };
                match placement {
                    Placement::Top => ServiceSlot::Half {
                        top: Some(code),
                        bottom,
                    },
                    Placement::Bottom => ServiceSlot::Half {
                        top,
                        bottom: Some(code),
                    },
                    Placement::Unified | Placement::Full => ServiceSlot::Half {
                        top: Some(code),
                        bottom: None,
                    },
                }
            }
        };
    }

    /// 半単位での重み合計。メニューに無いコードは 0
    pub fn half_units(&self, services: &ServiceCatalog) -> u32 {
        // セルの形で重みが決まる (Full セル = 1.0, 上下段 = 0.5 ずつ)
        let known = |code: &String| services.lookup(code).is_some();
        match self {
            ServiceSlot::Empty => 0,
            ServiceSlot::Full(code) if known(code) => Weight::Full.half_units(),
            ServiceSlot::Full(_) => 0,
            ServiceSlot::Half { top, bottom } => [top, bottom]
                .into_iter()
                .flatten()
                .filter(|code| known(*code))
                .map(|_| Weight::Half.half_units())
                .sum(),
        }
    }

    /// 表示用 ("P", "M/G", "M/", "/F", "")
    pub fn display_text(&self) -> String {
        match self {
            ServiceSlot::Empty => String::new(),
            ServiceSlot::Full(code) => code.clone(),
            ServiceSlot::Half { top, bottom } => format!(
                "{}/{}",
                top.as_deref().unwrap_or(""),
                bottom.as_deref().unwrap_or("")
            ),
        }
    }
}

/// 1行分のデータ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub worker_name: String,
    pub time_in: String,
    pub slots: [ServiceSlot; SLOT_COUNT],
}

impl ScheduleEntry {
    pub fn is_blank(&self) -> bool {
        self.worker_name.is_empty()
            && self.time_in.is_empty()
            && self.slots.iter().all(ServiceSlot::is_empty)
    }

    pub fn slot(&self, column: ColumnIndex) -> &ServiceSlot {
        &self.slots[column.index()]
    }

    pub fn slot_mut(&mut self, column: ColumnIndex) -> &mut ServiceSlot {
        &mut self.slots[column.index()]
    }
}

/// 1日分のボード (30行固定)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    rows: [ScheduleEntry; ROW_COUNT],
}

impl DaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, row: RowSlot) -> &ScheduleEntry {
        &self.rows[row.index()]
    }

    pub fn entry_mut(&mut self, row: RowSlot) -> &mut ScheduleEntry {
        &mut self.rows[row.index()]
    }

    /// 行番号順に返す
    pub fn iter(&self) -> impl Iterator<Item = (RowSlot, &ScheduleEntry)> {
        RowSlot::all().zip(self.rows.iter())
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(ScheduleEntry::is_blank)
    }

    /// `row` 以外の行に入っているスタッフ名
    pub fn assigned_names_except(&self, row: RowSlot) -> HashSet<&str> {
        self.iter()
            .filter(|(slot, _)| *slot != row)
            .map(|(_, entry)| entry.worker_name.trim())
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn set_worker_name(&mut self, row: RowSlot, name: &str) {
        self.entry_mut(row).worker_name = name.trim().to_string();
    }

    pub fn set_time_in(&mut self, row: RowSlot, time_in: &str) {
        self.entry_mut(row).time_in = time_in.trim().to_string();
    }

    /// 施術コードの入力を反映する
    ///
    /// - 空入力は指定部位のみ消去 (検証なし)
    /// - メニューに無いコードは `UnknownService`
    /// - `skill_check` があり、その行のスタッフが登録済みでコードを施術できない場合は
    ///   `SkillMismatch`
    ///
    /// エラーのときはセルを一切変更しない
    pub fn apply_service_code(
        &mut self,
        row: RowSlot,
        column: ColumnIndex,
        placement: Placement,
        raw_code: &str,
        services: &ServiceCatalog,
        skill_check: Option<&WorkerCatalog>,
    ) -> Result<()> {
        let code = normalize_code(raw_code);
        let entry = self.entry_mut(row);

        if code.is_empty() {
            entry.slot_mut(column).clear(placement);
            return Ok(());
        }

        let weight = services
            .weight_of(&code)
            .ok_or_else(|| BoardError::UnknownService(code.clone()))?;

        if let Some(workers) = skill_check {
            let worker = entry.worker_name.trim();
            if let Some(skills) = workers.skills_of(worker) {
                if !skills.iter().any(|s| *s == code) {
                    return Err(BoardError::SkillMismatch {
                        worker: worker.to_string(),
                        code,
                        valid: skills.to_vec(),
                    });
                }
            }
        }

        entry.slot_mut(column).assign(code, weight, placement);
        Ok(())
    }
}
