// =====================
// 施術メニュー (Service) 定義
// =====================

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

pub type ServiceCode = String;

/// 1セルあたりの重み
/// 30分 → Half (0.5), 60分 → Full (1.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weight {
    Half,
    Full,
}

impl Weight {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            30 => Some(Weight::Half),
            60 => Some(Weight::Full),
            _ => None,
        }
    }

    /// 半単位 (0.5 = 1) での重み。並び替えを整数比較で行うために使う
    pub fn half_units(self) -> u32 {
        match self {
            Weight::Half => 1,
            Weight::Full => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weight::Half => "1/2",
            Weight::Full => "1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub code: ServiceCode,
    pub name: String,
    pub weight: Weight,
}

/// 施術メニューの一覧 (起動時に一度だけ作る。実行中は変更しない)
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    /// (code, name, minutes) のリストから作成する
    pub fn from_durations(entries: &[(&str, &str, u32)]) -> Result<Self> {
        let mut services = Vec::with_capacity(entries.len());
        for (code, name, minutes) in entries {
            let weight = Weight::from_minutes(*minutes).ok_or_else(|| {
                BoardError::UnsupportedDuration {
                    code: code.to_string(),
                    minutes: *minutes,
                }
            })?;
            services.push(Service {
                code: normalize_code(code),
                name: name.to_string(),
                weight,
            });
        }
        Ok(Self { services })
    }

    /// 店舗で使っている標準メニュー
    pub fn standard() -> Result<Self> {
        Self::from_durations(&STANDARD_MENU)
    }

    pub fn lookup(&self, code: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.code == code)
    }

    pub fn weight_of(&self, code: &str) -> Option<Weight> {
        self.lookup(code).map(|s| s.weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// (code, name, minutes)
const STANDARD_MENU: [(&str, &str, u32); 12] = [
    ("P", "Pedicure", 60),
    ("M", "Manicure", 30),
    ("G", "Gel Manicure", 60),
    ("GX", "GelX", 60),
    ("PG", "Pedicure Gel", 60),
    ("F", "Fill", 30),
    ("D", "Dip", 60),
    ("DM", "Deluxe Manicure", 30),
    ("LM", "Luxury Manicure", 60),
    ("JM", "Jelly Manicure", 60),
    ("FS", "Full Set", 30),
    ("X", "Skip Turn", 60),
];

/// 入力されたコードを正規化する
/// 前後の空白とゼロ幅スペースを除いて大文字にする
pub fn normalize_code(raw: &str) -> ServiceCode {
    raw.replace('\u{200B}', "").trim().to_uppercase()
}
