use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BoardError, Result};

/// ボードの保存キーになる日付 (YYYY-MM-DD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| BoardError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// 前日。NaiveDate の範囲外になることは実運用上ないのでそのまま返す
    pub fn previous_day(self) -> Self {
        Self(self.0.checked_sub_signed(Duration::days(1)).unwrap_or(self.0))
    }

    pub fn next_day(self) -> Self {
        Self(self.0.checked_add_signed(Duration::days(1)).unwrap_or(self.0))
    }

    /// 画面表示用のラベル (例: "MON 1/5/2026")
    pub fn display_label(self) -> String {
        const DAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
        let day_name = DAYS[self.0.weekday().num_days_from_sunday() as usize];
        format!(
            "{} {}/{}/{}",
            day_name,
            self.0.month(),
            self.0.day(),
            self.0.year()
        )
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BoardError::InvalidDate(s.to_string()))
    }
}

// 保存形式では文字列キーとして扱う
impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
