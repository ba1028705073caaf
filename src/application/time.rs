use chrono::{Local, NaiveTime, Timelike};

use crate::domain::date_key::DateKey;
use crate::error::{BoardError, Result};

/// 出勤時刻の入力を "HH:MM" にそろえる
/// 空文字はクリア扱いでそのまま返す。"9:05" も受け付ける
pub fn parse_time_in(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(String::new());
    }
    NaiveTime::parse_from_str(input, "%H:%M")
        .map(format_time_in)
        .map_err(|_| BoardError::InvalidTime(input.to_string()))
}

pub fn format_time_in(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// 現在時刻 (ローカル)
pub fn now_local() -> NaiveTime {
    Local::now().time()
}

/// 今日の日付 (ローカル)
pub fn today_local() -> DateKey {
    DateKey::new(Local::now().date_naive())
}

#[cfg(test)]
mod time_tests {
    use super::*;

    #[test]
    fn test_parse_time_in() {
        assert_eq!(parse_time_in("09:30").unwrap(), "09:30");
        assert_eq!(parse_time_in(" 9:05 ").unwrap(), "09:05");
        assert_eq!(parse_time_in("").unwrap(), "");
        assert!(matches!(parse_time_in("25:00"), Err(BoardError::InvalidTime(_))));
        assert!(matches!(parse_time_in("noon"), Err(BoardError::InvalidTime(_))));
    }

    #[test]
    fn test_format_drops_seconds() {
        let time = NaiveTime::from_hms_opt(14, 7, 59).unwrap();
        assert_eq!(format_time_in(time), "14:07");
    }
}
