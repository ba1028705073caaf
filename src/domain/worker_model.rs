// =====================
// スタッフ (Worker) 定義
// =====================

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::service_model::{normalize_code, ServiceCode};
use crate::error::{BoardError, Result};

/// スタッフ名 -> 施術可能なコード (入力順)
/// 名前がそのまま一意キーになる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerCatalog(BTreeMap<String, Vec<ServiceCode>>);

impl WorkerCatalog {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 保存データが無いときに使う初期メンバー
    pub fn default_roster() -> Self {
        let mut catalog = Self::new();
        for (name, skills) in DEFAULT_ROSTER {
            catalog.0.insert(
                name.to_string(),
                skills.iter().map(|s| s.to_string()).collect(),
            );
        }
        catalog
    }

    pub fn skills_of(&self, name: &str) -> Option<&[ServiceCode]> {
        self.0.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn can_perform(&self, name: &str, code: &str) -> bool {
        self.skills_of(name)
            .map(|skills| skills.iter().any(|s| s == code))
            .unwrap_or(false)
    }

    /// 名前順に (名前, スキル) を返す
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ServiceCode>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // --- 管理操作 ---

    pub fn add_worker(&mut self, name: &str, skills: Vec<ServiceCode>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::EmptyWorkerName);
        }
        if self.0.contains_key(name) {
            return Err(BoardError::WorkerExists(name.to_string()));
        }
        self.0.insert(name.to_string(), dedup_codes(skills));
        Ok(())
    }

    /// スキルはそのまま引き継ぐ
    pub fn rename_worker(&mut self, old: &str, new: &str) -> Result<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(BoardError::EmptyWorkerName);
        }
        if old == new {
            return Ok(());
        }
        if self.0.contains_key(new) {
            return Err(BoardError::WorkerExists(new.to_string()));
        }
        let skills = self
            .0
            .remove(old)
            .ok_or_else(|| BoardError::WorkerNotFound(old.to_string()))?;
        self.0.insert(new.to_string(), skills);
        Ok(())
    }

    pub fn set_skills(&mut self, name: &str, skills: Vec<ServiceCode>) -> Result<()> {
        let entry = self
            .0
            .get_mut(name)
            .ok_or_else(|| BoardError::WorkerNotFound(name.to_string()))?;
        *entry = dedup_codes(skills);
        Ok(())
    }

    pub fn remove_worker(&mut self, name: &str) -> Result<Vec<ServiceCode>> {
        self.0
            .remove(name)
            .ok_or_else(|| BoardError::WorkerNotFound(name.to_string()))
    }

    /// 大文字小文字を無視して完全一致する登録名があれば
    /// その表記に揃える
    /// 無ければ入力 (trim済み) をそのまま返す
    pub fn resolve_name(&self, input: &str) -> String {
        let input = input.trim();
        let lowered = input.to_lowercase();
        self.0
            .keys()
            .find(|name| name.to_lowercase() == lowered)
            .cloned()
            .unwrap_or_else(|| input.to_string())
    }

    /// 名前入力の候補
    /// 他の行で既に使われている名前は除く
    /// 前方一致 (大文字小文字無視) で名前順に返す
    pub fn suggest(&self, prefix: &str, assigned_elsewhere: &HashSet<&str>) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        self.0
            .keys()
            .filter(|name| !assigned_elsewhere.contains(name.as_str()))
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl Default for WorkerCatalog {
    fn default() -> Self {
        Self::default_roster()
    }
}

/// "p, m ,, pg" -> ["P", "M", "PG"]
pub fn parse_skills(text: &str) -> Vec<ServiceCode> {
    dedup_codes(
        text.split(',')
            .map(normalize_code)
            .filter(|code| !code.is_empty())
            .collect(),
    )
}

fn dedup_codes(codes: Vec<ServiceCode>) -> Vec<ServiceCode> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

const DEFAULT_ROSTER: [(&str, &[&str]); 18] = [
    ("Amanda", &["X", "P", "M", "G", "PG"]),
    ("Ana", &["X", "P", "M"]),
    ("Annie", &["X", "P"]),
    ("Heidi", &["X", "P", "M", "G", "PG"]),
    ("Helen", &["X", "P", "M"]),
    ("Jasmine", &["X", "P", "M", "G", "D", "PG"]),
    ("Kathy", &["X", "P"]),
    ("Lan", &["X", "P", "PG", "M"]),
    ("Lucy", &["X", "P", "M", "G", "PG"]),
    ("Mimi", &["X", "P", "M", "G", "PG"]),
    ("Sally", &["X", "P", "M", "G", "PG"]),
    ("May", &["X", "P", "M", "G", "D", "F", "FS", "PG"]),
    ("Joy", &["X", "M", "G", "D", "F", "FS"]),
    ("Kathlyn", &["X", "M", "G", "D", "F", "FS"]),
    ("Lily", &["X", "M", "G", "D", "F", "FS", "P", "PG"]),
    ("Angela", &["X", "M", "G", "D", "F", "FS"]),
    ("Natalie", &["X", "M", "G", "D", "F", "FS"]),
    ("Lynn", &["X", "M", "G", "P", "PG"]),
];
