use std::path::PathBuf;

/// ボード全体の設定
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// SQLite のファイル。無ければ作成する
    pub db_path: PathBuf,
    pub max_connections: u32,
    /// 施術コード入力時にスタッフのスキルを確認するか
    pub validate_skills: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("salon-board.db"),
            max_connections: 5,
            validate_skills: true,
        }
    }
}
