pub mod legacy_json;
pub mod schedule_repo;
pub mod state_repo;
