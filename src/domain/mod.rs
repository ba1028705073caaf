pub mod date_key;
pub mod rotation;
pub mod schedule_model;
pub mod selection;
pub mod service_model;
pub mod worker_model;
