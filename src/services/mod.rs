pub mod club_progress;
pub mod exercise_service;
pub mod history_service;
pub mod improvement;
pub mod one_rep_max;
pub mod pr_aggregator;
pub mod pr_service;
pub mod set_service;
pub mod settings_service;
