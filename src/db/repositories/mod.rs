pub mod exercise_repository;
pub mod personal_record_repository;
pub mod set_repository;
pub mod settings_repository;
