// Database-backed operations behind the HTTP handlers

pub mod detail_service;
pub mod equipment_service;
pub mod import_service;
pub mod ranking_service;
pub mod settings_service;
pub mod summary_service;
pub mod workout_service;

pub use detail_service::DetailService;
pub use equipment_service::EquipmentService;
pub use import_service::ImportService;
pub use ranking_service::RankingService;
pub use settings_service::SettingsService;
pub use summary_service::SummaryService;
pub use workout_service::WorkoutService;
