pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod landing_repo;
pub use landing_repo::LandingRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
