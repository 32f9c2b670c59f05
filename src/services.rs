pub mod commission;
pub mod settings_service;
pub mod lead_service;
pub mod pipeline_service;
pub mod activity_service;
pub mod ingestion_service;
pub mod bulk_service;
pub mod landing_service;
pub mod expense_service;
pub mod report_service;
