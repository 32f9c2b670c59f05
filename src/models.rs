pub mod activity;
pub mod expense;
pub mod landing;
pub mod lead;
pub mod reports;
pub mod settings;
