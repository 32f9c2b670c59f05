pub mod activities;
pub mod expenses;
pub mod landings;
pub mod leads;
pub mod public;
pub mod reports;
pub mod settings;
