pub mod client;
pub mod i18n;
