pub mod api;
pub mod document;
pub mod health;
pub mod job;
pub mod report;
