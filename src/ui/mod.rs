pub mod app;
pub mod controls;
