pub mod app;
pub mod consumer;
pub mod core;
pub mod document;
pub mod queue;
pub mod sanitize;
