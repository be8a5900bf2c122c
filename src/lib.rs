pub mod api;
pub mod audit;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod correlate;
pub mod model;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod store;
pub mod submit;
