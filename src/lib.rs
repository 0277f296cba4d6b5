// Library exports for the binary and integration tests
pub mod account_selector;
pub mod affirmation;
pub mod aggregator;
pub mod config;
pub mod counter;
pub mod dashboard;
pub mod event;
pub mod journal;
pub mod logging;
pub mod profile;
pub mod renderer;
pub mod reset;
pub mod stats;
pub mod status;
pub mod store;
pub mod timefmt;
pub mod zone;
