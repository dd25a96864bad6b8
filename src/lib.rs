pub mod agenda;
pub mod api_router;
pub mod checklist;
pub mod config;
pub mod core;
pub mod mapping;
pub mod milestones;
pub mod notify;
pub mod progress;
pub mod results;
pub mod scope;
pub mod shared;
pub mod store;
pub mod tasks;
pub mod users;
