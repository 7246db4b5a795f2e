// Library for tests to access modules

pub mod catalog;
pub mod config;
pub mod hub;
pub mod identity;
pub mod models;
pub mod path;
pub mod pipeline;
pub mod routes;
pub mod sensor_types;
pub mod snapshot;
pub mod source;
pub mod state_repo;
pub mod update_gate;
pub mod worker;
