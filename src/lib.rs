// Library for tests to access modules

pub mod aggregator;
pub mod broadcast;
pub mod config;
pub mod facility_repo;
pub mod history;
pub mod housekeeping;
pub mod maintenance;
pub mod models;
pub mod poller;
pub mod prober;
pub mod roster;
pub mod routes;
pub mod snapshot_cache;
pub mod version;
