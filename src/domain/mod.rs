// Domain layer - Vessel, spawn configuration and map models
pub mod geo;
pub mod marker;
pub mod spawn_config;
pub mod vessel;
