// Application layer - Use cases and ports
pub mod map_sync;
pub mod param_serializer;
pub mod simulation_api;
pub mod spawn_dispatcher;
pub mod telemetry_client;
