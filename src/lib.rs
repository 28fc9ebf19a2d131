// Operator console for LOTUSim: vessel spawn parameters and live vessel telemetry
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
