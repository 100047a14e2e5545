pub mod health_checker;
pub mod http_client;
pub mod http_handler;
pub mod tcp_probe;

/// Re-export commonly used types from adapters
pub use health_checker::HealthChecker;
pub use http_client::HttpClientAdapter;
pub use http_handler::build_router;
pub use tcp_probe::TcpProbeAdapter;
