pub mod backend;
pub mod balancer;
pub mod gateway;
pub mod proxy;
pub mod registry;

pub use balancer::{Balancer, BalancerError};
pub use gateway::{Gateway, GatewayError};
pub use registry::{Registry, Service};
