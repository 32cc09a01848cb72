//! Transport and outbound scheduling.

mod connection;
mod keepalive;
mod proxy;
mod scheduler;
mod tls;
mod transport;

pub use connection::{Connection, Inbound};
pub use keepalive::{Keepalive, KeepaliveAction};
pub use proxy::ProxyConnector;
pub use scheduler::Scheduler;
pub use transport::{Endpoint, TransportStream};
