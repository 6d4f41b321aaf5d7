use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::tcp::OwnedWriteHalf;

use crate::connection::ConnectionConfig;
use crate::handler::Handler;
use crate::server::{Server, ServerError};

/// What [`Server::close`] does with connections that are still being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Stop accepting and return, in-flight connections keep running on their own
    #[default]
    Immediate,
    /// Stop accepting, then wait for every in-flight connection to finish
    Drain,
}

#[derive(Debug, Clone)]
pub struct ServerBuilder {
    address: Option<SocketAddr>,
    connection: ConnectionConfig,
    shutdown_policy: ShutdownPolicy,
}

impl ServerBuilder {
    pub(crate) fn new() -> Self {
        Self { address: None, connection: ConnectionConfig::default(), shutdown_policy: ShutdownPolicy::default() }
    }

    /// Listens on every interface at `port`, `0` picks an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.address = Some(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
        self
    }

    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    pub fn max_request_size(mut self, max_request_size: usize) -> Self {
        self.connection.max_request_size = max_request_size;
        self
    }

    pub fn read_buffer_capacity(mut self, read_buffer_capacity: usize) -> Self {
        self.connection.read_buffer_capacity = read_buffer_capacity;
        self
    }

    pub fn shutdown_policy(mut self, shutdown_policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = shutdown_policy;
        self
    }

    /// Binds the listener and starts accepting in the background.
    ///
    /// # Errors
    ///
    /// * `ServerError::MissingAddress` when neither [`port`](Self::port) nor
    ///   [`address`](Self::address) was set
    /// * `ServerError::Bind` when the address can't be bound
    pub async fn serve<H>(self, handler: H) -> Result<Server, ServerError>
    where
        H: Handler<OwnedWriteHalf> + 'static,
    {
        let address = self.address.ok_or(ServerError::MissingAddress)?;
        Server::start(address, self.connection, self.shutdown_policy, Arc::new(handler)).await
    }
}
