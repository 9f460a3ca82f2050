//! Outbound message sending.
//!
//! The transport is a consumed capability behind [`ParameterSender`], so the
//! broadcast engine never touches sockets directly and tests can swap in a
//! recording double. The production implementation, [`OscUdpSender`], fires
//! OSC datagrams at one fixed destination for the lifetime of the process:
//! no acknowledgment, no retry.

use crate::error::{AppResult, BatteryOscError};
use crate::osc;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

/// Send a named float parameter to a fixed network destination.
#[async_trait]
pub trait ParameterSender: Send + Sync {
    /// Fire-and-forget send of one float parameter.
    async fn send_float(&self, parameter: &str, value: f32) -> AppResult<()>;

    /// Release transport resources. Idempotent; the default is a no-op.
    async fn shutdown(&self) -> AppResult<()> {
        Ok(())
    }
}

/// UDP/OSC implementation of [`ParameterSender`].
pub struct OscUdpSender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl OscUdpSender {
    /// Bind an ephemeral local port for sending to `destination`.
    pub async fn bind(destination: SocketAddr) -> AppResult<Self> {
        let bind_addr: SocketAddr = if destination.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        debug!(%destination, "OSC sender bound");
        Ok(Self {
            socket,
            destination,
        })
    }

    /// The fixed destination this sender fires at.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

#[async_trait]
impl ParameterSender for OscUdpSender {
    async fn send_float(&self, parameter: &str, value: f32) -> AppResult<()> {
        let datagram = osc::encode_float_message(parameter, value)?;
        self.socket
            .send_to(&datagram, self.destination)
            .await
            .map_err(|source| BatteryOscError::Send {
                parameter: parameter.to_string(),
                source,
            })?;
        trace!(%parameter, value, destination = %self.destination, "sent OSC float");
        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        // The socket closes on drop; nothing to flush for fire-and-forget UDP.
        debug!(destination = %self.destination, "OSC sender released");
        Ok(())
    }
}
