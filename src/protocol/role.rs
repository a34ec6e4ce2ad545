//! Endpoint role and message direction.

/// WebSocket connection role.
///
/// Determines which negotiated parameters govern the outbound and inbound
/// compression contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Client role - sends the offer.
    Client,
    /// Server role - answers the offer.
    Server,
}

impl Role {
    /// Direction of messages this endpoint sends.
    #[inline]
    #[must_use]
    pub const fn outbound(&self) -> Direction {
        match self {
            Role::Client => Direction::ClientToServer,
            Role::Server => Direction::ServerToClient,
        }
    }

    /// Direction of messages this endpoint receives.
    #[inline]
    #[must_use]
    pub const fn inbound(&self) -> Direction {
        match self {
            Role::Client => Direction::ServerToClient,
            Role::Server => Direction::ClientToServer,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "Client"),
            Role::Server => write!(f, "Server"),
        }
    }
}

/// Direction of a message stream on one connection.
///
/// Each direction owns its own compression context; `client_*` parameters
/// govern client-to-server, `server_*` parameters govern server-to-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Messages compressed by the client and inflated by the server.
    ClientToServer,
    /// Messages compressed by the server and inflated by the client.
    ServerToClient,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::ClientToServer => write!(f, "client-to-server"),
            Direction::ServerToClient => write!(f, "server-to-client"),
        }
    }
}
