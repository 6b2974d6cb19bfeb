use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MeshError;

/// Role a peer currently plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Manager,
    Server,
}

impl Role {
    /// Initial role when none is given on the command line.
    pub fn random_client<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Role::Seller
        } else {
            Role::Manager
        }
    }

    /// Seller and manager peers are the ones that watch the server.
    pub fn is_client(self) -> bool {
        matches!(self, Role::Seller | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Seller => write!(f, "seller"),
            Role::Manager => write!(f, "manager"),
            Role::Server => write!(f, "server"),
        }
    }
}

impl FromStr for Role {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seller" => Ok(Role::Seller),
            "manager" => Ok(Role::Manager),
            "server" => Ok(Role::Server),
            other => Err(MeshError::InvalidRole(other.to_string())),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    #[serde(alias = "type")]
    pub role: Role,
    pub port: u16,
}

impl Peer {
    pub fn new(id: impl Into<String>, role: Role, port: u16) -> Self {
        Self {
            id: id.into(),
            role,
            port,
        }
    }

    /// Fresh human-readable identity for a newly started peer.
    pub fn generate_name() -> String {
        names::Generator::default()
            .next()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// The entry this peer is rewritten to when it gets promoted:
    /// new identity, server role, same port.
    pub fn promoted(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Server,
            port: self.port,
        }
    }
}
