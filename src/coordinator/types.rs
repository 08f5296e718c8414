// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the gateway coordinator.

/// Gateway lifecycle state.
///
/// Use [`super::SearchGateway::state()`] to check the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// Just created, no indexes registered yet
    Created,
    /// Waiting for the backend and creating cores
    Bootstrapping,
    /// Serving requests
    Ready,
}

impl std::fmt::Display for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Bootstrapping => write!(f, "Bootstrapping"),
            Self::Ready => write!(f, "Ready"),
        }
    }
}

/// What bootstrap did to each configured index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Cores created, with schema applied
    pub created: Vec<String>,
    /// Cores that already existed and were only registered
    pub existing: Vec<String>,
}

impl BootstrapReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.existing.len()
    }
}

/// Result of creating or updating an index definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexProvisioning {
    /// A new core was created and its schema applied
    Created,
    /// The core already existed; only the registration changed
    Registered,
}
