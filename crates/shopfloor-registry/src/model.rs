//! Registry data model.

use serde::{Deserialize, Serialize};

/// One registered machine: a stable id and the address of its control
/// endpoint (host:port of the line channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineEntry {
    /// Stable machine identity, unique within the registry
    pub id: usize,
    /// Control-endpoint address, e.g. "10.0.0.15:23"
    pub address: String,
}

/// On-disk shape of the registry file:
/// `{ "machines": [ { "id": 1, "address": "..." }, ... ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RegistryFile {
    pub machines: Vec<MachineEntry>,
}
