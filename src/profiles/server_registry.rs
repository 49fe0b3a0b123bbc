use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::unit_profile::UnitSystem;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read server registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid server registry: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-region settings for one server deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProfile {
    pub name: String,
    pub units: UnitSystem,
    /// Emit a `pause_time` column after `total_time`
    #[serde(default)]
    pub pause_time_column: bool,
    /// Emit `job_id` and `vendor` columns (every server but the primary one)
    #[serde(default = "default_true")]
    pub vendor_columns: bool,
    /// Hours added to the operator's clock to get the adjusted timestamp
    #[serde(default = "default_offset_hours")]
    pub clock_offset_hours: i64,
}

fn default_true() -> bool {
    true
}

fn default_offset_hours() -> i64 {
    8
}

impl ServerProfile {
    fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            units: UnitSystem::Metric,
            pause_time_column: false,
            vendor_columns: true,
            clock_offset_hours: default_offset_hours(),
        }
    }
}

/// Lookup table from server identity to its profile
///
/// Identities missing from the table resolve to `default` under the requested name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRegistry {
    #[serde(default = "default_profile")]
    pub default: ServerProfile,
    pub servers: Vec<ServerProfile>,
}

fn default_profile() -> ServerProfile {
    ServerProfile::fallback("default")
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServerRegistry {
    /// The regions currently deployed
    pub fn builtin() -> Self {
        let server = |name: &str, units, pause_time_column, vendor_columns, clock_offset_hours| {
            ServerProfile {
                name: name.to_string(),
                units,
                pause_time_column,
                vendor_columns,
                clock_offset_hours,
            }
        };

        Self {
            default: default_profile(),
            servers: vec![
                server("GS SGV1", UnitSystem::Metric, false, false, 9),
                server("GS SGV2", UnitSystem::Metric, true, true, 8),
                server("GS AUS", UnitSystem::Metric, true, true, 8),
                server("GS CA", UnitSystem::Imperial, false, true, 8),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        info!("Loading server registry from {}", path.display());
        let registry = Self::from_json_str(&fs::read_to_string(path)?)?;
        debug!("Loaded {} server profiles", registry.servers.len());
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ServerProfile> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Profile for `name`, falling back to the default entry
    pub fn lookup(&self, name: &str) -> ServerProfile {
        match self.get(name) {
            Some(profile) => profile.clone(),
            None => {
                debug!("Server {:?} not in registry, using default profile", name);
                ServerProfile {
                    name: name.to_string(),
                    ..self.default.clone()
                }
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|s| s.name.as_str())
    }
}

/// Choose the unit system a server's exports are written in
pub fn select_unit_system(registry: &ServerRegistry, server: &str) -> UnitSystem {
    registry.lookup(server).units
}
