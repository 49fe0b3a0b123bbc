// Unit profiles and the server registry that selects them
//
// Every server deployment exports the same task report, either in metric
// (㎡, L) or imperial (ft², gal) units. The registry maps a server identity to
// its unit system and output quirks.

pub mod server_registry;
pub mod unit_profile;

pub use server_registry::{select_unit_system, RegistryError, ServerProfile, ServerRegistry};
pub use unit_profile::{ColumnLayout, UnitConversion, UnitSystem};
