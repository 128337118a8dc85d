//! Machine registry for host discovery.
//!
//! Each machine self-registers via [`inventory::submit!`] with a
//! [`MachineEntry`] naming it and providing a factory. The host discovers
//! available machines at runtime without a central list.

use lumen_core::core::machine::Machine;

use crate::media::{MediaError, MediaSet};

/// Describes a host-runnable machine.
pub struct MachineEntry {
    /// CLI name used to select this machine (e.g., "sms").
    pub name: &'static str,
    /// Factory: construct a Machine from loaded media.
    pub create: fn(&MediaSet) -> Result<Box<dyn Machine>, MediaError>,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        create: fn(&MediaSet) -> Result<Box<dyn Machine>, MediaError>,
    ) -> Self {
        Self { name, create }
    }
}

inventory::collect!(MachineEntry);

/// Return all registered machines, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a machine by its CLI name.
pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
