//! In-memory object dictionary.
//!
//! Holds the node's dictionary entries when no fieldbus stack owns them:
//! host simulation and tests, or as the staging area a stack bridge copies
//! into its own dictionary after each tick.

use heapless::FnvIndexMap;
use log::warn;

use crate::app::ports::ObjectDictionaryPort;

/// Entries the node can hold.  Must be a power of two.
const CAPACITY: usize = 8;

#[derive(Debug, Default)]
pub struct LocalObjectDictionary {
    entries: FnvIndexMap<u16, u8, CAPACITY>,
    transmit_requests: u32,
    active_node_id: Option<u8>,
}

impl LocalObjectDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the node id the stack came up with.
    pub fn set_active_node_id(&mut self, id: Option<u8>) {
        self.active_node_id = id;
    }

    /// Number of TPDO transmissions requested so far.
    pub fn transmit_requests(&self) -> u32 {
        self.transmit_requests
    }
}

impl ObjectDictionaryPort for LocalObjectDictionary {
    fn get(&self, index: u16) -> u8 {
        self.entries.get(&index).copied().unwrap_or(0)
    }

    fn set(&mut self, index: u16, value: u8) {
        if self.entries.insert(index, value).is_err() {
            warn!("OD: no room for entry {:#06x}", index);
        }
    }

    fn request_transmit(&mut self) {
        self.transmit_requests = self.transmit_requests.wrapping_add(1);
    }

    fn active_node_id(&self) -> Option<u8> {
        self.active_node_id
    }
}
