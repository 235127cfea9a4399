//! # Register File
//!
//! Host-side buffers of one invocation. Registers never outlive the
//! invocation that populated them.

use crate::domain::value_objects::RegisterId;
use crate::errors::{HostResult, Trap};
use std::collections::HashMap;

/// Sparse register file.
#[derive(Debug, Default, Clone)]
pub struct RegisterFile {
    registers: HashMap<RegisterId, Vec<u8>>,
}

impl RegisterFile {
    /// Empty register file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content of `register_id`.
    pub fn write(&mut self, register_id: RegisterId, bytes: impl Into<Vec<u8>>) {
        self.registers.insert(register_id, bytes.into());
    }

    /// Content of `register_id`; trap if never written.
    pub fn read(&self, register_id: RegisterId) -> HostResult<&[u8]> {
        self.registers
            .get(&register_id)
            .map(Vec::as_slice)
            .ok_or(Trap::RegisterNotPopulated(register_id))
    }

    /// Length of `register_id`, `None` if never written.
    #[must_use]
    pub fn len(&self, register_id: RegisterId) -> Option<u64> {
        self.registers.get(&register_id).map(|r| r.len() as u64)
    }

    /// Returns true if no register was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Drop every register.
    pub fn clear(&mut self) {
        self.registers.clear();
    }
}
