//! Tunables of a `VirtualMachine`.

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MachineConfig {
  /// Stops a run after this many instructions, guarding against shaders that never halt.
  pub instruction_limit : Option<u64>,
  /// Temporaries to allocate up front, before the first shader says how many it needs.
  pub temporaries_hint  : usize,
}

impl Default for MachineConfig {
  fn default() -> MachineConfig {
    MachineConfig {
      instruction_limit : None,
      temporaries_hint  : 16,
    }
  }
}

impl MachineConfig {
  pub fn with_instruction_limit(mut self, limit: u64) -> MachineConfig {
    self.instruction_limit = Some(limit);
    self
  }
}
