//! Agent Registry: a shared, in-memory store of `AgentAdapterDescriptor`s,
//! keyed by `agent_id`. The registry never loads or spawns anything itself;
//! it exists so the orchestrator and CLI can resolve a descriptor by id
//! without threading a `Vec<AgentAdapterDescriptor>` through every call.

use std::collections::HashMap;
use std::sync::RwLock;

use tab_types::AgentAdapterDescriptor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("agent '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("no agent registered under id '{0}'")]
    NotFound(String),

    #[error(transparent)]
    InvalidDescriptor(#[from] tab_types::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Thread-safe registry of adapter descriptors. Cheap to clone (wraps an
/// `Arc` internally would be the natural next step for multi-orchestrator
/// embedding; kept as a plain `RwLock`-guarded map here since one process
/// drives exactly one registry for the lifetime of a run).
#[derive(Default)]
pub struct AgentRegistry {
    descriptors: RwLock<HashMap<String, AgentAdapterDescriptor>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: AgentAdapterDescriptor) -> Result<()> {
        descriptor.validate()?;
        let mut guard = self.descriptors.write().expect("registry lock poisoned");
        if guard.contains_key(&descriptor.agent_id) {
            return Err(RegistryError::AlreadyRegistered(descriptor.agent_id));
        }
        guard.insert(descriptor.agent_id.clone(), descriptor);
        Ok(())
    }

    /// Registers `descriptor`, overwriting any existing entry for the same
    /// `agent_id`. Used when reloading configuration between runs.
    pub fn upsert(&self, descriptor: AgentAdapterDescriptor) -> Result<()> {
        descriptor.validate()?;
        let mut guard = self.descriptors.write().expect("registry lock poisoned");
        guard.insert(descriptor.agent_id.clone(), descriptor);
        Ok(())
    }

    pub fn lookup(&self, agent_id: &str) -> Result<AgentAdapterDescriptor> {
        let guard = self.descriptors.read().expect("registry lock poisoned");
        guard.get(agent_id).cloned().ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))
    }

    pub fn list(&self) -> Vec<AgentAdapterDescriptor> {
        let guard = self.descriptors.read().expect("registry lock poisoned");
        guard.values().cloned().collect()
    }

    pub fn remove(&self, agent_id: &str) -> Option<AgentAdapterDescriptor> {
        let mut guard = self.descriptors.write().expect("registry lock poisoned");
        guard.remove(agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use std::time::Duration;
    use tab_types::adapter::{LoadStrategy, TransportKind};

    fn descriptor(agent_id: &str) -> AgentAdapterDescriptor {
        AgentAdapterDescriptor {
            agent_id: agent_id.to_string(),
            kind: "claude-code".into(),
            transport: TransportKind::LineJsonStdout,
            load_strategy: LoadStrategy::Builtin,
            command: "claude".into(),
            args: vec!["-p".into()],
            working_dir: ".".into(),
            env: Map::new(),
            turn_timeout: Duration::from_secs(120),
            supports_resume: true,
        }
    }

    #[test]
    fn register_then_lookup_round_trips() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("claude")).unwrap();
        let found = registry.lookup("claude").unwrap();
        assert_eq!(found.agent_id, "claude");
    }

    #[test]
    fn duplicate_register_is_rejected() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("claude")).unwrap();
        assert!(matches!(registry.register(descriptor("claude")), Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn lookup_missing_agent_errors() {
        let registry = AgentRegistry::new();
        assert!(matches!(registry.lookup("nope"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn upsert_overwrites() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("claude")).unwrap();
        let mut updated = descriptor("claude");
        updated.command = "claude-v2".into();
        registry.upsert(updated).unwrap();
        assert_eq!(registry.lookup("claude").unwrap().command, "claude-v2");
    }
}
