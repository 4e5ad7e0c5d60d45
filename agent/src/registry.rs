//! Several conversations in one process, one [`Agent`] per conversation id.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::controller::Agent;

type AgentFactory = dyn Fn(&str) -> Agent + Send + Sync;

/// Conversation id to agent. Agents are created on first use by the factory, which decides
/// what they share (typically one `MemoryStore` behind per-conversation `RecallSession`s).
pub struct AgentRegistry {
    agents: DashMap<String, Arc<Agent>>,
    factory: Box<AgentFactory>,
}

impl AgentRegistry {
    pub fn new(factory: impl Fn(&str) -> Agent + Send + Sync + 'static) -> Self {
        Self {
            agents: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    pub fn get_or_create(&self, conversation_id: &str) -> Arc<Agent> {
        if let Some(agent) = self.agents.get(conversation_id) {
            return Arc::clone(agent.value());
        }
        let entry = self
            .agents
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                info!(conversation_id, "step: conversation created");
                Arc::new((self.factory)(conversation_id))
            });
        Arc::clone(entry.value())
    }

    pub fn get(&self, conversation_id: &str) -> Option<Arc<Agent>> {
        self.agents.get(conversation_id).map(|a| Arc::clone(a.value()))
    }

    pub fn remove(&self, conversation_id: &str) -> Option<Arc<Agent>> {
        self.agents.remove(conversation_id).map(|(_, agent)| agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Shuts every conversation down, waiting for running turns.
    pub async fn shutdown_all(&self) {
        let agents: Vec<Arc<Agent>> = self.agents.iter().map(|e| Arc::clone(e.value())).collect();
        for agent in agents {
            agent.shutdown().await;
        }
    }
}
