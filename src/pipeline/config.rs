use std::collections::HashMap;
use std::sync::Arc;

/// Per-stage overrides for the capacity of the channel a stage pushes into.
#[derive(Clone, Debug, Default)]
pub(crate) struct StageConfig {
    pub buffers: Arc<HashMap<String, usize>>,
}

impl StageConfig {
    pub fn buffer_for(&self, stage: &str, global: usize) -> usize {
        self.buffers.get(stage).copied().unwrap_or(global).max(1)
    }

    /// The configuration in scope for the current task, or the empty one.
    pub fn current() -> Self {
        STAGE_CONFIG.try_with(Clone::clone).unwrap_or_default()
    }
}

tokio::task_local! {
    pub(crate) static STAGE_CONFIG: StageConfig;
}
