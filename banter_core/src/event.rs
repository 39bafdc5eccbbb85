use serde::{Deserialize, Serialize};

/// Progress events emitted, in strict order, while a single turn runs.
///
/// A turn produces `LoadingHistory`, then `SearchingWeb` when evidence
/// augmentation is enabled, then `BuildingPrompt`, zero or more
/// `GeneratingToken`, `UpdatingMemory`, and finally exactly one terminal
/// event: `Finished` or `Failed`. A turn may stop at `Failed` after
/// `SearchingWeb`, any `GeneratingToken`, or `UpdatingMemory`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnEvent {
    LoadingHistory,
    SearchingWeb,
    BuildingPrompt,
    GeneratingToken { text: String },
    UpdatingMemory,
    /// Distinct source identifiers of the evidence used, in retrieval order.
    Finished { sources: Vec<String> },
    Failed,
}

impl TurnEvent {
    #[must_use]
    pub fn token(text: impl Into<String>) -> Self {
        Self::GeneratingToken { text: text.into() }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed)
    }

    /// Stage name, matching the serialized `status` tag.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::LoadingHistory => "loading_history",
            Self::SearchingWeb => "searching_web",
            Self::BuildingPrompt => "building_prompt",
            Self::GeneratingToken { .. } => "generating_token",
            Self::UpdatingMemory => "updating_memory",
            Self::Finished { .. } => "finished",
            Self::Failed => "failed",
        }
    }
}
