use crate::config::ConfigError;
use crate::id::{ItemKind, RecipeId};

/// Fatal scheduler errors. Any of these latches the scheduler into its halted
/// state; nothing recovers automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// A tier or dispatch names a recipe missing from the catalog.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(RecipeId),

    /// No registered inventory holds any of the ingredient.
    #[error("no more {0} found")]
    NoSourceAvailable(ItemKind),

    /// The per-ingredient attempt budget ran out before demand was met.
    #[error("too many attempts to move {item} ({attempts} attempts)")]
    ProvisioningStalled { item: ItemKind, attempts: u32 },
}

impl SchedulerError {
    /// The ingredient involved, if any.
    pub fn item(&self) -> Option<&ItemKind> {
        match self {
            SchedulerError::UnknownRecipe(_) => None,
            SchedulerError::NoSourceAvailable(item) => Some(item),
            SchedulerError::ProvisioningStalled { item, .. } => Some(item),
        }
    }
}

/// Problems found while assembling a scheduler, before the first tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
