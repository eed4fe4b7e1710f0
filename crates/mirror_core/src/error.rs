use shared::domain::PluginId;
use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// Two registered kinds share an id. Fatal at startup.
    #[error("plugin id '{0}' is registered more than once")]
    DuplicateId(PluginId),
    /// A kind was registered without a factory. Fatal at registration.
    #[error("plugin '{id}' is missing its {capability}")]
    MissingCapability {
        id: PluginId,
        capability: &'static str,
    },
    /// An app kind already has a live instance. Recoverable; shown as a notice.
    #[error("app '{0}' is already open")]
    DuplicateApp(PluginId),
    #[error("no plugin kind named '{0}'")]
    UnknownKind(PluginId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MirrorError {
    /// Whether the interaction loop can carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MirrorError::DuplicateApp(_) | MirrorError::UnknownKind(_) | MirrorError::Storage(_)
        )
    }
}
