use thiserror::Error;

/// Errors that can occur while syncing a property value. All of these are
/// fatal to a single send/apply only and are logged at the property boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The current value could not be serialized for transmission
    #[error("Failed to serialize value for property {descriptor}")]
    Serialization { descriptor: String },

    /// A received value could not be deserialized; local state is unchanged
    #[error("Failed to deserialize {byte_count} received bytes for property {descriptor}")]
    Deserialization {
        descriptor: String,
        byte_count: usize,
    },
}
