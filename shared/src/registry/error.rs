use thiserror::Error;

/// Errors that can occur while resolving replicated properties. All of these
/// mean the triggering message is dropped; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No property is registered under this wire identity
    #[error("Could not locate property {property_id} for owner {owner_id}")]
    UnknownProperty { owner_id: u64, property_id: i64 },

    /// No owner with this identity has registered any properties
    #[error("Could not locate owner {owner_id}")]
    UnknownOwner { owner_id: u64 },

    /// The property was registered but its holder has been dropped
    #[error("Property {property_id} for owner {owner_id} is no longer alive")]
    PropertyDropped { owner_id: u64, property_id: i64 },
}
