use studyhub_client_core::client::ApiClientError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Mutation attempted with no authenticated identity established.
    #[error("no authenticated identity")]
    NoIdentity,
    #[error(transparent)]
    Api(#[from] ApiClientError),
}
