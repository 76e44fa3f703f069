use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(
        "Missing API credentials: set token_id and token_secret in the config file or MUX_TOKEN_ID and MUX_TOKEN_SECRET"
    )]
    MissingCredentials,

    #[error("{failed} of {total} uploads failed")]
    BatchFailed { failed: usize, total: usize },
}
