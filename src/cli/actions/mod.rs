//! What the process does once arguments are validated.

pub mod server;

/// A validated unit of work produced by [`crate::cli::dispatch::handler`].
#[derive(Debug)]
pub enum Action {
    /// Serve the HTTP API until interrupted.
    Server(server::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the listener fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
        }
    }
}
