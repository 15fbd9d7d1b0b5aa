pub mod check;
pub mod server;

// Internal "interpreter" for `Action`.
mod run;

use crate::config::Config;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Check(check::Args),
}

impl Action {
    /// Validated configuration the action runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        match self {
            Self::Server(args) => &args.config,
            Self::Check(args) => &args.config,
        }
    }

    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
