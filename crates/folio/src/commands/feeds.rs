//! `folio feeds` command implementation.

use clap::Args;

use super::LibraryArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the feeds command.
#[derive(Args)]
pub(crate) struct FeedsArgs {
    #[command(flatten)]
    pub library: LibraryArgs,
}

impl FeedsArgs {
    /// Execute the feeds command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_config, catalog) = self.library.open()?;

        output.feeds(&catalog.feeds()?);
        Ok(())
    }
}
