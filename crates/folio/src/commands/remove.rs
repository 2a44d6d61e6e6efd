//! `folio remove` command implementation.

use clap::Args;

use super::LibraryArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the remove command.
#[derive(Args)]
pub(crate) struct RemoveArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Ids of the books to remove.
    #[arg(required = true)]
    ids: Vec<String>,
}

impl RemoveArgs {
    /// Execute the remove command. Unknown ids are reported, not fatal.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_config, catalog) = self.library.open()?;

        for id in &self.ids {
            let title = match catalog.book(id) {
                Ok(book) => book.meta.title,
                Err(e) if e.is_not_found() => {
                    output.unknown_book(id);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            catalog.delete_book(id)?;
            output.removed(&title, id);
        }
        Ok(())
    }
}
