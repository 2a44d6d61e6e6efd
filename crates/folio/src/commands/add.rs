//! `folio add` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use folio_server::{SourceOpener, ingest_file};

use super::LibraryArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the add command.
#[derive(Args)]
pub(crate) struct AddArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Delete each file after it was imported.
    #[arg(long)]
    remove: bool,

    /// EPUB files to import.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl AddArgs {
    /// Execute the add command.
    ///
    /// Every file is attempted; the command fails if any import failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_config, catalog) = self.library.open()?;
        let opener: SourceOpener = Arc::new(folio_epub::open_source);

        let mut failed = 0;
        for file in &self.files {
            match ingest_file(&catalog, &opener, file, self.remove) {
                Ok(outcome) => output.imported(file, &outcome),
                Err(e) => {
                    failed += 1;
                    output.import_failed(file, &e);
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} files could not be imported",
                self.files.len()
            )));
        }
        Ok(())
    }
}
