//! `folio serve` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use folio_config::CliSettings;
use folio_server::{SourceOpener, run_server, server_config_from_folio_config};

use super::{LibraryArgs, open_catalog};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory watched for new EPUB files (overrides config).
    #[arg(long, value_name = "DIR")]
    autoadd: Option<PathBuf>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.library.load_config(CliSettings {
            host: self.host,
            port: self.port,
            data_dir: None,
            autoadd_dir: self.autoadd,
        })?;
        let catalog = Arc::new(open_catalog(&config)?);

        output.startup(&config);

        let server_config = server_config_from_folio_config(&config, version.to_owned());
        let opener: SourceOpener = Arc::new(folio_epub::open_source);
        run_server(server_config, catalog, opener)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
