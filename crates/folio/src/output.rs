//! Terminal reports for library commands.
//!
//! Each report is formatted by a plain function and written to stderr in
//! the color of its outcome.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use folio_catalog::FeedRecord;
use folio_config::Config;
use folio_server::IngestOutcome;

/// Outcome class of a reported line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tone {
    Plain,
    Done,
    Skipped,
    Failed,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Self::Plain => Style::new(),
            Self::Done => Style::new().green(),
            Self::Skipped => Style::new().yellow(),
            Self::Failed => Style::new().red(),
        }
    }
}

/// Writes library reports to the terminal.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn emit(&self, tone: Tone, line: &str) {
        let _ = self.term.write_line(&tone.style().apply_to(line).to_string());
    }

    /// Where the server listens and what it serves.
    pub(crate) fn startup(&self, config: &Config) {
        for line in startup_lines(config) {
            self.emit(Tone::Plain, &line);
        }
    }

    /// Result of importing one file.
    pub(crate) fn imported(&self, file: &Path, outcome: &IngestOutcome) {
        let tone = match outcome {
            IngestOutcome::Added(_) => Tone::Done,
            IngestOutcome::AlreadyImported(_) => Tone::Skipped,
        };
        self.emit(tone, &import_line(file, outcome));
    }

    pub(crate) fn import_failed(&self, file: &Path, err: &dyn Display) {
        self.emit(Tone::Failed, &format!("Failed {}: {err}", file.display()));
    }

    pub(crate) fn removed(&self, title: &str, id: &str) {
        self.emit(Tone::Done, &format!("Removed {title} ({id})"));
    }

    pub(crate) fn unknown_book(&self, id: &str) {
        self.emit(Tone::Skipped, &format!("No book with id {id}"));
    }

    /// Stored feed definitions, one per line with dimmed details.
    pub(crate) fn feeds(&self, feeds: &[FeedRecord]) {
        let heading = Style::new().cyan().bold();
        let dim = Style::new().dim();
        let _ = self
            .term
            .write_line(&heading.apply_to(format!("{} feeds", feeds.len())).to_string());
        for feed in feeds {
            let _ = self.term.write_line(&format!(
                "{}  {}",
                feed.common.name,
                dim.apply_to(describe_feed(feed))
            ));
        }
    }

    /// Error that ends the command.
    pub(crate) fn fatal(&self, err: &dyn Display) {
        self.emit(Tone::Failed, &format!("Error: {err}"));
    }
}

fn startup_lines(config: &Config) -> Vec<String> {
    let library = &config.library_resolved;
    vec![
        format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ),
        format!("Library: {}", library.data_dir.display()),
        match &library.autoadd_dir {
            Some(dir) => format!("Auto-add: watching {}", dir.display()),
            None => "Auto-add: disabled".to_owned(),
        },
    ]
}

fn import_line(file: &Path, outcome: &IngestOutcome) -> String {
    match outcome {
        IngestOutcome::Added(id) => format!("Added {} as {id}", file.display()),
        IngestOutcome::AlreadyImported(id) => {
            format!("Skipped {}: already in the library as {id}", file.display())
        }
    }
}

fn describe_feed(feed: &FeedRecord) -> String {
    let members = if feed.members.is_empty() {
        "all".to_owned()
    } else {
        feed.members.join(", ")
    };
    format!(
        "{} ({}, sort {}, members: {members})",
        feed.common.title, feed.common.kind, feed.sort
    )
}

#[cfg(test)]
mod tests {
    use folio_catalog::{FeedKind, SortKey, feed_record};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_describe_feed() {
        let feed = feed_record(
            "root",
            "Catalog Root",
            "",
            FeedKind::Navigation,
            SortKey::Title,
            vec!["all".to_owned(), "recent".to_owned()],
        );

        assert_eq!(
            describe_feed(&feed),
            "Catalog Root (navigation, sort title, members: all, recent)"
        );
    }

    #[test]
    fn test_describe_feed_without_members() {
        let feed = feed_record(
            "all",
            "All Books",
            "",
            FeedKind::Acquisition,
            SortKey::Updated,
            Vec::new(),
        );

        assert_eq!(
            describe_feed(&feed),
            "All Books (acquisition, sort updated, members: all)"
        );
    }

    #[test]
    fn test_import_lines() {
        let file = Path::new("inbox/dune.epub");

        assert_eq!(
            import_line(file, &IngestOutcome::Added("b1".to_owned())),
            "Added inbox/dune.epub as b1"
        );
        assert_eq!(
            import_line(file, &IngestOutcome::AlreadyImported("b1".to_owned())),
            "Skipped inbox/dune.epub: already in the library as b1"
        );
    }

    #[test]
    fn test_startup_lines_without_autoadd() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("folio.toml");
        std::fs::write(&config_path, "[server]\nport = 9000\n").unwrap();
        let config = Config::load(Some(&config_path), None).unwrap();

        let lines = startup_lines(&config);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(":9000"), "{}", lines[0]);
        assert_eq!(lines[2], "Auto-add: disabled");
    }
}
