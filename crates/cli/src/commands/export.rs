// `sidenote export`: download a note as a `.txt` file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use sidenote_common::transfer::export_file_name;
use sidenote_session::ClientConfig;

use crate::client::NoteClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Note id.
    pub id: String,

    /// Directory to write into.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Exported {
    pub id: String,
    pub path: PathBuf,
    pub bytes: usize,
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    super::execute(args.json, export(args.id, args.dir, format), format_human)
}

async fn export(id: String, dir: PathBuf, format: OutputFormat) -> anyhow::Result<Exported> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&id).await?;
    let record = client.session().record();

    let path = dir.join(export_file_name(&record.name));
    if path.exists() {
        output::print_warning(format, "OVERWRITE", &format!("replacing {}", path.display()));
    }
    write_note(&path, &record.content)?;
    Ok(Exported { id, path, bytes: record.content.len() })
}

fn write_note(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn format_human(exported: &Exported) -> String {
    format!("Wrote {} ({} bytes)", exported.path.display(), exported.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_the_body_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(export_file_name("Plans: 2025/Q1"));
        write_note(&path, "line one\nline two\n").unwrap();
        assert_eq!(path.file_name().unwrap(), "Plans_ 2025_Q1.txt");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("note.txt");
        assert!(write_note(&path, "x").is_err());
    }

    #[test]
    fn human_format_shows_path_and_size() {
        let exported = Exported { id: "7".into(), path: PathBuf::from("Groceries.txt"), bytes: 12 };
        assert_eq!(format_human(&exported), "Wrote Groceries.txt (12 bytes)");
    }
}
