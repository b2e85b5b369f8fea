// `sidenote show`: print a note with its tags and flags.

use clap::Args;
use serde::{Deserialize, Serialize};
use sidenote_common::types::{DocumentProperties, DocumentRecord};
use sidenote_session::ClientConfig;

use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Note id.
    pub id: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

/// What every note-returning command prints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteView {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: DocumentProperties,
}

impl From<&DocumentRecord> for NoteView {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            content: record.content.clone(),
            tags: record.tags.iter().cloned().collect(),
            properties: record.properties,
        }
    }
}

pub fn run(args: ShowArgs) -> anyhow::Result<()> {
    super::execute(args.json, show(args.id), format_note)
}

async fn show(id: String) -> anyhow::Result<NoteView> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&id).await?;
    Ok(NoteView::from(client.session().record()))
}

pub fn format_note(note: &NoteView) -> String {
    let mut header = format!("# {} ({})", note.name, note.id);
    let flags: Vec<&str> = [
        (note.properties.starred, "starred"),
        (note.properties.bookmarked, "bookmarked"),
        (note.properties.in_library, "in library"),
    ]
    .into_iter()
    .filter_map(|(on, label)| on.then_some(label))
    .collect();
    if !flags.is_empty() {
        header.push_str(&format!(" [{}]", flags.join(", ")));
    }

    let mut lines = vec![header];
    if !note.tags.is_empty() {
        lines.push(format!("tags: {}", note.tags.join(", ")));
    }
    lines.push(String::new());
    lines.push(note.content.clone());
    lines.join("\n")
}
