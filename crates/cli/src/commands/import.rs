// `sidenote import`: create a note from a text file.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use sidenote_common::transfer::decode_upload;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// UTF-8 text file to upload.
    pub file: PathBuf,

    /// Note name. Defaults to the file name without its extension.
    #[arg(long)]
    name: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: ImportArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, import(args), format_note)
}

async fn import(args: ImportArgs) -> anyhow::Result<NoteView> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let text = decode_upload(&bytes)
        .with_context(|| format!("cannot import {}", args.file.display()))?;
    if text.trim().is_empty() {
        bail!("{} is empty", args.file.display());
    }
    let name = args.name.or_else(|| default_name(&args.file));

    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.run(|session| session.import_text(text)).await?;
    if let Some(name) = name {
        client.run(|session| session.rename(&name)).await?;
    }
    Ok(NoteView::from(client.session().record()))
}

fn default_name(path: &std::path::Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
