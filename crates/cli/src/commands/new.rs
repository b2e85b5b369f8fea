// `sidenote new`: create a note, optionally named and continued by the assistant.

use anyhow::bail;
use clap::Args;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Note name. Without one, the assistant is asked for a title.
    #[arg(long)]
    name: Option<String>,

    /// Initial body.
    #[arg(long)]
    content: Option<String>,

    /// Ask the assistant to continue the note.
    #[arg(long)]
    ask: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: NewArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, create(args), format_note)
}

async fn create(args: NewArgs) -> anyhow::Result<NoteView> {
    let content = args.content.filter(|content| !content.trim().is_empty());
    let ask = args.ask.filter(|request| !request.trim().is_empty());
    if content.is_none() && ask.is_none() {
        bail!("nothing to create: pass --content or --ask");
    }

    let mut client = NoteClient::connect(&ClientConfig::load())?;
    if let Some(content) = content {
        client.run(|session| session.edit(content)).await?;
    }
    if let Some(request) = ask {
        client.run(|session| session.ask(&request)).await?;
    }
    match args.name {
        Some(name) => {
            client.run(|session| session.rename(&name)).await?;
        }
        None => {
            client.run(|session| session.suggest_name()).await?;
        }
    }

    let record = client.session().record();
    if !record.is_persisted() {
        bail!("the note was not saved");
    }
    Ok(NoteView::from(record))
}
