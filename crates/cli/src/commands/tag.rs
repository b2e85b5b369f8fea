// `sidenote tag`: add or remove tags.

use anyhow::bail;
use clap::Args;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct TagArgs {
    /// Note id.
    pub id: String,

    /// Tag to add (repeatable).
    #[arg(long = "add", value_name = "TAG")]
    add: Vec<String>,

    /// Tag to remove (repeatable).
    #[arg(long = "remove", value_name = "TAG")]
    remove: Vec<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: TagArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, retag(args), format_note)
}

async fn retag(args: TagArgs) -> anyhow::Result<NoteView> {
    if args.add.is_empty() && args.remove.is_empty() {
        bail!("pass --add or --remove");
    }
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&args.id).await?;

    let mut tags = client.session().record().tags.clone();
    for tag in &args.remove {
        tags.remove(tag.trim());
    }
    for tag in &args.add {
        tags.insert(tag.trim().to_string());
    }
    client.run(|session| session.set_tags(tags)).await?;
    Ok(NoteView::from(client.session().record()))
}
