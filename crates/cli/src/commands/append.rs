// `sidenote append`: quick capture onto an existing note.

use anyhow::bail;
use clap::Args;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct AppendArgs {
    /// Note id.
    pub id: String,

    /// Line to append. Surrounding whitespace is trimmed.
    pub text: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: AppendArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, append(args), format_note)
}

async fn append(args: AppendArgs) -> anyhow::Result<NoteView> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&args.id).await?;
    if !client.run(|session| session.append(&args.text)).await? {
        bail!("nothing to append");
    }
    Ok(NoteView::from(client.session().record()))
}
