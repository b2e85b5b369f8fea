// `sidenote rename`: give a note a new name.

use clap::Args;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Note id.
    pub id: String,

    /// New name. A blank name leaves the note as it is.
    pub name: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: RenameArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, rename(args), format_note)
}

async fn rename(args: RenameArgs) -> anyhow::Result<NoteView> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&args.id).await?;
    if !client.run(|session| session.rename(&args.name)).await? {
        tracing::info!(id = %args.id, "name unchanged");
    }
    Ok(NoteView::from(client.session().record()))
}
