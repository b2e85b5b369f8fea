// `sidenote delete`: remove a note from the store.

use clap::Args;
use serde::Serialize;
use sidenote_session::{ClientConfig, Notice};

use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Note id.
    pub id: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Deleted {
    pub id: String,
    pub name: String,
}

pub fn run(args: DeleteArgs) -> anyhow::Result<()> {
    super::execute(args.json, delete(args.id), format_human)
}

async fn delete(id: String) -> anyhow::Result<Deleted> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&id).await?;
    let mut notices = client.subscribe();
    client.run(|session| session.delete()).await?;

    while let Ok(notice) = notices.try_recv() {
        if let Notice::Deleted { id, name } = notice {
            return Ok(Deleted { id, name });
        }
    }
    anyhow::bail!("note `{id}` was not deleted")
}

fn format_human(deleted: &Deleted) -> String {
    format!("Deleted {} ({})", deleted.name, deleted.id)
}
