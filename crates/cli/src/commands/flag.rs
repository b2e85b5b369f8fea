// `sidenote star|bookmark|library`: flip one of a note's flags.

use clap::Args;
use sidenote_common::types::Property;
use sidenote_session::ClientConfig;

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct FlagArgs {
    /// Note id.
    pub id: String,

    /// Clear the flag instead of setting it.
    #[arg(long)]
    off: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Star,
    Bookmark,
    Library,
}

impl Flag {
    fn property(self) -> Property {
        match self {
            Self::Star => Property::Starred,
            Self::Bookmark => Property::Bookmarked,
            Self::Library => Property::InLibrary,
        }
    }
}

pub fn run(args: FlagArgs, flag: Flag) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, set_flag(args, flag), format_note)
}

async fn set_flag(args: FlagArgs, flag: Flag) -> anyhow::Result<NoteView> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&args.id).await?;
    let property = flag.property();
    let changed = client.run(|session| session.set_property(property, !args.off)).await?;
    if !changed {
        tracing::info!(id = %args.id, property = property.as_str(), "flag already in place");
    }
    Ok(NoteView::from(client.session().record()))
}
