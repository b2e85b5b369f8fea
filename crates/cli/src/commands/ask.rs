// `sidenote ask`: have the assistant continue a note.
//
// Streamed text is echoed to stderr as it arrives when stderr is a
// terminal; the merged note is printed once it has been saved.

use std::io::{IsTerminal, Write};

use anyhow::bail;
use clap::Args;
use sidenote_session::{ClientConfig, Notice};

use super::show::{format_note, NoteView};
use crate::client::NoteClient;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Note id.
    pub id: String,

    /// What to ask for, e.g. "list what else I need".
    pub request: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: AskArgs) -> anyhow::Result<()> {
    let json = args.json;
    super::execute(json, ask(args), format_note)
}

async fn ask(args: AskArgs) -> anyhow::Result<NoteView> {
    let mut client = NoteClient::connect(&ClientConfig::load())?;
    client.open(&args.id).await?;

    let echo = std::io::stderr().is_terminal();
    let mut notices = client.subscribe();
    let printer = tokio::spawn(async move {
        let mut shown = 0;
        while let Ok(notice) = notices.recv().await {
            if let Notice::Preview { text, .. } = notice {
                if echo {
                    let mut err = std::io::stderr().lock();
                    let _ = write!(err, "{}", text.get(shown..).unwrap_or_default());
                    let _ = err.flush();
                }
                shown = text.len();
            }
        }
    });

    let started = client.run(|session| session.ask(&args.request)).await;
    printer.abort();
    if echo {
        eprintln!();
    }
    if !started? {
        bail!("the request was empty");
    }
    Ok(NoteView::from(client.session().record()))
}
