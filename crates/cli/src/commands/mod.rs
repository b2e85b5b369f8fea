// CLI subcommand dispatch.

use std::future::Future;

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};

pub mod append;
pub mod ask;
pub mod delete;
pub mod export;
pub mod flag;
pub mod import;
pub mod new;
pub mod rename;
pub mod show;
pub mod tag;

#[derive(Subcommand)]
pub enum Command {
    /// Create a note
    New(new::NewArgs),
    /// Print a note
    Show(show::ShowArgs),
    /// Quick-capture a line at the end of a note
    Append(append::AppendArgs),
    /// Rename a note
    Rename(rename::RenameArgs),
    /// Add or remove tags
    Tag(tag::TagArgs),
    /// Star or unstar a note
    Star(flag::FlagArgs),
    /// Bookmark or unbookmark a note
    Bookmark(flag::FlagArgs),
    /// Offer a note to the AI library (or withdraw it)
    Library(flag::FlagArgs),
    /// Delete a note
    Delete(delete::DeleteArgs),
    /// Ask the assistant to continue a note
    Ask(ask::AskArgs),
    /// Download a note as a text file
    Export(export::ExportArgs),
    /// Create a note from a text file
    Import(import::ImportArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::New(args) => new::run(args),
        Command::Show(args) => show::run(args),
        Command::Append(args) => append::run(args),
        Command::Rename(args) => rename::run(args),
        Command::Tag(args) => tag::run(args),
        Command::Star(args) => flag::run(args, flag::Flag::Star),
        Command::Bookmark(args) => flag::run(args, flag::Flag::Bookmark),
        Command::Library(args) => flag::run(args, flag::Flag::Library),
        Command::Delete(args) => delete::run(args),
        Command::Ask(args) => ask::run(args),
        Command::Export(args) => export::run(args),
        Command::Import(args) => import::run(args),
    }
}

/// Run `work` on a fresh current-thread runtime and print its result.
fn execute<T, Fut>(json: bool, work: Fut, human_fn: impl FnOnce(&T) -> String) -> anyhow::Result<()>
where
    T: Serialize,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let format = OutputFormat::detect(json);
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")
        .and_then(|runtime| runtime.block_on(work));

    match result {
        Ok(value) => {
            output::print_output(format, &value, human_fn)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}
