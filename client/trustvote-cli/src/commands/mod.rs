//! Subcommands of the `trustvote` binary.
pub mod election;
mod organizer;
mod voter;

use clap::Subcommand;

use crate::app::App;
use election::ElectionCommands;
pub use organizer::OrganizerCommands;
pub use voter::VoterCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Elections created by the configured wallet.
    #[command(subcommand)]
    Organizer(OrganizerCommands),
    /// Elections the configured wallet may vote in.
    #[command(subcommand)]
    Voter(VoterCommands),
    #[command(flatten)]
    Election(ElectionCommands),
}

impl Commands {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        match self {
            Commands::Organizer(command) => command.run(app).await,
            Commands::Voter(command) => command.run(app).await,
            Commands::Election(command) => command.run(app).await,
        }
    }
}
