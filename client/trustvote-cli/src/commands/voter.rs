use clap::Subcommand;
use trustvote_client::fetcher::Role;

use super::election::{show_dashboard, PageArgs};
use crate::app::App;

#[derive(Subcommand)]
pub enum VoterCommands {
    /// List the elections you are whitelisted for.
    List(PageArgs),
}

impl VoterCommands {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        match self {
            VoterCommands::List(page) => show_dashboard(app, Role::Voter, page).await,
        }
    }
}
