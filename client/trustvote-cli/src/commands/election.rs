use std::io::Write;

use anyhow::Context;
use clap::{Args, Subcommand};
use trustvote_client::countdown::CountdownTicker;
use trustvote_client::fetcher::{ElectionListView, ListState, Role};
use trustvote_client::results::ResultViewer;
use trustvote_client::scope::{ScopeToken, ViewScope};
use trustvote_client::slider::Slider;
use trustvote_client::top_vote::TopVoteBoard;
use trustvote_client::voting::VotingController;
use trustvote_client::{ElectionStatus, Route};
use trustvote_interface::{CandidateId, Clock, ElectionId};

use crate::app::App;
use crate::render;

#[derive(Args)]
pub struct PageArgs {
    /// Dashboard page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Subcommand)]
pub enum ElectionCommands {
    /// Vote for a candidate.
    Vote {
        /// The election identifier.
        election: u64,
        /// The candidate identifier, as listed on the ballot.
        candidate: u64,
    },
    /// Show vote counts and participation of an election.
    Result {
        /// The election identifier.
        election: u64,
    },
    /// Show the most-voted active elections.
    Top,
    /// Follow the countdown of an active election until it ends.
    Watch {
        /// The election identifier.
        election: u64,
    },
}

impl ElectionCommands {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        match *self {
            ElectionCommands::Vote {
                election,
                candidate,
            } => vote(app, ElectionId(election), CandidateId(candidate)).await,
            ElectionCommands::Result { election } => result(app, ElectionId(election)).await,
            ElectionCommands::Top => top(app).await,
            ElectionCommands::Watch { election } => watch(app, ElectionId(election)).await,
        }
    }
}

pub(super) async fn show_dashboard(app: &App, role: Role, page: &PageArgs) -> anyhow::Result<()> {
    let scope = ViewScope::new();
    let mut view = ElectionListView::new(app.reader()?, role, scope.token());
    let elections = match view.on_session_change(app.session()).await {
        ListState::Disconnected => {
            anyhow::bail!("No wallet connected; set TRUSTVOTE_PRIVATE_KEY to list your elections")
        }
        ListState::Failed(error) => {
            return Err(error.clone()).context("Failed to fetch elections");
        }
        ListState::Ready(elections) => elections,
    };

    let mut slider = Slider::new(app.config.display.page_size);
    for _ in 1..page.page {
        slider.next(elections.len());
    }
    render::election_page(elections, &slider, app.clock.now());
    Ok(())
}

async fn vote(app: &App, election: ElectionId, candidate: CandidateId) -> anyhow::Result<()> {
    let writer = app.writer()?;
    let controller = VotingController::new(
        writer.clone(),
        writer,
        app.storage()?,
        app.clock.clone(),
        app.placeholder_url(),
        ScopeToken::default(),
    );
    let ballot = controller.load(election).await?;
    render::ballot(&ballot, app.clock.now());
    anyhow::ensure!(
        ballot.candidates.iter().any(|card| card.candidate.id == candidate),
        "Election {election} has no candidate {candidate}"
    );

    let Route::Result(election) = controller.cast_vote(&ballot.election, candidate).await? else {
        anyhow::bail!("Vote was not confirmed");
    };
    println!("Vote recorded.");
    result(app, election).await
}

async fn result(app: &App, election: ElectionId) -> anyhow::Result<()> {
    let viewer = ResultViewer::new(
        app.reader()?,
        app.storage()?,
        app.clock.clone(),
        app.placeholder_url(),
        ScopeToken::default(),
    );
    let result = viewer.load(election).await?;
    render::result(&result, app.clock.now());
    Ok(())
}

async fn top(app: &App) -> anyhow::Result<()> {
    let board = TopVoteBoard::new(app.reader()?, app.clock.clone(), ScopeToken::default());
    let entries = board.load().await?;
    let routes = board.routes(app.viewer(), &entries).await?;
    let rows: Vec<_> = entries
        .into_iter()
        .zip(routes)
        .map(|(entry, route)| match route {
            Route::Vote(_) => (entry, "vote"),
            Route::Result(_) => (entry, "result"),
        })
        .collect();
    render::top_vote(&rows);
    Ok(())
}

async fn watch(app: &App, election: ElectionId) -> anyhow::Result<()> {
    let scope = ViewScope::new();
    let viewer = ResultViewer::new(
        app.reader()?,
        app.storage()?,
        app.clock.clone(),
        app.placeholder_url(),
        scope.token(),
    );
    let result = viewer.load(election).await?;
    let Some(target) = result.countdown_target() else {
        println!("{}: {}", result.election.title, result.status);
        return Ok(());
    };

    let mut ticker = CountdownTicker::new(app.clock.clone());
    ticker.retarget(vec![target])?;
    let mut countdowns = ticker.subscribe();
    let mut stdout = std::io::stdout();
    loop {
        let Some(countdown) = countdowns.borrow_and_update().first().cloned() else {
            break;
        };
        write!(stdout, "\r{}: {}", result.election.title, countdown.label())?;
        stdout.flush()?;
        if countdown.status != ElectionStatus::Active || countdown.remaining_secs == 0 {
            break;
        }
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            changed = countdowns.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    writeln!(stdout)?;
    ticker.stop();
    Ok(())
}
