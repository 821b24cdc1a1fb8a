use ballot_console::api::ApiClient;
use ballot_console::config::Config;
use ballot_console::dashboard::load_dashboard;
use ballot_console::forms::{CandidateForm, LoginForm, RegistrationForm};
use ballot_console::listview::{self, ListView, LoadState, SharedListView, SortDirection};
use ballot_console::manage::{CandidateRoster, Notice, VoterRoster};
use ballot_console::models::{Ballot, BallotField, Record, Vote, VoteField, Voter, VoterField};
use ballot_console::render::{self, Tabular};
use ballot_console::session::{Access, AuthGate, MemorySessionStore, SessionStore};
use ballot_console::tally;
use ballot_console::tasks::refresher::auto_refresh_until;
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "ballot-console", version, about = "Election administration console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Registered voter, candidate and vote counts
    Dashboard,
    /// List published ballots
    Ballots {
        #[command(flatten)]
        list: ListArgs,
        /// Ballot id substring passed to the backend
        #[arg(long)]
        ballot_id: Option<String>,
        /// Keep refreshing every N seconds
        #[arg(long)]
        watch: Option<u64>,
    },
    /// List cast votes
    Votes {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show election results
    Tally,
    /// List candidates
    Candidates {
        #[arg(long)]
        search: Option<String>,
        /// Party name, or "All"
        #[arg(long)]
        party: Option<String>,
    },
    /// Register a candidate
    AddCandidate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        party: String,
    },
    /// Delete a candidate by id
    DeleteCandidate { id: String },
    /// List eligible voters
    Voters {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Disable a voter by NIC
    DisableVoter { nic: String },
    /// Log in and print the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session token
    Logout,
    /// Register an administrator account
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        nic: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "admin")]
        role: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive search term
    #[arg(long)]
    search: Option<String>,
    /// Field to sort by
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Record ids whose masked field should be shown
    #[arg(long = "reveal")]
    reveal: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = Config::from_env()?;
    let session: Arc<dyn SessionStore> = Arc::new(match &config.session_token {
        Some(token) => MemorySessionStore::with_token(token.clone()),
        None => MemorySessionStore::new(),
    });
    let gate = AuthGate::new(session.clone());
    let api = Arc::new(ApiClient::new(&config, session)?);
    info!("Using backend at {}", api.base_url());

    match cli.command {
        Command::Ballots { list, ballot_id, watch } => {
            let view = mount::<Ballot>(&config, &list)?;
            match watch {
                Some(secs) => {
                    auto_refresh_until(
                        view,
                        api,
                        ballot_id,
                        Duration::from_secs(secs.max(1)),
                        |v| println!("{}\n", render::render_list(v)),
                        interrupted(),
                    )
                    .await;
                    Ok(())
                }
                None => show_list(view, api, ballot_id, &list).await,
            }
        }
        Command::Dashboard => {
            let dashboard = load_dashboard(api.as_ref()).await;
            println!("{}", render::render_dashboard(&dashboard));
            if dashboard.has_failures() {
                return Err("some dashboard counts could not be loaded".into());
            }
            Ok(())
        }
        Command::Votes { list } => {
            let view = mount::<Vote>(&config, &list)?;
            show_list(view, api, None, &list).await
        }
        Command::Voters { list } => {
            require(&gate, "/voters")?;
            let view = mount::<Voter>(&config, &list)?;
            show_list(view, api, None, &list).await
        }
        Command::Tally => {
            let entries = api.fetch_tally().await.map_err(|e| e.user_message("Failed to load results"))?;
            println!("{}", render::render_tally(&tally::calculate_results(&entries)));
            Ok(())
        }
        Command::Candidates { search, party } => {
            require(&gate, "/candidates/manage")?;
            let candidates = api
                .fetch_candidates()
                .await
                .map_err(|e| e.user_message("Failed to fetch candidates"))?;
            let mut roster = CandidateRoster::new(candidates);
            if let Some(term) = search {
                roster.set_search_term(term);
            }
            roster.select_party(party.as_deref());
            println!("Parties: {}", roster.parties().join(", "));
            println!("{}", render::render_records(&roster.visible(), |_| true));
            Ok(())
        }
        Command::AddCandidate { name, party } => {
            require(&gate, "/candidates/register")?;
            let mut roster = CandidateRoster::default();
            roster.register(api.as_ref(), &CandidateForm { name, party }).await;
            report(roster.notice())
        }
        Command::DeleteCandidate { id } => {
            require(&gate, "/candidates/manage")?;
            let mut roster = CandidateRoster::default();
            roster.remove(api.as_ref(), &id).await;
            report(roster.notice())
        }
        Command::DisableVoter { nic } => {
            require(&gate, "/voters/disable")?;
            let mut voters = VoterRoster::default();
            voters.disable(api.as_ref(), &nic).await;
            report(voters.notice())
        }
        Command::Login { email, password } => {
            let request = LoginForm { email, password }.validate()?;
            let response = api
                .login(&request)
                .await
                .map_err(|e| e.user_message("Invalid email or password"))?;
            match response.token {
                Some(token) => {
                    println!("SESSION_TOKEN={token}");
                    Ok(())
                }
                None => Err("Login succeeded but no token was returned".into()),
            }
        }
        Command::Logout => {
            api.logout();
            println!("Logged out. Unset SESSION_TOKEN to end the session for later commands.");
            Ok(())
        }
        Command::Register {
            full_name,
            nic,
            email,
            role,
            password,
            confirm_password,
        } => {
            let request = RegistrationForm {
                full_name,
                nic,
                email,
                role,
                password,
                confirm_password,
            }
            .validate()?;
            api.register(&request)
                .await
                .map_err(|e| e.user_message("Registration failed"))?;
            println!("Registration successful!");
            Ok(())
        }
    }
}

fn require(gate: &AuthGate, location: &str) -> Result<(), BoxError> {
    match gate.check(location) {
        Access::Granted => Ok(()),
        Access::Redirect { to, from } => Err(format!(
            "{from} requires a session. Run `ballot-console login` ({to}) and set SESSION_TOKEN"
        )
        .into()),
    }
}

fn report(notice: Option<&Notice>) -> Result<(), BoxError> {
    match notice {
        Some(notice) if notice.is_error() => Err(notice.text().into()),
        Some(notice) => {
            println!("{}", notice.text());
            Ok(())
        }
        None => Ok(()),
    }
}

// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

// Fields each list page can sort by from the command line
trait SortableFromCli: Record {
    fn parse_field(name: &str) -> Result<Self::Field, BoxError>;
}

impl SortableFromCli for Ballot {
    fn parse_field(name: &str) -> Result<BallotField, BoxError> {
        Ok(BallotField::from_str(name)?)
    }
}

impl SortableFromCli for Vote {
    fn parse_field(name: &str) -> Result<VoteField, BoxError> {
        Ok(VoteField::from_str(name)?)
    }
}

impl SortableFromCli for Voter {
    fn parse_field(name: &str) -> Result<VoterField, BoxError> {
        Ok(VoterField::from_str(name)?)
    }
}

fn mount<R: SortableFromCli>(config: &Config, args: &ListArgs) -> Result<SharedListView<R>, BoxError> {
    let mut view = ListView::<R>::new(config.page_size);
    if let Some(term) = &args.search {
        view.set_search_term(term.clone());
    }
    if let Some(name) = &args.sort {
        let field = R::parse_field(name)?;
        let wanted = if args.desc { SortDirection::Descending } else { SortDirection::Ascending };
        view.set_sort(field);
        // set_sort flips on a repeated field, so at most one more call
        if view.sort_direction() != wanted {
            view.set_sort(field);
        }
    }
    for id in &args.reveal {
        view.toggle_reveal(id);
    }
    Ok(listview::shared(view))
}

async fn show_list<R, S>(view: SharedListView<R>, source: Arc<S>, query: Option<String>, args: &ListArgs) -> Result<(), BoxError>
where
    R: Tabular,
    S: listview::RecordSource<R> + 'static,
{
    listview::spawn_refresh(view.clone(), source, query).await?;
    let mut view = view.lock().await;
    // Page is clamped against the fetched result
    view.set_page(args.page);
    println!("{}", render::render_list(&view));

    let failed_first_load = matches!(view.load_state(), LoadState::Failed { stale: false, .. });
    view.unmount();
    if failed_first_load {
        return Err(format!("could not load {}", R::NOUN).into());
    }
    Ok(())
}
