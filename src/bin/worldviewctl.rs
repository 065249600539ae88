//! Terminal front-end for the worldview dashboard

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldview_dashboard::client::display::{
    render_attacks, render_comparison, render_counters, render_detail, render_state, render_view,
    render_worldview_page,
};
use worldview_dashboard::client::{
    ClientError, CounterArgumentApi, CounterArgumentPanel, DashboardClient, ListParams, LocalIdentityStore,
    PollHandle, ViewKind, ViewState,
};
use worldview_dashboard::model::{Config, CounterArgumentDraft, SourceType, Trend, VoteDirection};
use worldview_dashboard::store::SortOrder;

#[derive(Parser)]
#[command(name = "worldviewctl", about = "Browse worldviews and discuss their patterns")]
struct Cli {
    /// Dashboard service URL
    #[arg(long, env = "WORLDVIEW_API_URL", default_value = "http://127.0.0.1:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List worldviews
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long, value_parser = parse_order)]
        order: Option<SortOrder>,
        #[arg(long, value_parser = parse_trend)]
        trend: Option<Trend>,
        #[arg(long)]
        min_strength: Option<f64>,
        #[arg(long)]
        archived: Option<bool>,
    },
    /// Show one worldview with its logic chain and interpretation gaps
    Show { id: String },
    /// Print an aggregated view once
    View {
        #[arg(value_enum)]
        kind: ViewKind,
    },
    /// Reprint an aggregated view on every refresh until interrupted
    Watch {
        #[arg(value_enum)]
        kind: ViewKind,
        /// Seconds between refreshes (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List attack patterns with their counter-argument counts
    Attacks,
    /// List attacks similar to one attack
    Related { attack_id: String },
    /// List counter-arguments for a pattern
    Counters { pattern_id: String },
    /// Submit a counter-argument for a pattern
    Submit {
        pattern_id: String,
        content: String,
        #[arg(long, default_value = "text")]
        source_type: SourceType,
        #[arg(long)]
        source_url: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Vote on a counter-argument; repeating the same vote withdraws it
    Vote {
        pattern_id: String,
        counter_id: String,
        #[arg(long, conflicts_with = "down")]
        up: bool,
        #[arg(long)]
        down: bool,
    },
}

fn parse_order(raw: &str) -> Result<SortOrder, String> {
    match raw.trim().to_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        other => Err(format!("order must be asc or desc, got {}", other)),
    }
}

fn parse_trend(raw: &str) -> Result<Trend, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .map_err(|_| format!("unknown trend: {}", raw))
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let client = DashboardClient::new(&cli.api_url)?;

    match cli.command {
        Command::List {
            limit,
            offset,
            sort_by,
            order,
            trend,
            min_strength,
            archived,
        } => {
            let params = ListParams {
                limit,
                offset,
                sort_by,
                order,
                trend,
                min_strength,
                archived,
            };
            let page = client.list_worldviews(&params).await?;
            print!("{}", render_worldview_page(&page));
        }
        Command::Show { id } => {
            let (detail, comparison) =
                futures::join!(client.worldview(&id), client.comparison(&id));
            print!("{}", render_detail(&detail?));
            print!("{}", render_comparison(&comparison?));
        }
        Command::View { kind } => {
            let view = client.view(kind).await?;
            print!("{}", render_view(kind, &view));
        }
        Command::Watch { kind, interval } => {
            let config = Config::from_env();
            let interval = interval
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.refresh.interval());

            let poll = PollHandle::spawn(interval, move || {
                let client = client.clone();
                async move {
                    let state = ViewState::from_result(client.view(kind).await, |_| false);
                    print!("{}", render_state(&state, |view| render_view(kind, view)));
                    println!("--");
                }
            });

            let _ = tokio::signal::ctrl_c().await;
            drop(poll);
        }
        Command::Attacks => {
            let attacks = client.attacks().await?;
            print!("{}", render_attacks(&attacks));
        }
        Command::Related { attack_id } => {
            let related = client.related(&attack_id).await?;
            if related.is_empty() {
                println!("No related attacks.");
            }
            print!("{}", render_attacks(&related));
        }
        Command::Counters { pattern_id } => {
            let mut panel =
                CounterArgumentPanel::new(client, LocalIdentityStore::from_env()?, pattern_id);
            panel.refresh().await;
            print!(
                "{}",
                render_state(panel.counters(), |counters| render_counters(counters, |id| {
                    panel.my_vote(id)
                }))
            );
        }
        Command::Submit {
            pattern_id,
            content,
            source_type,
            source_url,
            author,
        } => {
            let mut panel =
                CounterArgumentPanel::new(client, LocalIdentityStore::from_env()?, pattern_id);
            panel.draft = CounterArgumentDraft {
                content,
                source_type,
                source_url,
                author_name: author,
            };
            let created = panel.submit().await?;
            println!("Submitted {}", created.id);
        }
        Command::Vote {
            pattern_id,
            counter_id,
            up,
            down,
        } => {
            let direction = match (up, down) {
                (_, true) => VoteDirection::Down,
                _ => VoteDirection::Up,
            };
            let mut panel =
                CounterArgumentPanel::new(client, LocalIdentityStore::from_env()?, pattern_id);
            let action = panel.vote(&counter_id, direction).await?;
            println!("Vote {:?}", action);
        }
    }

    Ok(())
}
