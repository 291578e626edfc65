use std::process::ExitCode;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, Subcommand};
use serde_json::json;

mod config;
mod extract;
mod models;
mod plot;
mod reviews;
mod wiki;

#[cfg(test)]
mod test_support;

use config::{ReviewConfig, WikiConfig};
use models::{PlotRequest, PlotResponse};
use reviews::ReviewGenerator;
use wiki::WikiClient;

#[derive(Parser, Debug)]
#[command(name = "movie-plot-fetcher")]
#[command(about = "Look up a movie's plot on Wikipedia, or generate sample reviews")]
#[command(version)]
struct Cli {
    /// Encyclopedia API endpoint (defaults to MOVIE_PLOT_API_URL or en.wikipedia.org)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// User-Agent sent with every encyclopedia request
    #[arg(long, global = true)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the overview and plot of a movie
    Plot {
        #[arg(default_value = "Nightmare before Christmas")]
        movie: String,
    },
    /// List the ranked search candidates for a title
    Search { movie: String },
    /// Serve the plot lookup over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,
    },
    /// Generate CSV reviews for two imaginary TVs
    Reviews {
        #[arg(long, default_value_t = reviews::DEFAULT_NUM_REVIEWS)]
        num_reviews: u32,
        /// Overrides OPENAI_API_KEY
        #[arg(long)]
        api_key: Option<String>,
        /// Overrides OPENAI_API_BASE
        #[arg(long)]
        api_base: Option<String>,
        #[arg(long, default_value = config::DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Reviews {
            num_reviews,
            api_key,
            api_base,
            model,
        } => {
            let mut config = ReviewConfig::from_env(api_key, api_base)?;
            config.model = model;
            let generator = ReviewGenerator::new(config)?;
            println!("{}", generator.generate(num_reviews).await?);
        }
        Command::Plot { movie } => {
            let client = wiki_client(cli.endpoint, cli.user_agent)?;
            println!("{}", plot::get_movie_plot(&client, &movie).await);
        }
        Command::Search { movie } => {
            let client = wiki_client(cli.endpoint, cli.user_agent)?;
            for (rank, result) in client.search(&movie).await?.iter().enumerate() {
                match &result.snippet {
                    Some(snippet) => println!("{}. {} - {}", rank + 1, result.title, snippet),
                    None => println!("{}. {}", rank + 1, result.title),
                }
            }
        }
        Command::Serve { addr } => {
            let client = wiki_client(cli.endpoint, cli.user_agent)?;
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(
                endpoint = %client.config().endpoint,
                "listening on {}",
                listener.local_addr()?
            );
            axum::serve(listener, router(client)).await?;
        }
    }
    Ok(())
}

fn wiki_client(
    endpoint: Option<String>,
    user_agent: Option<String>,
) -> Result<WikiClient, Box<dyn std::error::Error>> {
    let mut config = WikiConfig::from_env()?;
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(&endpoint)?;
    }
    if let Some(user_agent) = user_agent {
        config = config.with_user_agent(user_agent);
    }
    tracing::debug!(endpoint = %config.endpoint, "using encyclopedia endpoint");
    Ok(WikiClient::new(config)?)
}

fn router(client: WikiClient) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plot", post(plot_endpoint))
        .with_state(client)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn plot_endpoint(State(client): State<WikiClient>, Json(req): Json<PlotRequest>) -> Response {
    let movie = req.movie.trim();
    if movie.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "movie must not be empty"})),
        )
            .into_response();
    }

    let outcome = plot::find_movie_plot(&client, movie).await;
    let response = PlotResponse {
        movie: movie.to_string(),
        found: outcome.is_found(),
        result: outcome.to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}
