use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "appforge")]
#[command(about = "appforge CLI - generate React apps from prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate or revise an app from a prompt
    Generate {
        /// The prompt describing the app (or the revision)
        prompt: String,
        /// Model identifier (defaults to the catalog default)
        #[arg(long)]
        model: Option<String>,
        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
        /// Attach an image file to this turn (vision models only)
        #[arg(long)]
        image: Option<String>,
        /// Write the generated component to a file instead of stdout
        #[arg(long)]
        out: Option<String>,
        /// One-off API key for this turn (also unblocks a gated session)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List the supported models
    Models,
    /// Published apps
    Apps {
        #[command(subcommand)]
        action: AppsAction,
    },
    /// Publish the currently displayed app of a session
    Publish {
        /// Session whose artifact to publish
        session: String,
        /// Owner recorded on the published app
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Manage configuration and the stored credential
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AppsAction {
    /// List apps published by a user
    List {
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Print one published app
    Show { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Store the provider API key
    SetKey { api_key: String },
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            prompt,
            model,
            session,
            image,
            out,
            api_key,
        } => {
            commands::generate::run(commands::generate::GenerateArgs {
                prompt,
                model,
                session,
                image,
                out,
                api_key,
            })
            .await?
        }
        Commands::Models => commands::models::list()?,
        Commands::Apps { action } => match action {
            AppsAction::List { user } => commands::apps::list(&user).await?,
            AppsAction::Show { id } => commands::apps::show(&id).await?,
        },
        Commands::Publish { session, user } => commands::apps::publish(&session, &user).await?,
        Commands::Config { action } => match action {
            ConfigAction::SetKey { api_key } => commands::config::set_key(&api_key)?,
            ConfigAction::Show => commands::config::show()?,
        },
    }

    Ok(())
}
