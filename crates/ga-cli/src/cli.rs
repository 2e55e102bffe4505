//! Command-line parsing and dispatch.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ga_cli_core::api::{RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
use ga_cli_core::config::CredentialStore;
use url::Url;

use crate::commands::properties::CreateProperty;
use crate::commands::{accounts, config, datastreams, properties};
use crate::context::CommandContext;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_INDUSTRY: &str = "OTHER";

#[derive(Parser, Debug)]
#[command(
    name = "ga-cli",
    version,
    about = "Google Analytics CLI - Manage GA4 from the command line"
)]
pub struct Cli {
    /// Path to service account credentials file
    #[arg(long, global = true, env = "GOOGLE_APPLICATION_CREDENTIALS", value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "GA_CLI_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// Attempts made for transient API failures
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    #[arg(
        long,
        global = true,
        hide = true,
        env = "GA_CLI_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_BASE_URL
    )]
    pub api_url: Url,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage Google Analytics accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// Manage Google Analytics properties
    #[command(subcommand)]
    Properties(PropertiesCommand),
    /// Manage data streams
    #[command(subcommand)]
    Datastreams(DataStreamsCommand),
    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct FormatArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    /// List all accounts
    List(FormatArgs),
    /// Get account details
    Get {
        account_id: String,
        #[command(flatten)]
        output: FormatArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum PropertiesCommand {
    /// List properties for an account
    List {
        account_id: String,
        #[command(flatten)]
        output: FormatArgs,
    },
    /// Get property details
    Get {
        property_id: String,
        #[command(flatten)]
        output: FormatArgs,
    },
    /// Create a new GA4 property
    Create {
        account_id: String,
        /// Display name for the property
        #[arg(long)]
        name: String,
        /// Property timezone
        #[arg(long, default_value = DEFAULT_TIMEZONE)]
        timezone: String,
        /// Property currency code (e.g., USD, EUR)
        #[arg(long, default_value = DEFAULT_CURRENCY)]
        currency: String,
        /// Industry category
        #[arg(long, default_value = DEFAULT_INDUSTRY)]
        industry: String,
    },
    /// Delete a property
    Delete {
        property_id: String,
        /// Confirm the action without prompting
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataStreamsCommand {
    /// List data streams for a property
    List {
        property_id: String,
        #[command(flatten)]
        output: FormatArgs,
    },
    /// Get data stream details including measurement ID
    Get {
        property_id: String,
        stream_id: String,
        #[command(flatten)]
        output: FormatArgs,
    },
    /// Create a new web data stream
    Create {
        property_id: String,
        /// Display name for the data stream
        #[arg(long)]
        name: String,
        /// Website URL
        #[arg(long)]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize ga-cli with credentials (uses --credentials, or prompts)
    Init,
    /// Show current configuration
    Show,
}

fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Ask a question on stdout and read one trimmed line from stdin
fn prompt(question: &str) -> CliResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> CliResult<bool> {
    let answer = prompt(&format!("{question} [y/N]: "))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Build the invocation context from global options
fn context(cli: &Cli) -> CliResult<CommandContext> {
    let store = CredentialStore::from_home()?.with_override(cli.credentials.clone());
    let retry = RetryPolicy::new(cli.max_retries, DEFAULT_BACKOFF_FACTOR);
    Ok(CommandContext::new(
        store,
        cli.api_url.as_str(),
        Duration::from_secs(cli.timeout),
        retry,
    ))
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let mut ctx = context(&cli)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Accounts(command) => match command {
            AccountsCommand::List(output) => accounts::list(&mut ctx, output.format, &mut out).await,
            AccountsCommand::Get { account_id, output } => {
                accounts::get(&mut ctx, &account_id, output.format, &mut out).await
            }
        },
        Command::Properties(command) => match command {
            PropertiesCommand::List { account_id, output } => {
                properties::list(&mut ctx, &account_id, output.format, &mut out).await
            }
            PropertiesCommand::Get {
                property_id,
                output,
            } => properties::get(&mut ctx, &property_id, output.format, &mut out).await,
            PropertiesCommand::Create {
                account_id,
                name,
                timezone,
                currency,
                industry,
            } => {
                let args = CreateProperty {
                    account_id,
                    name,
                    timezone,
                    currency,
                    industry,
                };
                properties::create(&mut ctx, &args, &mut out).await
            }
            PropertiesCommand::Delete { property_id, yes } => {
                if !yes && !confirm("Are you sure you want to delete this property?")? {
                    writeln!(out, "Aborted.")?;
                    return Ok(());
                }
                properties::delete(&mut ctx, &property_id, &mut out).await
            }
        },
        Command::Datastreams(command) => match command {
            DataStreamsCommand::List {
                property_id,
                output,
            } => datastreams::list(&mut ctx, &property_id, output.format, &mut out).await,
            DataStreamsCommand::Get {
                property_id,
                stream_id,
                output,
            } => {
                datastreams::get(&mut ctx, &property_id, &stream_id, output.format, &mut out).await
            }
            DataStreamsCommand::Create {
                property_id,
                name,
                url,
            } => datastreams::create(&mut ctx, &property_id, &name, &url, &mut out).await,
        },
        Command::Config(command) => match command {
            ConfigCommand::Init => {
                let credentials = match &cli.credentials {
                    Some(path) => path.to_string_lossy().into_owned(),
                    None => prompt("Path to service account JSON: ")?,
                };
                if credentials.is_empty() {
                    return Err(CliError::validation("A credentials path is required"));
                }
                config::init(&mut ctx, &credentials, &mut out).await
            }
            ConfigCommand::Show => config::show(ctx.store(), &mut out),
        },
    }
}
