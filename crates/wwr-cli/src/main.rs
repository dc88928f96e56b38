//! wwr - White Water Reporting issue tracker
//!
//! Works directly on the tracker files in the configured data directory. Do
//! not point it at a directory a running `wwr-api` is serving.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "wwr")]
#[command(about = "White Water Reporting issue tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(long, global = true, env = "WWR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the tracker files (overrides the config)
    #[arg(long, global = true, env = "WWR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// User to author issues and comments as
    #[arg(long = "as", global = true, env = "WWR_USER")]
    as_user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage issues
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },

    /// Comment on issues
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum IssueCommands {
    /// Create a new issue
    Create {
        /// Issue title
        title: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Operating system the issue was seen on
        #[arg(long, default_value = "")]
        os: String,

        /// Issue type (free text, e.g. Bug, Feature)
        #[arg(short = 't', long, default_value = "")]
        issue_type: String,

        /// User to assign
        #[arg(short, long, default_value = "")]
        assign: String,
    },

    /// List issue titles
    List,

    /// Show issue details
    Show {
        /// Issue title
        title: String,
    },

    /// Delete an issue and its comments
    Delete {
        /// Issue title
        title: String,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Add a comment to an issue
    Add {
        /// Issue title
        title: String,

        /// Comment text
        text: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    Create {
        /// User name
        name: String,
    },

    /// Check that a user exists
    Show {
        /// User name
        name: String,
    },

    /// List all users
    List,

    /// Remove a user; their issues and comments stay
    Delete {
        /// User name
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Runs before the config is loaded, since the file may not exist yet
    if let Commands::Config {
        command: Some(ConfigCommands::Init { force }),
    } = &cli.command
    {
        return commands::config_init(cli.config.as_deref(), *force);
    }

    let ctx = Context::new(cli.config, cli.data_dir, cli.as_user, cli.json)?;

    match cli.command {
        Commands::Issue { command } => match command {
            IssueCommands::Create {
                title,
                description,
                os,
                issue_type,
                assign,
            } => commands::issue_create(&ctx, title, description, os, issue_type, assign),
            IssueCommands::List => commands::issue_list(&ctx),
            IssueCommands::Show { title } => commands::issue_show(&ctx, &title),
            IssueCommands::Delete { title } => commands::issue_delete(&ctx, &title),
        },
        Commands::Comment { command } => match command {
            CommentCommands::Add { title, text } => commands::comment_add(&ctx, &title, &text),
        },
        Commands::User { command } => match command {
            UserCommands::Create { name } => commands::user_create(&ctx, &name),
            UserCommands::Show { name } => commands::user_show(&ctx, &name),
            UserCommands::List => commands::user_list(&ctx),
            UserCommands::Delete { name } => commands::user_delete(&ctx, &name),
        },
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
            Some(ConfigCommands::Init { force }) => {
                commands::config_init(ctx.config_path(), force)
            }
        },
    }
}
