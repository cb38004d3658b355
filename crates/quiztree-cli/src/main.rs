//! quiztree CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quiztree", version, about = "Hierarchical test-question tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a questions file for import and submit errors
    Validate {
        /// Questions JSON file
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the question hierarchy
    Tree {
        /// Questions JSON file
        #[arg(long)]
        file: PathBuf,
    },

    /// Normalize a questions file and write a dated export
    Export {
        /// Questions JSON file
        #[arg(long)]
        file: PathBuf,

        /// Output directory (default: export_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade student responses against the answer key
    Grade {
        /// Questions JSON file
        #[arg(long)]
        file: PathBuf,

        /// Responses JSON file (object keyed by question id)
        #[arg(long)]
        responses: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Upload a file and link it from a question
    Attach {
        /// Questions JSON file, rewritten in place
        #[arg(long)]
        file: PathBuf,

        /// Id of the question to attach to
        #[arg(long)]
        question: String,

        /// File to upload
        #[arg(long)]
        attachment: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Save a questions file as a test
    Submit {
        /// Questions JSON file
        #[arg(long)]
        file: PathBuf,

        /// Test title
        #[arg(long)]
        title: String,

        /// Test description
        #[arg(long, default_value = "")]
        description: String,

        /// Due date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Time limit in minutes
        #[arg(long)]
        time_limit: Option<u32>,

        /// Update this existing test instead of creating one
        #[arg(long)]
        test_id: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example questions
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quiztree=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => commands::validate::execute(file),
        Commands::Tree { file } => commands::tree::execute(file),
        Commands::Export {
            file,
            output,
            config,
        } => commands::export::execute(file, output, config),
        Commands::Grade {
            file,
            responses,
            format,
        } => commands::grade::execute(file, responses, format),
        Commands::Attach {
            file,
            question,
            attachment,
            config,
        } => commands::attach::execute(file, question, attachment, config).await,
        Commands::Submit {
            file,
            title,
            description,
            due,
            time_limit,
            test_id,
            config,
        } => {
            commands::submit::execute(file, title, description, due, time_limit, test_id, config)
                .await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
