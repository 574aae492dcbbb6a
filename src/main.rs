use clap::{Parser, Subcommand};
use colored::Colorize;
use relearn::analysis::FailureFamily;
use relearn::commands::report::{self, ReportArgs};
use relearn::commands::run::{self, RunArgs};
use relearn::commands::ConfigOverrides;
use relearn::config::AnalysisMode;
use relearn::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "relearn")]
#[command(about = "Attempt, verify, and learn loop for coding agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Analysis mode: direct (reasoning API) or webhook
    #[arg(short, long)]
    teacher: Option<AnalysisMode>,

    /// Path to a config file (.yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Knowledge file to append rules to (default: ~/.claude/CLAUDE.md)
    #[arg(long)]
    knowledge_file: Option<PathBuf>,
}

impl From<ConfigArgs> for ConfigOverrides {
    fn from(args: ConfigArgs) -> Self {
        Self {
            config_path: args.config,
            teacher: args.teacher,
            knowledge_file: args.knowledge_file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test-driven learning loop
    ///
    /// Each attempt runs the coding agent, commits its changes, and runs the
    /// tests. Failed attempts are analyzed, a preventive rule is appended to the
    /// knowledge file, and the commit is rolled back.
    Run {
        /// Task description for the coding agent
        task: String,

        /// Project directory (must be a git repository)
        #[arg(short = 'd', long, default_value = ".")]
        project_dir: PathBuf,

        /// Maximum number of attempts
        #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
        max_retries: u32,

        /// Stop for manual review after the first failed attempt
        #[arg(long)]
        no_auto_retry: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Learn from a failure that did not come from tests
    ///
    /// Failure types: planning_error, integration_error, workflow_error,
    /// architecture_error, scope_error, config_error, other
    ReportFailure {
        /// Type of failure
        #[arg(short = 'f', long)]
        failure_type: FailureFamily,

        /// What went wrong
        #[arg(short = 'D', long)]
        description: String,

        /// What should have happened
        #[arg(short = 'C', long)]
        context: String,

        /// The task that was being attempted
        #[arg(short = 'T', long)]
        task: String,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            task,
            project_dir,
            max_retries,
            no_auto_retry,
            config,
        } => run::execute(RunArgs {
            task,
            project_dir,
            max_retries,
            auto_retry: !no_auto_retry,
            overrides: config.into(),
        }),
        Commands::ReportFailure {
            failure_type,
            description,
            context,
            task,
            config,
        } => report::execute(ReportArgs {
            kind: failure_type,
            description,
            context,
            task,
            overrides: config.into(),
        }),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
