use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use lcov_reporter::config::{FileConfig, Inputs, Options};
use lcov_reporter::github::RunContext;
use lcov_reporter::{logging, Reporter};

#[derive(Parser)]
#[command(name = "lcov-reporter")]
#[command(about = "Render an LCOV coverage report, compare it with a baseline and publish it")]
#[command(version)]
struct Cli {
    /// Optional TOML file with the same keys as the flags below
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token used for comments, changed files and cleanup
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Directory the report paths are relative to (default: ./)
    #[arg(long, env = "INPUT_WORKING_DIRECTORY")]
    working_directory: Option<String>,

    /// LCOV file for the current revision (default: ./coverage/lcov.info)
    #[arg(long, env = "INPUT_LCOV_FILE")]
    lcov_file: Option<String>,

    /// LCOV file for the baseline revision
    #[arg(long, env = "INPUT_LCOV_BASE")]
    lcov_base: Option<String>,

    /// Output path for the `file` sink (default: ./coverage/coverage-report.md)
    #[arg(long, env = "INPUT_SAVE_FILE")]
    save_file: Option<String>,

    /// Only list files changed by the revision (true/false)
    #[arg(long, env = "INPUT_FILTER_CHANGED_FILES")]
    filter_changed_files: Option<String>,

    /// Remove earlier reports before posting (true/false)
    #[arg(long, env = "INPUT_DELETE_OLD_COMMENTS")]
    delete_old_comments: Option<String>,

    /// comment, job-summary or file (default: comment)
    #[arg(long, env = "INPUT_POST_TO")]
    post_to: Option<String>,

    /// Report heading
    #[arg(long, env = "INPUT_TITLE")]
    title: Option<String>,

    /// Include the branch column (true/false)
    #[arg(long, env = "INPUT_SHOW_BRANCHES")]
    show_branches: Option<String>,

    /// Include the function column (true/false)
    #[arg(long, env = "INPUT_SHOW_FUNCTIONS")]
    show_functions: Option<String>,

    /// Include the uncovered lines column (true/false)
    #[arg(long, env = "INPUT_SHOW_UNCOVERED")]
    show_uncovered: Option<String>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn inputs(&self) -> Inputs {
        Inputs {
            github_token: self.github_token.clone(),
            working_directory: self.working_directory.clone(),
            lcov_file: self.lcov_file.clone(),
            lcov_base: self.lcov_base.clone(),
            save_file: self.save_file.clone(),
            filter_changed_files: self.filter_changed_files.clone(),
            delete_old_comments: self.delete_old_comments.clone(),
            post_to: self.post_to.clone(),
            title: self.title.clone(),
            show_branches: self.show_branches.clone(),
            show_functions: self.show_functions.clone(),
            show_uncovered: self.show_uncovered.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run(cli: Cli) -> Result<()> {
    let file = match cli.config {
        Some(ref path) => FileConfig::load(path)
            .with_context(|| format!("Could not load {}", path.display()))?,
        None => FileConfig::default(),
    };

    let options = Options::resolve(cli.inputs(), file)?;
    let context = RunContext::from_env().context("Could not read the GitHub Actions environment")?;

    let outcome = Reporter::new(&options, &context).run().await?;
    log::debug!("Run finished: {:?}", outcome);

    Ok(())
}
