use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::normalize_prefix;
use crate::error::ReporterError;
use crate::report::RenderOptions;

pub const DEFAULT_LCOV_FILE: &str = "./coverage/lcov.info";
pub const DEFAULT_SAVE_FILE: &str = "./coverage/coverage-report.md";
pub const DEFAULT_WORKING_DIR: &str = "./";

/// Where the rendered report goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostTo {
    Comment,
    JobSummary,
    File,
    Unknown(String),
}

impl PostTo {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "comment" => PostTo::Comment,
            "job-summary" => PostTo::JobSummary,
            "file" => PostTo::File,
            other => PostTo::Unknown(other.to_string()),
        }
    }
}

/// Optional TOML config file; every key mirrors a CLI input
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub github_token: Option<String>,
    pub working_directory: Option<String>,
    pub lcov_file: Option<String>,
    pub lcov_base: Option<String>,
    pub save_file: Option<String>,
    pub filter_changed_files: Option<bool>,
    pub delete_old_comments: Option<bool>,
    pub post_to: Option<String>,
    pub title: Option<String>,
    pub show_branches: Option<bool>,
    pub show_functions: Option<bool>,
    pub show_uncovered: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ReporterError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReporterError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        Ok(toml::from_str(&content)?)
    }
}

/// Raw inputs as given on the command line or through `INPUT_*` variables.
/// Booleans are strings, read the way workflow inputs are: only `true` is true.
#[derive(Debug, Default, Clone)]
pub struct Inputs {
    pub github_token: Option<String>,
    pub working_directory: Option<String>,
    pub lcov_file: Option<String>,
    pub lcov_base: Option<String>,
    pub save_file: Option<String>,
    pub filter_changed_files: Option<String>,
    pub delete_old_comments: Option<String>,
    pub post_to: Option<String>,
    pub title: Option<String>,
    pub show_branches: Option<String>,
    pub show_functions: Option<String>,
    pub show_uncovered: Option<String>,
}

/// Resolved run options, built once at startup
#[derive(Debug, Clone)]
pub struct Options {
    pub github_token: Option<String>,
    pub working_directory: String,
    pub lcov_file: PathBuf,
    pub lcov_base: Option<PathBuf>,
    pub save_file: PathBuf,
    pub filter_changed_files: bool,
    pub delete_old_comments: bool,
    pub post_to: PostTo,
    pub title: String,
    pub show_branches: bool,
    pub show_functions: bool,
    pub show_uncovered: bool,
}

pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn expand(path: &str) -> Result<String, ReporterError> {
    shellexpand::full(path)
        .map(|p| p.into_owned())
        .map_err(|e| ReporterError::Config(format!("cannot expand '{}': {}", path, e)))
}

impl Options {
    /// Merge CLI inputs over the config file over defaults
    pub fn resolve(inputs: Inputs, file: FileConfig) -> Result<Self, ReporterError> {
        let working_directory = expand(
            &non_empty(inputs.working_directory)
                .or(file.working_directory)
                .unwrap_or_else(|| DEFAULT_WORKING_DIR.to_string()),
        )?;

        let lcov_file = non_empty(inputs.lcov_file)
            .or(file.lcov_file)
            .unwrap_or_else(|| DEFAULT_LCOV_FILE.to_string());
        let save_file = non_empty(inputs.save_file)
            .or(file.save_file)
            .unwrap_or_else(|| DEFAULT_SAVE_FILE.to_string());
        let lcov_base = non_empty(inputs.lcov_base).or(file.lcov_base);

        let flag = |input: Option<String>, from_file: Option<bool>, default: bool| {
            non_empty(input)
                .map(|v| parse_flag(&v))
                .or(from_file)
                .unwrap_or(default)
        };

        Ok(Self {
            github_token: non_empty(inputs.github_token).or(file.github_token),
            lcov_file: Path::new(&working_directory).join(expand(&lcov_file)?),
            // the baseline path is taken as given, not relative to the working directory
            lcov_base: lcov_base.map(|p| expand(&p).map(PathBuf::from)).transpose()?,
            save_file: Path::new(&working_directory).join(expand(&save_file)?),
            filter_changed_files: flag(
                inputs.filter_changed_files,
                file.filter_changed_files,
                false,
            ),
            delete_old_comments: flag(inputs.delete_old_comments, file.delete_old_comments, false),
            post_to: PostTo::parse(
                &non_empty(inputs.post_to)
                    .or(file.post_to)
                    .unwrap_or_else(|| "comment".to_string()),
            ),
            title: non_empty(inputs.title).or(file.title).unwrap_or_default(),
            show_branches: flag(inputs.show_branches, file.show_branches, true),
            show_functions: flag(inputs.show_functions, file.show_functions, true),
            show_uncovered: flag(inputs.show_uncovered, file.show_uncovered, true),
            working_directory,
        })
    }

    /// Prefix stripped from every reported path
    pub fn path_prefix(&self) -> String {
        normalize_prefix(&self.working_directory)
    }

    pub fn render_options(&self, subtitle: Option<String>) -> RenderOptions {
        let mut render = RenderOptions {
            subtitle,
            show_branches: self.show_branches,
            show_functions: self.show_functions,
            show_uncovered: self.show_uncovered,
            ..Default::default()
        };
        if !self.title.trim().is_empty() {
            render.title = self.title.clone();
        }
        render
    }
}
