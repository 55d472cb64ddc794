//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use zhicuoti_client::AnalysisTarget;
use zhicuoti_core::DecodeMode;

/// Zhicuoti: stream AI analysis of mistaken exam problems to the terminal.
#[derive(Parser, Debug)]
#[command(name = "zhicuoti")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file.
    ///
    /// Defaults to `~/.zhicuoti/config.json`.
    #[arg(short, long, env = "ZHICUOTI_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config and API_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Access token from `zhicuoti login`.
    #[arg(long, env = "ZHICUOTI_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// How streamed bytes are decoded.
    #[arg(long, value_enum, global = true)]
    pub decode: Option<DecodeArg>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Decode mode as a CLI value.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeArg {
    PerChunk,
    Incremental,
}

impl From<DecodeArg> for DecodeMode {
    fn from(arg: DecodeArg) -> Self {
        match arg {
            DecodeArg::PerChunk => DecodeMode::PerChunk,
            DecodeArg::Incremental => DecodeMode::Incremental,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and print an access token.
    Login {
        /// Phone number used as the account name.
        #[arg(long)]
        phone: String,

        #[arg(long, env = "ZHICUOTI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the user the token belongs to.
    Me,

    /// Stream the AI solution of a problem.
    Solution {
        problem_id: String,
    },

    /// Stream the AI analysis of a subject.
    Subject {
        subject_id: String,

        /// Analyse one student (teachers only).
        #[arg(long, conflicts_with = "class")]
        student: Option<String>,

        /// Analyse a whole class (teachers only).
        #[arg(long)]
        class: Option<String>,
    },

    /// Stream the AI analysis of a knowledge tag.
    Tag {
        tag_id: String,

        /// Analyse one student (teachers only).
        #[arg(long, conflicts_with = "class")]
        student: Option<String>,

        /// Analyse a whole class (teachers only).
        #[arg(long)]
        class: Option<String>,
    },

    /// Print the effective configuration.
    Config,
}

impl Commands {
    /// The streamed endpoint this command reads, if any.
    pub fn analysis_target(&self) -> Option<AnalysisTarget> {
        match self {
            Commands::Solution { problem_id } => Some(AnalysisTarget::ProblemSolution {
                problem_id: problem_id.clone(),
            }),
            Commands::Subject {
                subject_id,
                student,
                class,
            } => Some(match (student, class) {
                (Some(user_id), _) => AnalysisTarget::StudentSubject {
                    user_id: user_id.clone(),
                    subject_id: subject_id.clone(),
                },
                (None, Some(class_id)) => AnalysisTarget::ClassSubject {
                    class_id: class_id.clone(),
                    subject_id: subject_id.clone(),
                },
                (None, None) => AnalysisTarget::MySubject {
                    subject_id: subject_id.clone(),
                },
            }),
            Commands::Tag {
                tag_id,
                student,
                class,
            } => Some(match (student, class) {
                (Some(user_id), _) => AnalysisTarget::StudentTag {
                    user_id: user_id.clone(),
                    tag_id: tag_id.clone(),
                },
                (None, Some(class_id)) => AnalysisTarget::ClassTag {
                    class_id: class_id.clone(),
                    tag_id: tag_id.clone(),
                },
                (None, None) => AnalysisTarget::MyTag {
                    tag_id: tag_id.clone(),
                },
            }),
            Commands::Login { .. } | Commands::Me | Commands::Config => None,
        }
    }
}
