//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Work package reports for OpenProject.
///
/// Reports take trailing `name=value` options, e.g.
/// `opr tasks project=website assignee=me closed=false`.
#[derive(Debug, Parser)]
#[command(name = "opr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Read API responses from a snapshot directory instead of the network.
    ///
    /// The directory holds `versions.json`, `work_packages.json` and
    /// `projects.json` collections.
    #[arg(long, global = true, value_name = "DIR")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the link of the active version.
    VersionLink(ReportArgs),

    /// Print the remaining hours of the active version.
    VersionHours(ReportArgs),

    /// List work packages of the current versions, grouped by project.
    Tasks {
        #[command(flatten)]
        report: ReportArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List my work packages of the current versions, with hours.
    MyTasks(ReportArgs),

    /// List the backlog of a version, sorted by story points.
    Backlog(ReportArgs),

    /// Print the story points of a version.
    StoryPoints(ReportArgs),

    /// List the projects a version is shared with.
    VersionProjects {
        /// Version ID.
        version: String,

        /// Output as a Markdown table.
        #[arg(long)]
        table: bool,
    },

    /// List the work packages of one version of a project.
    Version {
        /// Project ID or identifier.
        project: String,

        /// Version ID.
        version: String,
    },

    /// List the work packages of a project.
    Project {
        /// Project ID or identifier.
        project: String,
    },

    /// Print a work package with its link.
    WorkPackage {
        /// Work package ID.
        id: String,
    },

    /// Print one property of a project.
    ProjectInfo {
        /// Project ID or identifier.
        project: String,

        /// One of: id, identifier, name, description, link.
        property: String,
    },
}

/// Trailing report options.
#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Report options as `name=value` or bare `name` flags.
    #[arg(value_name = "OPTION")]
    pub options: Vec<String>,
}
