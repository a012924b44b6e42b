//! Command-line entry point.

use clap::Parser;
use sisgroups::config::{Credentials, DirectoryConfig, SisConfig};
use sisgroups::directory::{authenticate, DirectoryClient};
use sisgroups::reconcile::{Reconciler, RolePolicy, Subgroup, SyncRequest, DEFAULT_SUBGROUPS};
use sisgroups::sis::{SisClient, SisCredentials, TermSelector};
use std::path::PathBuf;
use tracing::Level;

/// Create and populate directory groups from SIS course data.
#[derive(Debug, Parser)]
#[command(name = "sisgroups", version, about)]
struct Cli {
    /// Base directory folder, e.g. edu:college:dept:classes
    #[arg(short = 'b', long)]
    base_group: String,

    /// SIS term id (e.g. 2192) or Current, Next, Previous
    #[arg(short = 't', long, default_value = "Current", value_parser = TermSelector::parse)]
    term: TermSelector,

    /// SIS subject area, e.g. ASTRON
    #[arg(short = 's', long)]
    subject_area: String,

    /// SIS catalog number, e.g. 128
    #[arg(short = 'c', long)]
    catalog_number: String,

    /// Credentials file
    #[arg(short = 'C', long, default_value = "/root/.sisgroups.json")]
    credentials: PathBuf,

    /// Limit the sync to specific subgroups
    #[arg(
        short = 'S',
        long,
        value_delimiter = ',',
        value_parser = Subgroup::parse,
        default_values_t = DEFAULT_SUBGROUPS
    )]
    subgroups: Vec<Subgroup>,

    /// Print memberships to stdout instead of updating the directory
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Let each section overwrite its role's UID set instead of
    /// unioning across sections (historical behavior)
    #[arg(long)]
    last_section_wins: bool,

    /// Be verbose
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short = 'd', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let credentials = Credentials::load(&cli.credentials)?;

    let sis = SisClient::new(
        SisConfig::default(),
        SisCredentials {
            enrollments: credentials.enrollments_key(),
            classes: credentials.classes_key(),
            terms: credentials.terms_key(),
        },
    )?;
    let directory = DirectoryClient::new(DirectoryConfig::default())?;
    let auth = authenticate(&credentials.grouper_user, &credentials.grouper_pass);

    let request = SyncRequest {
        base_group: cli.base_group,
        term: cli.term,
        subject_area: cli.subject_area,
        catalog_number: cli.catalog_number,
        subgroups: cli.subgroups,
        dry_run: cli.dry_run,
        role_policy: if cli.last_section_wins {
            RolePolicy::LastSectionWins
        } else {
            RolePolicy::Union
        },
    };

    Reconciler::new(sis, directory, auth).run(&request).await?;
    Ok(())
}
