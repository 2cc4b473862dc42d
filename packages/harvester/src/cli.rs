//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{format_timestamp, validate_pid, HarvesterConfig, DEFAULT_CATALOG_ID};
use crate::error::{HarvesterError, Result};
use crate::harvester::{run_harvest, HarvestOptions, HarvestReport};
use crate::mapper::map_record;
use crate::metax::MetaxClient;
use crate::oai::OaiClient;
use crate::reconcile::TargetCatalog;
use crate::source::SourceRecord;
use crate::state::HarvestState;
use crate::validation::validate;

/// Kielipankki metadata harvester - Sync CMDI records from OAI-PMH to Metax.
#[derive(Parser)]
#[command(name = "kielipankki-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest changed records and sync them to Metax.
    Harvest {
        /// Path to the YAML configuration file
        config: PathBuf,

        /// Ignore the last harvest time and harvest every record
        #[arg(long)]
        full: bool,

        /// Map and validate only, do not modify Metax or the state file
        #[arg(long)]
        dry_run: bool,
    },

    /// Map a local CMDI file and print the resulting dataset JSON.
    Map {
        /// CMDI record file (bare CMD document or OAI-PMH record)
        file: PathBuf,

        /// Data catalog to put in the mapped record
        #[arg(long, default_value = DEFAULT_CATALOG_ID)]
        catalog_id: String,
    },

    /// Delete one dataset from Metax by PID.
    DeleteRecord {
        /// Path to the YAML configuration file
        config: PathBuf,

        /// Persistent identifier, e.g. urn:nbn:fi:lb-2016101210
        pid: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            config,
            full,
            dry_run,
        } => harvest_command(&config, full, dry_run),
        Commands::Map { file, catalog_id } => map_command(&file, &catalog_id),
        Commands::DeleteRecord { config, pid } => delete_record_command(&config, &pid),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the harvest command.
fn harvest_command(config_path: &Path, full: bool, dry_run: bool) -> Result<()> {
    let config = HarvesterConfig::from_file(config_path)?;
    let mut state = HarvestState::load(&config.state_file)?;
    let started_at = Utc::now();

    let from = if full {
        None
    } else {
        state.last_successful_harvest
    };

    match &from {
        Some(from) => println!(
            "{} records changed since {}",
            style("Harvesting").bold(),
            style(format_timestamp(from)).green()
        ),
        None => println!("{} all records", style("Harvesting").bold()),
    }
    if dry_run {
        println!("  {}", style("Dry run: Metax will not be modified").yellow());
    }
    println!();

    let source = OaiClient::new(&config.oai_pmh_url)?;
    let mut target = MetaxClient::from_config(&config)?;
    let options = HarvestOptions {
        catalog_id: config.metax_catalog_id.clone(),
        from,
        dry_run,
    };

    let pb = spinner();
    pb.set_message("Harvesting and syncing records...");
    let report = match run_harvest(&source, &mut target, &options) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    print_summary(&report);

    if let Some(path) = &config.rejection_report_file {
        if !report.rejections.is_empty() {
            report.rejections.save(path)?;
            println!(
                "{} {}",
                style("Rejection report:").yellow().bold(),
                path.display()
            );
        }
    }

    if !report.is_complete() {
        return Err(HarvesterError::IncompleteHarvest {
            failed: report.failure_count(),
        });
    }

    if !dry_run {
        state.mark_success(started_at);
        state.save(&config.state_file)?;
    }

    println!();
    println!("{}", style("Harvest complete").green().bold());
    Ok(())
}

fn print_summary(report: &HarvestReport) {
    println!("  Fetched: {}", report.fetched);
    println!("  Not corpora: {}", report.skipped_non_corpus);
    println!("  Accepted: {}", style(report.accepted.len()).green());
    if !report.dry_run {
        println!(
            "  Created: {}, updated: {}, unchanged: {}",
            report.created, report.updated, report.unchanged
        );
    }
    if !report.rejections.is_empty() {
        println!(
            "  Rejected: {}",
            style(report.rejections.len()).yellow().bold()
        );
        for rejected in &report.rejections.rejected {
            let rules: Vec<&str> = rejected.rules.iter().map(|r| r.id()).collect();
            println!("    {} ({})", rejected.pid, rules.join(", "));
        }
        for dropped in &report.rejections.dropped {
            println!("    {}", dropped.reason);
        }
    }
    if let Some(plan) = &report.sync_plan {
        let verb = if report.dry_run { "Would delete" } else { "Deleted" };
        let count = if report.dry_run {
            plan.to_delete.len()
        } else {
            report.deleted.len()
        };
        println!("  {verb}: {count}");
    }
    for failure in report.push_failures.iter().chain(&report.delete_failures) {
        println!(
            "  {} {}: {}",
            style("Failed").red().bold(),
            failure.pid,
            failure.error
        );
    }
}

/// Execute the map command.
fn map_command(file: &Path, catalog_id: &str) -> Result<()> {
    let xml = std::fs::read_to_string(file)?;
    let source = SourceRecord::parse(&xml)?;
    let mapped = map_record(&source, catalog_id)?;
    let validation = validate(&mapped.record);

    println!("{}", mapped.record.to_json_pretty()?);

    for issue in &mapped.issues {
        eprintln!("{} {issue}", style("Issue:").yellow());
    }
    if validation.is_valid() {
        eprintln!("{}", style("Record is valid").green().bold());
    } else {
        for rule in &validation.violations {
            eprintln!(
                "{} {} ({})",
                style("Rejected:").red().bold(),
                rule.id(),
                rule.description()
            );
        }
    }
    Ok(())
}

/// Execute the delete-record command.
fn delete_record_command(config_path: &Path, pid: &str) -> Result<()> {
    let pid = validate_pid(pid)?;
    let config = HarvesterConfig::from_file(config_path)?;
    let mut target = MetaxClient::from_config(&config)?;

    if target.delete(&pid)? {
        println!("{} {}", style("Deleted").green().bold(), style(&pid).cyan());
    } else {
        println!(
            "{} {} not found in catalog {}",
            style("Skipped:").yellow().bold(),
            style(&pid).cyan(),
            target.catalog_id()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_harvest() {
        let cli = Cli::parse_from(["kielipankki-harvester", "harvest", "config.yaml"]);

        let Commands::Harvest {
            config,
            full,
            dry_run,
        } = cli.command
        else {
            panic!("expected harvest command");
        };
        assert_eq!(config, PathBuf::from("config.yaml"));
        assert!(!full);
        assert!(!dry_run);
    }

    #[test]
    fn test_cli_parse_harvest_flags() {
        let cli = Cli::parse_from([
            "kielipankki-harvester",
            "harvest",
            "config.yaml",
            "--full",
            "--dry-run",
        ]);

        let Commands::Harvest { full, dry_run, .. } = cli.command else {
            panic!("expected harvest command");
        };
        assert!(full);
        assert!(dry_run);
    }

    #[test]
    fn test_cli_parse_map_default_catalog() {
        let cli = Cli::parse_from(["kielipankki-harvester", "map", "record.xml"]);

        let Commands::Map { file, catalog_id } = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(file, PathBuf::from("record.xml"));
        assert_eq!(catalog_id, DEFAULT_CATALOG_ID);
    }

    #[test]
    fn test_cli_parse_delete_record() {
        let cli = Cli::parse_from([
            "kielipankki-harvester",
            "delete-record",
            "config.yaml",
            "urn:nbn:fi:lb-2016101210",
        ]);

        let Commands::DeleteRecord { pid, .. } = cli.command else {
            panic!("expected delete-record command");
        };
        assert_eq!(pid, "urn:nbn:fi:lb-2016101210");
    }
}
