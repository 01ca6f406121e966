use crate::output::{print_json, print_table, short_time};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// List a team's stored sprint reports
    List { team_id: String },

    /// Print one sprint's report as markdown
    Show {
        team_id: String,
        #[arg(long)]
        sprint: u32,
    },
}

pub fn run(config_path: &Path, subcmd: ReportSubcommand, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    match subcmd {
        ReportSubcommand::List { team_id } => {
            db.get_team(&team_id)?;
            let reports = db.list_reports(&team_id)?;
            if json {
                return print_json(&reports);
            }
            let rows = reports
                .iter()
                .map(|r| {
                    vec![
                        r.sprint.map(|s| s.to_string()).unwrap_or_default(),
                        short_time(&r.completed_at),
                        r.note_count().to_string(),
                    ]
                })
                .collect();
            print_table(&["SPRINT", "COMPLETED", "NOTES"], rows);
        }
        ReportSubcommand::Show { team_id, sprint } => {
            db.get_team(&team_id)?;
            let report = db
                .list_reports(&team_id)?
                .into_iter()
                .find(|r| r.sprint == Some(sprint))
                .ok_or_else(|| anyhow!("no report for sprint {sprint}"))?;
            if json {
                return print_json(&report);
            }
            print!("{}", report.to_markdown());
        }
    }
    Ok(())
}
