use crate::output::{print_json, print_table, short_time};
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SurveySubcommand {
    /// List a team's survey submissions
    List { team_id: String },
}

pub fn run(config_path: &Path, subcmd: SurveySubcommand, json: bool) -> Result<()> {
    match subcmd {
        SurveySubcommand::List { team_id } => {
            let (_, db) = super::open(config_path)?;
            db.get_team(&team_id)?;
            let surveys = db.list_surveys(&team_id)?;

            if json {
                return print_json(&surveys);
            }
            let rows = surveys
                .iter()
                .map(|s| {
                    let answers = s
                        .answers
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    vec![short_time(&s.date), s.user_id.clone(), answers]
                })
                .collect();
            print_table(&["DATE", "USER", "ANSWERS"], rows);
            Ok(())
        }
    }
}
