use crate::output::{print_json, print_table, short_time};
use anyhow::Result;
use clap::Subcommand;
use retro_core::team::Team;
use std::path::Path;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// Create a team
    Create {
        /// Display name
        name: String,
        /// Id of the scrum master running the team's retros
        #[arg(long)]
        scrum_id: String,
    },

    /// List all teams
    List,

    /// Show a team and its members
    Show { team_id: String },
}

pub fn run(config_path: &Path, subcmd: TeamSubcommand, json: bool) -> Result<()> {
    match subcmd {
        TeamSubcommand::Create { name, scrum_id } => create(config_path, name, scrum_id, json),
        TeamSubcommand::List => list(config_path, json),
        TeamSubcommand::Show { team_id } => show(config_path, &team_id, json),
    }
}

fn create(config_path: &Path, name: String, scrum_id: String, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    let team = Team::new(name, scrum_id)?;
    db.insert_team(&team)?;

    if json {
        print_json(&team)?;
    } else {
        println!("Created team '{}' ({})", team.name, team.id);
    }
    Ok(())
}

fn list(config_path: &Path, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    let teams = db.list_teams()?;

    if json {
        return print_json(&teams);
    }
    let rows = teams
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.name.clone(),
                t.sprint.to_string(),
                short_time(&t.created_at),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "SPRINT", "CREATED"], rows);
    Ok(())
}

fn show(config_path: &Path, team_id: &str, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    let team = db.get_team(team_id)?;
    let members = db.list_members(team_id)?;

    if json {
        return print_json(&serde_json::json!({
            "team": team,
            "size": members.len() + 1,
            "members": members,
        }));
    }

    println!("Team:     {} ({})", team.name, team.id);
    println!("Scrum:    {}", team.scrum_id);
    println!("Sprint:   {}", team.sprint);
    println!("Size:     {}", members.len() + 1);
    println!();
    let rows = members
        .iter()
        .map(|m| vec![m.id.clone(), m.name.clone(), m.email.clone()])
        .collect();
    print_table(&["MEMBER", "NAME", "EMAIL"], rows);
    Ok(())
}
