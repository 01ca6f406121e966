use crate::output::{print_json, print_table};
use anyhow::Result;
use clap::Subcommand;
use retro_core::team::Member;
use std::path::Path;

#[derive(Subcommand)]
pub enum MemberSubcommand {
    /// Add a member to a team
    Add {
        team_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// List a team's members
    List { team_id: String },
}

pub fn run(config_path: &Path, subcmd: MemberSubcommand, json: bool) -> Result<()> {
    match subcmd {
        MemberSubcommand::Add {
            team_id,
            name,
            email,
        } => add(config_path, team_id, name, email, json),
        MemberSubcommand::List { team_id } => list(config_path, &team_id, json),
    }
}

fn add(config_path: &Path, team_id: String, name: String, email: String, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    let member = Member::new(team_id, name, email)?;
    db.add_member(&member)?;

    if json {
        print_json(&member)?;
    } else {
        println!("Added {} <{}> as {}", member.name, member.email, member.id);
    }
    Ok(())
}

fn list(config_path: &Path, team_id: &str, json: bool) -> Result<()> {
    let (_, db) = super::open(config_path)?;
    db.get_team(team_id)?;
    let members = db.list_members(team_id)?;

    if json {
        return print_json(&members);
    }
    let rows = members
        .iter()
        .map(|m| vec![m.id.clone(), m.name.clone(), m.email.clone()])
        .collect();
    print_table(&["ID", "NAME", "EMAIL"], rows);
    Ok(())
}
