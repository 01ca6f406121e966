use crate::output::{print_json, print_table};
use anyhow::Result;
use clap::Subcommand;
use retro_core::invitation::{self, InvitationKind};
use std::path::Path;

#[derive(Subcommand)]
pub enum InviteSubcommand {
    /// Retro board links for every member
    Retro { team_id: String },

    /// Survey links for every member
    Survey { team_id: String },
}

pub fn run(config_path: &Path, subcmd: InviteSubcommand, json: bool) -> Result<()> {
    let (team_id, kind) = match subcmd {
        InviteSubcommand::Retro { team_id } => (team_id, InvitationKind::Retro),
        InviteSubcommand::Survey { team_id } => (team_id, InvitationKind::Survey),
    };

    let (config, db) = super::open(config_path)?;
    let signer = config.signer()?;
    db.get_team(&team_id)?;
    let members = db.list_members(&team_id)?;
    let invites = invitation::build_invitations(
        &members,
        &team_id,
        kind,
        &config.retro.public_url,
        &signer,
    )?;

    if json {
        return print_json(&invites);
    }
    let rows = invites
        .iter()
        .map(|i| vec![i.name.clone(), i.email.clone(), i.link.clone()])
        .collect();
    print_table(&["NAME", "EMAIL", "LINK"], rows);
    Ok(())
}
