use crate::output::print_json;
use anyhow::{bail, Result};
use clap::Subcommand;
use retro_core::token::TokenPurpose;
use std::path::Path;

#[derive(Subcommand)]
pub enum TokenSubcommand {
    /// Issue a signed token
    Issue {
        /// Subject (user id)
        sub: String,
        /// Scope the token to a team
        #[arg(long)]
        team: Option<String>,
        /// access, retro, or survey
        #[arg(long, default_value = "access")]
        purpose: String,
    },

    /// Verify a token and print its claims
    Verify { token: String },
}

pub fn run(config_path: &Path, subcmd: TokenSubcommand, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let signer = config.signer()?;

    match subcmd {
        TokenSubcommand::Issue { sub, team, purpose } => {
            let purpose = parse_purpose(&purpose)?;
            let token = signer.issue(&sub, team.as_deref(), purpose)?;
            if json {
                print_json(&serde_json::json!({ "token": token }))?;
            } else {
                println!("{token}");
            }
        }
        TokenSubcommand::Verify { token } => {
            let claims = signer.verify(&token)?;
            if json {
                print_json(&claims)?;
            } else {
                let expires = chrono::DateTime::from_timestamp(claims.exp, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| claims.exp.to_string());
                println!("sub:     {}", claims.sub);
                println!("team:    {}", claims.team_id.as_deref().unwrap_or("-"));
                println!("purpose: {:?}", claims.purpose);
                println!("expires: {expires}");
            }
        }
    }
    Ok(())
}

fn parse_purpose(s: &str) -> Result<TokenPurpose> {
    Ok(match s {
        "access" => TokenPurpose::Access,
        "retro" => TokenPurpose::Retro,
        "survey" => TokenPurpose::Survey,
        other => bail!("unknown purpose '{other}': expected access, retro, or survey"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purposes_parse() {
        assert_eq!(parse_purpose("retro").unwrap(), TokenPurpose::Retro);
        assert!(parse_purpose("admin").is_err());
    }
}
