//! Invitation links for retros and surveys.
//!
//! Every member of a team gets a link into the frontend carrying a signed
//! token scoped to that member and team. Delivering the links (email, chat)
//! happens elsewhere.

use crate::error::Result;
use crate::team::Member;
use crate::token::{TokenPurpose, TokenSigner};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationKind {
    Retro,
    Survey,
}

impl InvitationKind {
    fn path(self) -> &'static str {
        match self {
            InvitationKind::Retro => "members/retro",
            InvitationKind::Survey => "members/survey",
        }
    }

    fn purpose(self) -> TokenPurpose {
        match self {
            InvitationKind::Retro => TokenPurpose::Retro,
            InvitationKind::Survey => TokenPurpose::Survey,
        }
    }
}

impl fmt::Display for InvitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationKind::Retro => f.write_str("retro"),
            InvitationKind::Survey => f.write_str("survey"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub kind: InvitationKind,
    pub member_id: String,
    pub name: String,
    pub email: String,
    pub link: String,
}

fn base(public_url: &str) -> &str {
    public_url.trim_end_matches('/')
}

/// One invitation per member, each with its own signed token.
pub fn build_invitations(
    members: &[Member],
    team_id: &str,
    kind: InvitationKind,
    public_url: &str,
    signer: &TokenSigner,
) -> Result<Vec<Invitation>> {
    members
        .iter()
        .map(|m| {
            let token = signer.issue(&m.id, Some(team_id), kind.purpose())?;
            Ok(Invitation {
                kind,
                member_id: m.id.clone(),
                name: m.name.clone(),
                email: m.email.clone(),
                link: format!(
                    "{}/{}?token={token}&team_id={team_id}&user_id={}",
                    base(public_url),
                    kind.path(),
                    m.id
                ),
            })
        })
        .collect()
}

/// Link the scrum master shares to open a team's retro board.
pub fn retro_link(public_url: &str, token: &str, team_id: &str, scrum_id: &str) -> String {
    format!(
        "{}/members/retro?token={token}&team_id={team_id}&scrum_id={scrum_id}",
        base(public_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids;

    #[test]
    fn one_invitation_per_member_with_scoped_token() {
        let team_id = ids::new_id();
        let members = vec![
            Member::new(&team_id, "Ana", "ana@example.com").unwrap(),
            Member::new(&team_id, "Bo", "bo@example.com").unwrap(),
        ];
        let signer = TokenSigner::new("s", 1).unwrap();
        let invites = build_invitations(
            &members,
            &team_id,
            InvitationKind::Survey,
            "https://retro.example.com/",
            &signer,
        )
        .unwrap();

        assert_eq!(invites.len(), 2);
        let first = &invites[0];
        assert!(first
            .link
            .starts_with("https://retro.example.com/members/survey?token="));
        assert!(first.link.contains(&format!("user_id={}", members[0].id)));

        let token = first
            .link
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap();
        let claims = signer.verify(token).unwrap();
        assert_eq!(claims.sub, members[0].id);
        assert_eq!(claims.team_id.as_deref(), Some(team_id.as_str()));
        assert_eq!(claims.purpose, TokenPurpose::Survey);
    }

    #[test]
    fn retro_link_carries_scrum_master() {
        let link = retro_link("http://localhost:5173", "tok", "team", "scrum");
        assert_eq!(
            link,
            "http://localhost:5173/members/retro?token=tok&team_id=team&scrum_id=scrum"
        );
    }
}
