//! Durable records (teams, members, surveys, sprint reports) stored in redb.
//!
//! # Table design
//!
//! Every table maps a `&str` key to a JSON-encoded value.
//!
//! ```text
//! teams    <team_id>                               -> Team
//! members  <member_id>                             -> Member
//! surveys  <team_id>/<millis:020>/<submission_id>  -> SurveySubmission
//! reports  <team_id>/<sprint:010>                  -> RetroReport
//! ```
//!
//! Composite keys start with the team id followed by `/`, so a range scan
//! from `"<team_id>/"` up to `"<team_id>0"` (`'0'` sorts right after `'/'`)
//! returns one team's records in key order.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, RetroError};
use crate::ids;
use crate::report::{RetroReport, SprintLedger};
use crate::survey::SurveySubmission;
use crate::team::{Member, Team};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const TEAMS: JsonTable = TableDefinition::new("teams");
const MEMBERS: JsonTable = TableDefinition::new("members");
const SURVEYS: JsonTable = TableDefinition::new("surveys");
const REPORTS: JsonTable = TableDefinition::new("reports");

fn db_err(e: impl std::fmt::Display) -> RetroError {
    RetroError::Db(e.to_string())
}

fn team_range(team_id: &str) -> (String, String) {
    (format!("{team_id}/"), format!("{team_id}0"))
}

// ---------------------------------------------------------------------------
// RetroDb
// ---------------------------------------------------------------------------

pub struct RetroDb {
    db: Database,
}

impl RetroDb {
    /// Open or create the database at `path`, creating missing tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        for table in [TEAMS, MEMBERS, SURVEYS, REPORTS] {
            wt.open_table(table).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // Generic JSON helpers
    // -----------------------------------------------------------------------

    fn put<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut t = wt.open_table(table).map_err(db_err)?;
            t.insert(key, bytes.as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let t = rt.open_table(table).map_err(db_err)?;
        let raw = t.get(key).map_err(db_err)?.map(|g| g.value().to_vec());
        match raw {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn scan_all<T: DeserializeOwned>(&self, table: JsonTable) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let t = rt.open_table(table).map_err(db_err)?;
        let mut out = Vec::new();
        for entry in t.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            out.push(serde_json::from_slice(v.value())?);
        }
        Ok(out)
    }

    fn scan_team<T: DeserializeOwned>(&self, table: JsonTable, team_id: &str) -> Result<Vec<T>> {
        let (start, end) = team_range(team_id);
        let rt = self.db.begin_read().map_err(db_err)?;
        let t = rt.open_table(table).map_err(db_err)?;
        let mut out = Vec::new();
        for entry in t.range(start.as_str()..end.as_str()).map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            out.push(serde_json::from_slice(v.value())?);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Teams
    // -----------------------------------------------------------------------

    pub fn insert_team(&self, team: &Team) -> Result<()> {
        self.put(TEAMS, &team.id, team)
    }

    pub fn get_team(&self, team_id: &str) -> Result<Team> {
        ids::validate_id("team id", team_id)?;
        self.get(TEAMS, team_id)?
            .ok_or_else(|| RetroError::TeamNotFound(team_id.to_string()))
    }

    /// All teams, oldest first.
    pub fn list_teams(&self) -> Result<Vec<Team>> {
        let mut teams: Vec<Team> = self.scan_all(TEAMS)?;
        teams.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(teams)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Add a member to an existing team. Emails are unique within a team.
    ///
    /// The team check, the duplicate scan and the insert share one write
    /// transaction, so concurrent adds of the same email cannot both succeed.
    pub fn add_member(&self, member: &Member) -> Result<()> {
        ids::validate_id("team id", &member.team_id)?;
        let bytes = serde_json::to_vec(member)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let teams = wt.open_table(TEAMS).map_err(db_err)?;
            if teams.get(member.team_id.as_str()).map_err(db_err)?.is_none() {
                return Err(RetroError::TeamNotFound(member.team_id.clone()));
            }

            let mut members = wt.open_table(MEMBERS).map_err(db_err)?;
            for entry in members.iter().map_err(db_err)? {
                let (_, v) = entry.map_err(db_err)?;
                let existing: Member = serde_json::from_slice(v.value())?;
                if existing.team_id == member.team_id
                    && existing.email.eq_ignore_ascii_case(&member.email)
                {
                    return Err(RetroError::MemberExists(member.email.clone()));
                }
            }
            members
                .insert(member.id.as_str(), bytes.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    pub fn get_member(&self, member_id: &str) -> Result<Member> {
        ids::validate_id("user id", member_id)?;
        self.get(MEMBERS, member_id)?
            .ok_or_else(|| RetroError::MemberNotFound(member_id.to_string()))
    }

    /// Members of a team, oldest first.
    pub fn list_members(&self, team_id: &str) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self
            .scan_all::<Member>(MEMBERS)?
            .into_iter()
            .filter(|m| m.team_id == team_id)
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    /// Team the member belongs to.
    pub fn member_team(&self, member_id: &str) -> Result<String> {
        Ok(self.get_member(member_id)?.team_id)
    }

    /// Headcount for a team: its members plus the scrum master.
    pub fn team_size(&self, team_id: &str) -> Result<usize> {
        self.get_team(team_id)?;
        Ok(self.list_members(team_id)?.len() + 1)
    }

    // -----------------------------------------------------------------------
    // Surveys
    // -----------------------------------------------------------------------

    /// Record a submission. The team must exist.
    pub fn insert_survey(&self, survey: &SurveySubmission) -> Result<()> {
        self.get_team(&survey.team_id)?;
        let key = format!(
            "{}/{:020}/{}",
            survey.team_id,
            survey.date.timestamp_millis().max(0),
            survey.id
        );
        self.put(SURVEYS, &key, survey)
    }

    /// A team's submissions, oldest first.
    pub fn list_surveys(&self, team_id: &str) -> Result<Vec<SurveySubmission>> {
        ids::validate_id("team id", team_id)?;
        self.scan_team(SURVEYS, team_id)
    }

    // -----------------------------------------------------------------------
    // Sprint reports
    // -----------------------------------------------------------------------

    /// Store a report under its sprint number, replacing any earlier report
    /// for the same sprint.
    pub fn save_report(&self, report: &RetroReport) -> Result<()> {
        let sprint = report.sprint.ok_or_else(|| {
            RetroError::InvalidInput("cannot store a report without a sprint number".into())
        })?;
        let key = format!("{}/{:010}", report.team_id, sprint);
        self.put(REPORTS, &key, report)
    }

    /// A team's reports in sprint order.
    pub fn list_reports(&self, team_id: &str) -> Result<Vec<RetroReport>> {
        ids::validate_id("team id", team_id)?;
        self.scan_team(REPORTS, team_id)
    }
}

impl SprintLedger for RetroDb {
    fn increment_sprint(&self, team_id: &str) -> Result<u32> {
        ids::validate_id("team id", team_id)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let sprint = {
            let mut table = wt.open_table(TEAMS).map_err(db_err)?;
            let raw = table
                .get(team_id)
                .map_err(db_err)?
                .map(|g| g.value().to_vec())
                .ok_or_else(|| RetroError::TeamNotFound(team_id.to_string()))?;
            let mut team: Team = serde_json::from_slice(&raw)?;
            team.sprint += 1;
            let bytes = serde_json::to_vec(&team)?;
            table.insert(team_id, bytes.as_slice()).map_err(db_err)?;
            team.sprint
        };
        wt.commit().map_err(db_err)?;
        tracing::debug!(team_id, sprint, "sprint counter incremented");
        Ok(sprint)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::default_columns;
    use crate::survey::NewSurvey;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RetroDb) {
        let dir = TempDir::new().unwrap();
        let db = RetroDb::open(&dir.path().join("retro.db")).unwrap();
        (dir, db)
    }

    fn team(db: &RetroDb, name: &str) -> Team {
        let team = Team::new(name, ids::new_id()).unwrap();
        db.insert_team(&team).unwrap();
        team
    }

    fn submission(team_id: &str) -> SurveySubmission {
        NewSurvey {
            team_id: team_id.to_string(),
            user_id: ids::new_id(),
            answers: [("mood".to_string(), serde_json::json!(5))].into(),
            comment: None,
        }
        .into_submission()
        .unwrap()
    }

    #[test]
    fn insert_and_get_team() {
        let (_dir, db) = open_tmp();
        let t = team(&db, "Platform");
        let loaded = db.get_team(&t.id).unwrap();
        assert_eq!(loaded.name, "Platform");
        assert_eq!(db.list_teams().unwrap().len(), 1);
    }

    #[test]
    fn get_missing_team_is_not_found() {
        let (_dir, db) = open_tmp();
        assert!(matches!(
            db.get_team(&ids::new_id()),
            Err(RetroError::TeamNotFound(_))
        ));
        assert!(matches!(
            db.get_team("bogus"),
            Err(RetroError::InvalidId { .. })
        ));
    }

    #[test]
    fn increment_sprint_persists() {
        let (dir, db) = open_tmp();
        let t = team(&db, "Platform");
        assert_eq!(db.increment_sprint(&t.id).unwrap(), 1);
        assert_eq!(db.increment_sprint(&t.id).unwrap(), 2);
        drop(db);

        let reopened = RetroDb::open(&dir.path().join("retro.db")).unwrap();
        assert_eq!(reopened.get_team(&t.id).unwrap().sprint, 2);
    }

    #[test]
    fn increment_sprint_unknown_team_fails() {
        let (_dir, db) = open_tmp();
        assert!(matches!(
            db.increment_sprint(&ids::new_id()),
            Err(RetroError::TeamNotFound(_))
        ));
    }

    #[test]
    fn members_are_scoped_to_team() {
        let (_dir, db) = open_tmp();
        let a = team(&db, "A");
        let b = team(&db, "B");
        let ana = Member::new(&a.id, "Ana", "ana@example.com").unwrap();
        db.add_member(&ana).unwrap();
        db.add_member(&Member::new(&b.id, "Bo", "bo@example.com").unwrap())
            .unwrap();

        let members = db.list_members(&a.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Ana");
        assert_eq!(db.member_team(&ana.id).unwrap(), a.id);
        assert_eq!(db.team_size(&a.id).unwrap(), 2);
    }

    #[test]
    fn duplicate_member_email_is_rejected() {
        let (_dir, db) = open_tmp();
        let t = team(&db, "A");
        db.add_member(&Member::new(&t.id, "Ana", "ana@example.com").unwrap())
            .unwrap();
        let dup = Member::new(&t.id, "Ana 2", "ANA@example.com").unwrap();
        assert!(matches!(
            db.add_member(&dup),
            Err(RetroError::MemberExists(_))
        ));
    }

    #[test]
    fn concurrent_adds_of_same_email_store_one_member() {
        let (_dir, db) = open_tmp();
        let t = team(&db, "A");
        let db = std::sync::Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                let member = Member::new(&t.id, format!("Ana {i}"), "ana@example.com").unwrap();
                std::thread::spawn(move || db.add_member(&member).is_ok())
            })
            .collect();
        let stored = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(stored, 1);
        assert_eq!(db.list_members(&t.id).unwrap().len(), 1);
    }

    #[test]
    fn member_for_missing_team_is_rejected() {
        let (_dir, db) = open_tmp();
        let orphan = Member::new(ids::new_id(), "Ana", "ana@example.com").unwrap();
        assert!(matches!(
            db.add_member(&orphan),
            Err(RetroError::TeamNotFound(_))
        ));
    }

    #[test]
    fn surveys_require_team_and_list_per_team() {
        let (_dir, db) = open_tmp();
        let a = team(&db, "A");
        let b = team(&db, "B");
        db.insert_survey(&submission(&a.id)).unwrap();
        db.insert_survey(&submission(&a.id)).unwrap();
        db.insert_survey(&submission(&b.id)).unwrap();

        assert_eq!(db.list_surveys(&a.id).unwrap().len(), 2);
        assert_eq!(db.list_surveys(&b.id).unwrap().len(), 1);
        assert!(matches!(
            db.insert_survey(&submission(&ids::new_id())),
            Err(RetroError::TeamNotFound(_))
        ));
    }

    #[test]
    fn reports_are_listed_in_sprint_order() {
        let (_dir, db) = open_tmp();
        let t = team(&db, "A");
        for sprint in [10, 2, 1] {
            let report = RetroReport::build(&t.id, Some(sprint), None, &default_columns());
            db.save_report(&report).unwrap();
        }
        let sprints: Vec<Option<u32>> = db
            .list_reports(&t.id)
            .unwrap()
            .iter()
            .map(|r| r.sprint)
            .collect();
        assert_eq!(sprints, vec![Some(1), Some(2), Some(10)]);
    }

    #[test]
    fn report_without_sprint_is_not_stored() {
        let (_dir, db) = open_tmp();
        let t = team(&db, "A");
        let report = RetroReport::build(&t.id, None, None, &default_columns());
        assert!(db.save_report(&report).is_err());
        assert!(db.list_reports(&t.id).unwrap().is_empty());
    }
}
