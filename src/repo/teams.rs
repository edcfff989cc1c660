use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::{ContractorTeam, TeamMember};
use crate::workflow::TeamRoster;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TeamRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    lead_contractor_id: Option<Uuid>,
    status: String,
    notes: String,
    assigned_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TeamRow> for ContractorTeam {
    type Error = sqlx::Error;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            lead_contractor_id: row.lead_contractor_id,
            status: decode("status", &row.status)?,
            notes: row.notes,
            assigned_by: row.assigned_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MemberRow {
    id: Uuid,
    team_id: Uuid,
    contractor_id: Uuid,
    role: String,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for TeamMember {
    type Error = sqlx::Error;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            team_id: row.team_id,
            contractor_id: row.contractor_id,
            role: decode("role", &row.role)?,
            assigned_at: row.assigned_at,
        })
    }
}

const COLUMNS: &str = "t.id, t.project_id, t.name, t.lead_contractor_id, t.status, t.notes, \
                       t.assigned_by, t.created_at, t.updated_at";
const MEMBER_COLUMNS: &str = "id, team_id, contractor_id, role, assigned_at";

async fn with_members(
    conn: &mut PgConnection,
    row: Option<TeamRow>,
) -> Result<Option<TeamRoster>, sqlx::Error> {
    let Some(row) = row else {
        return Ok(None);
    };
    let team = ContractorTeam::try_from(row)?;
    let members = members_of(conn, &[team.id]).await?;
    Ok(Some(TeamRoster { team, members }))
}

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<TeamRoster>, sqlx::Error> {
    let row = sqlx::query_as::<_, TeamRow>(&format!(
        "SELECT {COLUMNS} FROM contractor_teams t WHERE t.id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    with_members(conn, row).await
}

pub async fn find_for_project(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Option<TeamRoster>, sqlx::Error> {
    let row = sqlx::query_as::<_, TeamRow>(&format!(
        "SELECT {COLUMNS} FROM contractor_teams t WHERE t.project_id = $1"
    ))
    .bind(project_id)
    .fetch_optional(&mut *conn)
    .await?;
    with_members(conn, row).await
}

/// Memberships of the given teams, oldest first
pub async fn members_of(
    conn: &mut PgConnection,
    team_ids: &[Uuid],
) -> Result<Vec<TeamMember>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MemberRow>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = ANY($1) ORDER BY assigned_at"
    ))
    .bind(team_ids)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

pub async fn insert(conn: &mut PgConnection, team: &ContractorTeam) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO contractor_teams (id, project_id, name, lead_contractor_id, status, notes,
                                      assigned_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(team.id)
    .bind(team.project_id)
    .bind(&team.name)
    .bind(team.lead_contractor_id)
    .bind(team.status.as_str())
    .bind(&team.notes)
    .bind(team.assigned_by)
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update(conn: &mut PgConnection, team: &ContractorTeam) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE contractor_teams
        SET name = $2, lead_contractor_id = $3, status = $4, notes = $5, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(team.id)
    .bind(&team.name)
    .bind(team.lead_contractor_id)
    .bind(team.status.as_str())
    .bind(&team.notes)
    .execute(conn)
    .await?;
    Ok(())
}

/// Inserts a membership; the `(team_id, contractor_id)` unique constraint
/// backs up the caller's roster check.
pub async fn insert_member(conn: &mut PgConnection, member: &TeamMember) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO team_members (id, team_id, contractor_id, role, assigned_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(member.id)
    .bind(member.team_id)
    .bind(member.contractor_id)
    .bind(member.role.as_str())
    .bind(member.assigned_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_member(
    conn: &mut PgConnection,
    team_id: Uuid,
    contractor_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND contractor_id = $2")
        .bind(team_id)
        .bind(contractor_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn rosters(
    conn: &mut PgConnection,
    rows: Vec<TeamRow>,
) -> Result<Vec<TeamRoster>, sqlx::Error> {
    let teams: Vec<ContractorTeam> = decode_all(rows)?;
    let ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
    let mut members = members_of(conn, &ids).await?;

    Ok(teams
        .into_iter()
        .map(|team| {
            let (mine, rest): (Vec<TeamMember>, Vec<TeamMember>) = std::mem::take(&mut members)
                .into_iter()
                .partition(|m| m.team_id == team.id);
            members = rest;
            TeamRoster { team, members: mine }
        })
        .collect())
}

/// Teams on projects owned by a council, newest first
pub async fn list_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
) -> Result<Vec<TeamRoster>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TeamRow>(&format!(
        "SELECT {COLUMNS} FROM contractor_teams t JOIN projects p ON p.id = t.project_id \
         WHERE p.council_id = $1 ORDER BY t.created_at DESC"
    ))
    .bind(council_id)
    .fetch_all(&mut *conn)
    .await?;
    rosters(conn, rows).await
}

/// Teams a contractor belongs to, newest first
pub async fn list_for_contractor(
    conn: &mut PgConnection,
    contractor_id: Uuid,
) -> Result<Vec<TeamRoster>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TeamRow>(&format!(
        "SELECT {COLUMNS} FROM contractor_teams t \
         WHERE EXISTS (SELECT 1 FROM team_members m WHERE m.team_id = t.id AND m.contractor_id = $1) \
         ORDER BY t.created_at DESC"
    ))
    .bind(contractor_id)
    .fetch_all(&mut *conn)
    .await?;
    rosters(conn, rows).await
}
