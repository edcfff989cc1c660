use std::collections::HashSet;

use sqlx::PgConnection;
use uuid::Uuid;

use super::{bids, packages, projects, teams, users};
use crate::reporting::ProjectSnapshot;

/// Loads the project with its packages, bids, team and every contractor
/// profile those reference. `None` when the project does not exist.
pub async fn load(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Option<ProjectSnapshot>, sqlx::Error> {
    let Some(project) = projects::find(conn, project_id).await? else {
        return Ok(None);
    };
    let packages = packages::list_for_project(conn, project_id).await?;
    let bids = bids::list_for_project(conn, project_id).await?;
    let team = teams::find_for_project(conn, project_id).await?;

    let mut user_ids: HashSet<Uuid> = bids.iter().map(|b| b.contractor_id).collect();
    if let Some(roster) = &team {
        user_ids.extend(roster.members.iter().map(|m| m.contractor_id));
        user_ids.extend(roster.team.lead_contractor_id);
    }
    let user_ids: Vec<Uuid> = user_ids.into_iter().collect();
    let users = users::find_many(conn, &user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(Some(ProjectSnapshot {
        project,
        packages,
        bids,
        team,
        users,
    }))
}
