use std::collections::{BTreeSet, HashMap};

use crate::{
    api::{month_filter, required_month, required_text},
    auth::auth::AuthUser,
    domain::incentive::split_incentive,
    error::ServiceError,
    model::{
        distribution::{Distribution, DistributionInput, DistributionQuery, DistributionRow},
        role::Role,
    },
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{error, info, warn};

const DISTRIBUTION_FILTER: &str = r#"
    WHERE (? IS NULL OR d.month = ?)
    AND (? IS NULL OR d.supervisor_id = ?)
    AND (? IS NULL OR d.id = ?)
"#;

/// Distributions with their team and incentive split, newest month first.
pub async fn load_distributions(
    pool: &MySqlPool,
    month: Option<&str>,
    supervisor_id: Option<u64>,
    id: Option<u64>,
) -> Result<Vec<Distribution>, ServiceError> {
    let rows = sqlx::query_as::<_, DistributionRow>(&format!(
        r#"
        SELECT d.id, d.month, d.supervisor_id, u.name AS supervisor_name, d.product_key,
               d.money_collection, d.incentive_received, d.employee_incentive
        FROM distributions d
        JOIN users u ON u.id = d.supervisor_id
        {DISTRIBUTION_FILTER}
        ORDER BY d.month DESC, d.id
        "#
    ))
    .bind(month)
    .bind(month)
    .bind(supervisor_id)
    .bind(supervisor_id)
    .bind(id)
    .bind(id)
    .fetch_all(pool)
    .await?;

    let links: Vec<(u64, u64)> = sqlx::query_as(&format!(
        r#"
        SELECT m.distribution_id, m.user_id
        FROM distribution_members m
        JOIN distributions d ON d.id = m.distribution_id
        {DISTRIBUTION_FILTER}
        ORDER BY m.user_id
        "#
    ))
    .bind(month)
    .bind(month)
    .bind(supervisor_id)
    .bind(supervisor_id)
    .bind(id)
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut members: HashMap<u64, Vec<u64>> = HashMap::new();
    for (distribution_id, user_id) in links {
        members.entry(distribution_id).or_default().push(user_id);
    }

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let team = members.remove(&id).unwrap_or_default();
            Distribution::assemble(row, team).map_err(|e| {
                error!(distribution_id = id, error = %e, "Stored distribution has an invalid incentive");
                ServiceError::Internal
            })
        })
        .collect()
}

async fn load_one(pool: &MySqlPool, id: u64) -> Result<Distribution, ServiceError> {
    load_distributions(pool, None, None, Some(id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::not_found("Distribution not found"))
}

/// Validated input: month normalized, team de-duplicated, incentive splittable.
fn validated(input: &DistributionInput) -> Result<DistributionInput, ServiceError> {
    let month = required_month(&input.month)?;
    let product_key = required_text(&input.product_key, "Product")?.to_string();

    let team: BTreeSet<u64> = input.team_member_ids.iter().copied().collect();
    if team.contains(&input.supervisor_id) {
        return Err(ServiceError::bad_request(
            "The supervisor cannot also be a team member",
        ));
    }

    for (field, amount) in [
        ("Money collection", Some(input.money_collection)),
        ("Incentive received", input.incentive_received),
        ("Employee incentive", Some(input.employee_incentive)),
    ] {
        if let Some(amount) = amount {
            split_incentive(amount, team.len())
                .map_err(|e| ServiceError::bad_request(format!("{field}: {e}")))?;
        }
    }

    Ok(DistributionInput {
        month,
        supervisor_id: input.supervisor_id,
        team_member_ids: team.into_iter().collect(),
        product_key,
        money_collection: input.money_collection,
        incentive_received: input.incentive_received,
        employee_incentive: input.employee_incentive,
    })
}

/// Supervisor must be an active supervisor, every member an active team member.
async fn check_people(pool: &MySqlPool, input: &DistributionInput) -> Result<(), ServiceError> {
    let supervisor: Option<u8> =
        sqlx::query_scalar("SELECT role_id FROM users WHERE id = ? AND is_active = TRUE")
            .bind(input.supervisor_id)
            .fetch_optional(pool)
            .await?;
    if supervisor != Some(Role::Supervisor.id()) {
        return Err(ServiceError::bad_request("Supervisor not found"));
    }

    if input.team_member_ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; input.team_member_ids.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM users WHERE role_id = ? AND is_active = TRUE AND id IN ({placeholders})"
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(Role::TeamMember.id());
    for id in &input.team_member_ids {
        query = query.bind(*id);
    }

    let found = query.fetch_one(pool).await?;
    if found != input.team_member_ids.len() as i64 {
        return Err(ServiceError::bad_request(
            "Every team member must be an active team member",
        ));
    }
    Ok(())
}

async fn replace_members(
    tx: &mut Transaction<'_, MySql>,
    distribution_id: u64,
    team_member_ids: &[u64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM distribution_members WHERE distribution_id = ?")
        .bind(distribution_id)
        .execute(&mut **tx)
        .await?;

    for user_id in team_member_ids {
        sqlx::query("INSERT INTO distribution_members (distribution_id, user_id) VALUES (?, ?)")
            .bind(distribution_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn warn_unassigned(distribution: &Distribution) {
    if distribution.incentive.pool_unassigned {
        warn!(
            distribution_id = distribution.id,
            pool = distribution.incentive.team_incentive_pool,
            "Distribution has no team members; team pool is unassigned"
        );
    }
}

/// List distributions
#[utoipa::path(
    get,
    path = "/api/planned-collections/distributions",
    params(DistributionQuery),
    responses((status = 200, description = "Distributions with incentive split", body = [Distribution])),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn list_distributions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DistributionQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;

    // supervisors only see their own teams
    let supervisor_id = match auth.role {
        Role::Supervisor => Some(auth.user_id),
        _ => query.supervisor_id,
    };

    let rows = load_distributions(pool.get_ref(), filter.key(), supervisor_id, None).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Create distribution
#[utoipa::path(
    post,
    path = "/api/planned-collections/distributions",
    request_body = DistributionInput,
    responses(
        (status = 201, description = "Distribution created", body = Distribution),
        (status = 400, description = "Invalid payload or negative incentive")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn create_distribution(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<DistributionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let input = validated(&payload)?;
    check_people(pool.get_ref(), &input).await?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO distributions
            (month, supervisor_id, product_key, money_collection, incentive_received, employee_incentive)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.month)
    .bind(input.supervisor_id)
    .bind(&input.product_key)
    .bind(input.money_collection)
    .bind(input.incentive_received)
    .bind(input.employee_incentive)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_id();
    replace_members(&mut tx, id, &input.team_member_ids).await?;
    tx.commit().await?;

    let distribution = load_one(pool.get_ref(), id).await?;
    info!(
        distribution_id = id,
        members = distribution.team_member_ids.len(),
        "Distribution created"
    );
    warn_unassigned(&distribution);

    Ok(HttpResponse::Created().json(distribution))
}

/// Get distribution
#[utoipa::path(
    get,
    path = "/api/planned-collections/distribution/{id}",
    params(("id" = u64, Path, description = "Distribution ID")),
    responses(
        (status = 200, description = "Distribution", body = Distribution),
        (status = 404, description = "Distribution not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn get_distribution(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    let distribution = load_one(pool.get_ref(), path.into_inner()).await?;

    if auth.role == Role::Supervisor && distribution.supervisor_id != auth.user_id {
        return Err(ServiceError::not_found("Distribution not found"));
    }
    Ok(HttpResponse::Ok().json(distribution))
}

/// Replace distribution and its team
#[utoipa::path(
    put,
    path = "/api/planned-collections/distribution/{id}",
    params(("id" = u64, Path, description = "Distribution ID")),
    request_body = DistributionInput,
    responses(
        (status = 200, description = "Distribution updated", body = Distribution),
        (status = 404, description = "Distribution not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update_distribution(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DistributionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let id = path.into_inner();
    let input = validated(&payload)?;
    check_people(pool.get_ref(), &input).await?;

    let mut tx = pool.begin().await?;

    let exists: Option<u64> = sqlx::query_scalar("SELECT id FROM distributions WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ServiceError::not_found("Distribution not found"));
    }

    sqlx::query(
        r#"
        UPDATE distributions
        SET month = ?, supervisor_id = ?, product_key = ?, money_collection = ?,
            incentive_received = ?, employee_incentive = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.month)
    .bind(input.supervisor_id)
    .bind(&input.product_key)
    .bind(input.money_collection)
    .bind(input.incentive_received)
    .bind(input.employee_incentive)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    replace_members(&mut tx, id, &input.team_member_ids).await?;
    tx.commit().await?;

    let distribution = load_one(pool.get_ref(), id).await?;
    warn_unassigned(&distribution);

    Ok(HttpResponse::Ok().json(distribution))
}

/// Delete distribution
#[utoipa::path(
    delete,
    path = "/api/planned-collections/distribution/{id}",
    params(("id" = u64, Path, description = "Distribution ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Distribution not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn delete_distribution(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    // members go with it (ON DELETE CASCADE)
    let result = sqlx::query("DELETE FROM distributions WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Distribution not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(team: Vec<u64>, incentive_received: Option<f64>) -> DistributionInput {
        DistributionInput {
            month: "April 2025".to_string(),
            supervisor_id: 3,
            team_member_ids: team,
            product_key: " Acme Bank - Home Loans ".to_string(),
            money_collection: 20_000.0,
            incentive_received,
            employee_incentive: 0.0,
        }
    }

    #[test]
    fn dedups_team_and_normalizes() {
        let v = validated(&input(vec![7, 5, 7], Some(10_000.0))).unwrap();
        assert_eq!(v.month, "2025-04");
        assert_eq!(v.team_member_ids, vec![5, 7]);
        assert_eq!(v.product_key, "Acme Bank - Home Loans");
    }

    #[test]
    fn negative_incentive_is_bad_request() {
        let err = validated(&input(vec![5], Some(-10.0))).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(ref m) if m.starts_with("Incentive received")));
    }

    #[test]
    fn supervisor_cannot_be_in_own_team() {
        assert!(validated(&input(vec![3, 5], None)).is_err());
    }
}
