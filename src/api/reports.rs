use crate::{
    api::{
        attendance::fetch_attendance, distributions::load_distributions, month_filter,
        payouts::fetch_case_entries, planned_collections::fetch_planned,
        received_collections::fetch_received,
    },
    auth::auth::AuthUser,
    domain::{
        collection::{aggregate_collections, collection_totals},
        month::{ALL_MONTHS, MonthFilter, MonthOption, current_month_key, month_options},
        round2,
    },
    error::ServiceError,
    model::{
        MonthQuery,
        report::{CollectionReport, Dashboard},
        role::Role,
    },
};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use futures::TryFutureExt;
use sqlx::MySqlPool;
use tracing::debug;

fn month_value(filter: &MonthFilter) -> String {
    filter.key().unwrap_or(ALL_MONTHS).to_string()
}

/// Planned vs received per label
#[utoipa::path(
    get,
    path = "/api/planned-collections/summary",
    params(MonthQuery),
    responses(
        (status = 200, description = "Planned and received money per label", body = CollectionReport),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn collection_summary(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;

    let (planned, received) = futures::try_join!(
        fetch_planned(pool.get_ref(), filter.key()),
        fetch_received(pool.get_ref(), filter.key()),
    )?;

    let rows = aggregate_collections(&planned, &received);
    let totals = collection_totals(&rows);

    Ok(HttpResponse::Ok().json(CollectionReport {
        month: month_value(&filter),
        rows,
        total_planned_money: totals.total_planned_money,
        total_received_money: totals.total_received_money,
        achievement: totals.achievement,
    }))
}

/// Month dropdown options
#[utoipa::path(
    get,
    path = "/api/planned-collections/months",
    responses((status = 200, description = "`all`, then the current IST month and the four before it", body = [MonthOption])),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn list_months(_auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(month_options(Utc::now()))
}

/// Dashboard totals for a month
///
/// Without `month` the current IST month is used; `month=all` covers everything.
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    params(MonthQuery),
    responses(
        (status = 200, description = "Counts and totals", body = Dashboard),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(&[Role::Admin, Role::Manager, Role::Accounts])?;

    let filter = match query.month.as_deref() {
        None => MonthFilter::Month(current_month_key(Utc::now())),
        raw => month_filter(raw)?,
    };
    let month = filter.key();
    let pool = pool.get_ref();
    debug!(month = ?month, "Building dashboard");

    let (planned, received, distributions, cases, attendance) = futures::try_join!(
        fetch_planned(pool, month).err_into::<ServiceError>(),
        fetch_received(pool, month).err_into::<ServiceError>(),
        load_distributions(pool, month, None, None),
        fetch_case_entries(pool, month).err_into::<ServiceError>(),
        fetch_attendance(pool, month).err_into::<ServiceError>(),
    )?;

    let totals = collection_totals(&aggregate_collections(&planned, &received));

    let supervisor_incentive_total: f64 = distributions
        .iter()
        .map(|d| d.incentive.supervisor_incentive)
        .sum();
    let team_incentive_total: f64 = distributions
        .iter()
        .map(|d| d.incentive.team_incentive_pool)
        .sum();

    Ok(HttpResponse::Ok().json(Dashboard {
        month: month_value(&filter),
        total_planned_money: totals.total_planned_money,
        total_received_money: totals.total_received_money,
        achievement: totals.achievement,
        distribution_count: distributions.len(),
        supervisor_incentive_total: round2(supervisor_incentive_total),
        team_incentive_total: round2(team_incentive_total),
        unassigned_pool_count: distributions
            .iter()
            .filter(|d| d.incentive.pool_unassigned)
            .count(),
        case_count: cases.iter().map(|c| u64::from(c.number_of_cases)).sum(),
        payout_salary_total: round2(cases.iter().map(|c| c.salary).sum()),
        attendance_count: attendance.len(),
        fixed_salary_total: round2(attendance.iter().map(|a| a.salary).sum()),
    }))
}
