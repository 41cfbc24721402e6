use crate::client::error::{ClientError, ClientResult};
use crate::client::http::ApiClient;
use crate::domain::collection::{
    CollectionSummary, CollectionTotals, aggregate_collections, collection_totals,
};
use crate::domain::month::MonthFilter;
use crate::model::attendance::AttendanceRecord;
use crate::model::collection::{PlannedCollection, ReceivedCollection};
use crate::model::distribution::Distribution;
use crate::model::payout::CaseEntry;

/// Everything the monthly report screen shows.
#[derive(Debug, Clone)]
pub struct ReportData {
    /// `YYYY-MM`, or `all`
    pub month: String,
    pub planned: Vec<PlannedCollection>,
    pub received: Vec<ReceivedCollection>,
    pub distributions: Vec<Distribution>,
    pub case_entries: Vec<CaseEntry>,
    pub attendance: Vec<AttendanceRecord>,
    pub summary: Vec<CollectionSummary>,
    pub totals: CollectionTotals,
}

fn with_month(path: &str, filter: &MonthFilter) -> String {
    match filter.key() {
        Some(key) => format!("{path}?month={key}"),
        None => format!("{path}?month=all"),
    }
}

impl ApiClient {
    /// Fetch the five monthly resources concurrently and reconcile planned
    /// against received locally. Any failure fails the whole report.
    pub async fn fetch_report_data(&self, month: Option<&str>) -> ClientResult<ReportData> {
        let filter = MonthFilter::parse(month).map_err(|message| ClientError::Api {
            status: 400,
            message,
        })?;

        let planned_path = with_month("planned-collections", &filter);
        let received_path = with_month("planned-collections/recived", &filter);
        let distributions_path = with_month("planned-collections/distributions", &filter);
        let cases_path = with_month("payout-verifications", &filter);
        let attendance_path = with_month("attendance", &filter);

        let (planned, received, distributions, case_entries, attendance) = futures::try_join!(
            self.get::<Vec<PlannedCollection>>(&planned_path),
            self.get::<Vec<ReceivedCollection>>(&received_path),
            self.get::<Vec<Distribution>>(&distributions_path),
            self.get::<Vec<CaseEntry>>(&cases_path),
            self.get::<Vec<AttendanceRecord>>(&attendance_path),
        )?;

        let summary = aggregate_collections(&planned, &received);
        let totals = collection_totals(&summary);

        Ok(ReportData {
            month: filter.key().unwrap_or("all").to_string(),
            planned,
            received,
            distributions,
            case_entries,
            attendance,
            summary,
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_query_is_normalized() {
        let filter = MonthFilter::parse(Some("March 2025")).unwrap();
        assert_eq!(with_month("attendance", &filter), "attendance?month=2025-03");
        assert_eq!(
            with_month("attendance", &MonthFilter::All),
            "attendance?month=all"
        );
    }
}
