//! Spreadsheet export of the record log.
//!
//! ```text
//! GET /api/v1/records/export?from=2026-08-01&to=2026-08-08&context=LEITURA&divergentOnly=true
//! GET /api/v1/records/export/preview?from=...&to=...
//! ```
//!
//! The download is CSV encoded as UTF-8 with a byte-order mark so spreadsheet
//! tools render accented operator names correctly, one row per entry,
//! ascending by timestamp.

use actix_web::{HttpResponse, get, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RecordStoreError;
use crate::domain::record::{RecordEntry, RecordQuery};
use crate::domain::scan::ScreenContext;
use crate::domain::Error;

use super::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;

/// UTF-8 byte-order mark; spreadsheet tools use it to pick the right
/// decoder.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Column header row of the export.
pub const EXPORT_HEADER: [&str; 8] = [
    "recorded_at",
    "operator",
    "context",
    "transport",
    "order",
    "divergent",
    "authorized_by",
    "reason",
];

/// Query string shared by the export and its preview.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    /// First day of the range (inclusive).
    #[schema(value_type = String, example = "2026-08-01")]
    pub from: NaiveDate,
    /// Last day of the range (inclusive).
    #[schema(value_type = String, example = "2026-08-08")]
    pub to: NaiveDate,
    /// Restrict to one screen context; absent means all.
    #[serde(default)]
    pub context: Option<ScreenContext>,
    /// Keep only divergent entries.
    #[serde(default)]
    pub divergent_only: bool,
}

impl ExportParams {
    fn to_query(&self) -> Result<RecordQuery, Error> {
        if self.from > self.to {
            return Err(Error::invalid_request("date range start is after its end"));
        }
        Ok(RecordQuery {
            from: self.from,
            to: self.to,
            context: self.context,
            divergent_only: self.divergent_only,
        })
    }

    fn filename(&self) -> String {
        let mut name = format!(
            "records_{}_{}",
            self.from.format("%Y%m%d"),
            self.to.format("%Y%m%d")
        );
        if let Some(context) = self.context {
            name.push('_');
            name.push_str(&context.as_str().to_lowercase());
        }
        if self.divergent_only {
            name.push_str("_divergences");
        }
        name.push_str(".csv");
        name
    }
}

/// Response for the export preview.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreview {
    /// How many entries the filter matches.
    pub count: usize,
}

fn map_record_error(error: RecordStoreError) -> Error {
    match error {
        RecordStoreError::Connection { message } | RecordStoreError::Corrupt { message } => {
            Error::service_unavailable(message)
        }
        RecordStoreError::Query { message } => Error::internal(message),
    }
}

/// Render entries as BOM-prefixed CSV bytes.
fn render_csv(entries: &[RecordEntry]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|err| Error::internal(err.to_string()))?;
    for entry in entries {
        writer
            .write_record([
                entry.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.operator.clone(),
                entry.context.as_str().to_owned(),
                entry.transport.as_ref().to_owned(),
                entry.order.as_ref().to_owned(),
                if entry.divergent { "1" } else { "0" }.to_owned(),
                entry.authorized_by.clone().unwrap_or_default(),
                entry.reason.clone().unwrap_or_default(),
            ])
            .map_err(|err| Error::internal(err.to_string()))?;
    }
    let csv_bytes = writer
        .into_inner()
        .map_err(|err| Error::internal(err.to_string()))?;

    let mut payload = Vec::with_capacity(UTF8_BOM.len() + csv_bytes.len());
    payload.extend_from_slice(UTF8_BOM);
    payload.extend_from_slice(&csv_bytes);
    Ok(payload)
}

/// Download matching entries as a CSV file.
#[utoipa::path(
    get,
    path = "/api/v1/records/export",
    params(
        ("from" = String, Query, description = "First day, YYYY-MM-DD"),
        ("to" = String, Query, description = "Last day, YYYY-MM-DD"),
        ("context" = Option<String>, Query, description = "LEITURA or VARIOS"),
        ("divergentOnly" = Option<bool>, Query, description = "Divergent entries only")
    ),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 400, description = "Invalid range", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["records"],
    operation_id = "exportRecords"
)]
#[get("/records/export")]
pub async fn export_records(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ExportParams>,
) -> ApiResult<HttpResponse> {
    let _ = session.require_identity()?;
    let query = params.to_query()?;
    let entries = state
        .records
        .query(&query)
        .await
        .map_err(map_record_error)?;
    let payload = render_csv(&entries)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", params.filename()),
        ))
        .body(payload))
}

/// Row count for the current filter, shown before downloading.
#[utoipa::path(
    get,
    path = "/api/v1/records/export/preview",
    params(
        ("from" = String, Query, description = "First day, YYYY-MM-DD"),
        ("to" = String, Query, description = "Last day, YYYY-MM-DD"),
        ("context" = Option<String>, Query, description = "LEITURA or VARIOS"),
        ("divergentOnly" = Option<bool>, Query, description = "Divergent entries only")
    ),
    responses(
        (status = 200, description = "Match count", body = ExportPreview),
        (status = 400, description = "Invalid range", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["records"],
    operation_id = "previewExport"
)]
#[get("/records/export/preview")]
pub async fn preview_export(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ExportParams>,
) -> ApiResult<web::Json<ExportPreview>> {
    let _ = session.require_identity()?;
    let query = params.to_query()?;
    let entries = state
        .records
        .query(&query)
        .await
        .map_err(map_record_error)?;
    Ok(web::Json(ExportPreview {
        count: entries.len(),
    }))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for CSV rendering and filename shaping.
    use chrono::TimeZone;
    use chrono::Utc;

    use crate::domain::scan::ScanCode;

    use super::*;

    fn entry() -> RecordEntry {
        RecordEntry::divergent(
            Utc.with_ymd_and_hms(2026, 8, 2, 14, 30, 0)
                .single()
                .expect("valid timestamp"),
            "joão",
            ScreenContext::Single,
            ScanCode::sanitize("AAA1111111"),
            ScanCode::sanitize("BBB2222222"),
            "chief",
            "label swapped",
        )
        .expect("valid entry")
    }

    #[test]
    fn csv_starts_with_the_bom_and_header() {
        let payload = render_csv(&[entry()]).expect("render");
        assert_eq!(&payload[..3], UTF8_BOM);
        let text = String::from_utf8(payload[3..].to_vec()).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("recorded_at,operator,context,transport,order,divergent,authorized_by,reason")
        );
        let row = lines.next().expect("one data row");
        assert!(row.contains("2026-08-02 14:30:00"));
        assert!(row.contains("joão"));
        assert!(row.contains(",1,chief,label swapped"));
    }

    #[test]
    fn empty_results_still_carry_the_header() {
        let payload = render_csv(&[]).expect("render");
        let text = String::from_utf8(payload[3..].to_vec()).expect("utf8");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn filenames_reflect_the_filter() {
        let params = ExportParams {
            from: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            to: NaiveDate::from_ymd_opt(2026, 8, 8).expect("valid date"),
            context: Some(ScreenContext::Batch),
            divergent_only: true,
        };
        assert_eq!(params.filename(), "records_20260801_20260808_varios_divergences.csv");
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let params = ExportParams {
            from: NaiveDate::from_ymd_opt(2026, 8, 8).expect("valid date"),
            to: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            context: None,
            divergent_only: false,
        };
        assert!(params.to_query().is_err());
    }
}
