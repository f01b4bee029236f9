//! Google Sheets collector: appends one row per record to the worksheet
//! named after the record's budget type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::collector::{Collector, StorageError};
use crate::wizard::record::MoneyFlowRecord;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const COLLECTOR_NAME: &str = "sheets";

#[derive(Serialize)]
struct AppendRequest {
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize, Debug)]
struct AppendResponse {
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

pub struct SheetsCollector {
    client: reqwest::Client,
    spreadsheet_id: String,
    api_token: String,
    /// One spreadsheet, one append at a time.
    lock: Mutex<()>,
}

impl SheetsCollector {
    pub fn new(spreadsheet_id: String, api_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            spreadsheet_id,
            api_token,
            lock: Mutex::new(()),
        }
    }

    fn append_url(&self, worksheet: &str) -> String {
        format!(
            "{SHEETS_API_URL}/{}/values/{}!A1:append?valueInputOption=USER_ENTERED",
            self.spreadsheet_id,
            urlencoding::encode(worksheet)
        )
    }
}

/// Row layout: date, category, value, comment. The worksheet already names
/// the budget type; the currency column keeps mixed-currency sheets readable.
fn row_values(record: &MoneyFlowRecord) -> Vec<Value> {
    vec![
        Value::from(record.date.format("%d.%m.%Y").to_string()),
        Value::from(record.budget.category_label()),
        Value::from(record.value),
        Value::from(record.currency.label()),
        Value::from(record.comment.clone().unwrap_or_default()),
    ]
}

#[async_trait]
impl Collector for SheetsCollector {
    fn name(&self) -> &str {
        COLLECTOR_NAME
    }

    async fn save(&self, record: &MoneyFlowRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;

        let worksheet = record.budget.budget_type().label();
        let url = self.append_url(worksheet);
        let request = AppendRequest {
            values: vec![row_values(record)],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| StorageError::new(COLLECTOR_NAME, format!("HTTP error: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::new(COLLECTOR_NAME, format!("Failed to read response: {e}")))?;

        debug!("Sheets append status: {status}");

        if !status.is_success() {
            return Err(StorageError::new(
                COLLECTOR_NAME,
                format!("API error {status}: {body}"),
            ));
        }

        if let Ok(parsed) = serde_json::from_str::<AppendResponse>(&body)
            && let Some(error) = parsed.error
        {
            return Err(StorageError::new(
                COLLECTOR_NAME,
                format!("Sheets error: {}", error.message),
            ));
        }

        info!("📊 Appended record to worksheet '{worksheet}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::record::{Budget, BudgetType, Currency};
    use chrono::NaiveDate;

    fn record(comment: Option<&str>) -> MoneyFlowRecord {
        MoneyFlowRecord {
            budget: Budget::new(BudgetType::DailySpent, "Food").unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
            value: 23.5,
            currency: Currency::Eur,
            comment: comment.map(|c| c.to_string()),
        }
    }

    #[test]
    fn test_append_url_targets_budget_type_worksheet() {
        let collector = SheetsCollector::new("sheet-id".to_string(), "token".to_string());
        let url = collector.append_url("Daily");

        assert_eq!(
            url,
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/Daily!A1:append?valueInputOption=USER_ENTERED"
        );
    }

    #[test]
    fn test_row_layout() {
        let row = row_values(&record(Some("lunch")));

        assert_eq!(row[0], Value::from("15.06.2026"));
        assert_eq!(row[1], Value::from("Food"));
        assert_eq!(row[2], Value::from(23.5));
        assert_eq!(row[3], Value::from("EUR"));
        assert_eq!(row[4], Value::from("lunch"));
    }

    #[test]
    fn test_missing_comment_becomes_empty_cell() {
        let row = row_values(&record(None));
        assert_eq!(row[4], Value::from(""));
    }
}
