use async_trait::async_trait;
use crate::models::DataPoint;
use super::DataSource;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

pub struct FredFetcher {
    api_key: String,
    client: Client,
    observation_start: NaiveDate,
}

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

impl FredFetcher {
    pub fn new(api_key: String, observation_start: NaiveDate) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("MacroConditions/1.0"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client, observation_start }
    }
}

#[async_trait]
impl DataSource for FredFetcher {
    fn name(&self) -> &str {
        "FRED"
    }

    async fn fetch_data(&self, series_id: &str) -> Result<Vec<DataPoint>> {
        let sanitized_key = self.api_key.trim().to_lowercase();
        if sanitized_key.is_empty() {
            return Err(anyhow!("FRED API Key is empty or missing!"));
        }
        if sanitized_key.len() != 32 {
            warn!("FRED API Key length is {}, not 32! This will likely fail.", sanitized_key.len());
        }

        let url = format!(
            "https://api.stlouisfed.org/fred/series/observations?series_id={}&api_key={}&file_type=json&observation_start={}",
            series_id,
            sanitized_key,
            self.observation_start.format("%Y-%m-%d")
        );

        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("FRED API Error: {} - Body: {}", status, error_text));
        }

        let json: Value = resp.json().await?;
        let points = Self::parse_observations(&json)?;
        debug!("FRED {}: {} observations since {}", series_id, points.len(), self.observation_start);
        Ok(points)
    }
}

impl FredFetcher {
    fn parse_observations(json: &Value) -> Result<Vec<DataPoint>> {
        let observations = json["observations"]
            .as_array()
            .ok_or_else(|| anyhow!("No observations found in FRED response"))?;

        let mut data_points = Vec::new();

        for obs in observations {
            // "date": "2023-01-01", "value": "123.45"
            if let (Some(date_str), Some(value_str)) = (obs["date"].as_str(), obs["value"].as_str()) {
                // "." marks a missing observation (holidays, unpublished days)
                if value_str == "." {
                    continue;
                }

                if let Ok(value) = value_str.parse::<f64>() {
                    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")?;
                    data_points.push(DataPoint::new(date, value));
                }
            }
        }

        Ok(data_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_response() {
        let json_data = json!({
            "observations": [
                { "date": "2023-01-01", "value": "4.33" },
                { "date": "2023-01-02", "value": "4.31" }
            ]
        });

        let points = FredFetcher::parse_observations(&json_data).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(points[0].value, 4.33);
        assert_eq!(points[1].value, 4.31);
    }

    #[test]
    fn test_parse_missing_value() {
        let json_data = json!({
            "observations": [
                { "date": "2023-01-01", "value": "." },
                { "date": "2023-01-02", "value": "100.0" }
            ]
        });

        let points = FredFetcher::parse_observations(&json_data).unwrap();
        assert_eq!(points.len(), 1); // "." should be skipped
        assert_eq!(points[0].value, 100.0);
    }

    #[test]
    fn test_parse_invalid_format() {
        let json_data = json!({ "error_message": "Bad Request. Variable api_key is not set." });
        let result = FredFetcher::parse_observations(&json_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bad_date_is_an_error() {
        let json_data = json!({
            "observations": [ { "date": "01/02/2023", "value": "1.0" } ]
        });
        assert!(FredFetcher::parse_observations(&json_data).is_err());
    }

    #[tokio::test]
    async fn test_empty_key_fails_before_request() {
        let fetcher = FredFetcher::new("   ".to_string(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let err = fetcher.fetch_data("DGS10").await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
