use crate::models::DataPoint;
use super::DataSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use yahoo_finance_api as yahoo;
use time::OffsetDateTime;

/// Daily adjusted closes over a fixed date range.
pub struct YahooFetcher {
    start: NaiveDate,
    end: NaiveDate,
}

impl YahooFetcher {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Midnight UTC of `date` in the `time` crate's representation, which is
/// what the Yahoo client takes.
fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date: {}", date))?;
    OffsetDateTime::from_unix_timestamp(midnight.and_utc().timestamp())
        .map_err(|e| anyhow!("Date out of range for Yahoo request: {}", e))
}

#[async_trait]
impl DataSource for YahooFetcher {
    fn name(&self) -> &str {
        "Yahoo"
    }

    async fn fetch_data(&self, symbol: &str) -> Result<Vec<DataPoint>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| anyhow!("Failed to init Yahoo Connector: {}", e))?;

        // End is exclusive on Yahoo's side
        let start = to_offset_datetime(self.start)?;
        let end = to_offset_datetime(self.end.succ_opt().unwrap_or(self.end))?;

        let resp = provider.get_quote_history(symbol, start, end).await
            .map_err(|e| anyhow!("Yahoo API Error: {}", e))?;

        let quotes = resp.quotes()
            .map_err(|e| anyhow!("Failed to parse Yahoo quotes: {}", e))?;

        let mut data_points = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let timestamp = DateTime::from_timestamp(quote.timestamp as i64, 0)
                .ok_or_else(|| anyhow!("Invalid quote timestamp {} for {}", quote.timestamp, symbol))?;
            // Adjusted close, so splits and dividends do not show up as returns
            data_points.push(DataPoint::new(timestamp.date_naive(), quote.adjclose));
        }

        if data_points.is_empty() {
            return Err(anyhow!("No data returned for symbol: {}", symbol));
        }

        data_points.sort_by_key(|k| k.date);

        Ok(data_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_conversion_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let odt = to_offset_datetime(date).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_710_460_800);
        assert_eq!(odt.hour(), 0);
    }
}
