use std::time::Duration;
use tokio::time::sleep;
use rand::Rng;

use crate::indicators::registry::SourceType;

pub struct RateLimiter;

impl RateLimiter {
    /// Delay range in milliseconds before the next request to `source`.
    pub fn delay_range(source: SourceType) -> (u64, u64) {
        match source {
            // FRED allows 120 requests/minute per key; jitter keeps bursts off the WAF
            SourceType::Fred => (500, 1000),
            SourceType::Yahoo => (250, 750),
        }
    }

    /// Wait appropriate duration based on the data source
    pub async fn wait(source: SourceType) {
        let (lo, hi) = Self::delay_range(source);
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(lo..hi)
        };
        sleep(Duration::from_millis(delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_non_empty() {
        for source in [SourceType::Fred, SourceType::Yahoo] {
            let (lo, hi) = RateLimiter::delay_range(source);
            assert!(lo < hi);
        }
    }
}
