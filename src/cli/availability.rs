use anyhow::{Context, Result};

use super::{api_url, check_response, get_api_client, OutputFormat};
use crate::config::LocalConfig;
use crate::models::{AvailabilityQuery, AvailabilityResponse, ModeParams};

impl std::fmt::Display for AvailabilityResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.slots.is_empty() {
            writeln!(f, "No available slots found in the specified window.")?;
        } else {
            writeln!(f, "Available slots:")?;
            for slot in &self.slots {
                writeln!(f, "  {} - {}", slot.local_start, slot.local_end)?;
            }
        }
        Ok(())
    }
}

/// Arguments for `bookd avail`
#[derive(Debug, Clone)]
pub struct AvailArgs {
    pub business: String,
    pub service: String,
    pub from: String,
    pub to: String,
    pub interval: Option<u32>,
    pub mode: ModeParams,
    pub customer: Option<String>,
    pub timezone: Option<String>,
}

/// Query bookable slots
pub async fn run_avail(args: AvailArgs, format: OutputFormat) -> Result<()> {
    // Fall back to the configured display zone
    let timezone = match args.timezone {
        Some(tz) => Some(tz),
        None => LocalConfig::load().ok().and_then(|c| c.timezone),
    };

    let query = AvailabilityQuery {
        business_id: args.business,
        service_id: args.service,
        window_start: args.from,
        window_end: args.to,
        interval_minutes: args.interval,
        mode: args.mode,
        customer_id: args.customer,
        timezone,
    };

    let client = get_api_client()?;
    let resp = client
        .post(api_url("availability"))
        .json(&query)
        .send()
        .await
        .context("Failed to query availability")?;
    let resp = check_response(resp, "query availability").await?;

    let response: AvailabilityResponse = resp.json().await.context("Failed to parse response")?;
    format.print(&response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailableSlot;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_display_lists_local_times() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let response = AvailabilityResponse {
            slots: vec![AvailableSlot {
                start,
                end: start + chrono::Duration::minutes(30),
                local_start: "2026-03-02T10:00:00+01:00".to_string(),
                local_end: "2026-03-02T10:30:00+01:00".to_string(),
            }],
        };
        let text = response.to_string();
        assert!(text.contains("2026-03-02T10:00:00+01:00 - 2026-03-02T10:30:00+01:00"));

        let empty = AvailabilityResponse { slots: vec![] };
        assert!(empty.to_string().starts_with("No available slots"));
    }
}
