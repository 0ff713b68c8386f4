use anyhow::{Context, Result};

use super::{api_url, check_response, get_api_client, OutputFormat};
use crate::models::{Booking, CreateBookingBody, ModeParams, UpdateBookingBody};

impl std::fmt::Display for Booking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Booking: {}", self.id)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(
            f,
            "Time: {} - {}",
            self.start.format("%Y-%m-%d %H:%M %Z"),
            self.end.format("%H:%M %Z")
        )?;
        writeln!(f, "Service: {}", self.service_id)?;
        writeln!(f, "Customer: {}", self.customer_id)?;
        if let Some(staff) = &self.staff_id {
            writeln!(f, "Staff: {}", staff)?;
        }
        if let Some(usage) = &self.resource_usage {
            writeln!(f, "Resource: {} x{}", usage.resource_type_id, usage.quantity)?;
        }
        if let Some(notes) = &self.notes {
            writeln!(f, "Notes: {}", notes)?;
        }
        Ok(())
    }
}

/// Arguments for `bookd book`
#[derive(Debug, Clone)]
pub struct BookArgs {
    pub customer: String,
    pub business: String,
    pub service: String,
    pub at: String,
    pub mode: ModeParams,
    pub notes: Option<String>,
    pub no_overlap: bool,
}

/// Commit a booking
pub async fn run_book(args: BookArgs, format: OutputFormat) -> Result<()> {
    let body = CreateBookingBody {
        customer_id: args.customer,
        business_id: args.business,
        service_id: args.service,
        booking_time: args.at,
        mode: args.mode,
        notes: args.notes,
        prevent_customer_overlap: args.no_overlap,
    };

    let client = get_api_client()?;
    let resp = client
        .post(api_url("bookings"))
        .json(&body)
        .send()
        .await
        .context("Failed to create booking")?;
    let resp = check_response(resp, "create booking").await?;

    let booking: Booking = resp.json().await.context("Failed to parse response")?;
    format.print(&booking);
    Ok(())
}

/// Change an existing booking
pub async fn run_update(booking_id: &str, body: UpdateBookingBody, format: OutputFormat) -> Result<()> {
    let client = get_api_client()?;
    let resp = client
        .patch(api_url(&format!("bookings/{}", booking_id)))
        .json(&body)
        .send()
        .await
        .context("Failed to update booking")?;
    let resp = check_response(resp, "update booking").await?;

    let booking: Booking = resp.json().await.context("Failed to parse response")?;
    format.print(&booking);
    Ok(())
}

/// Cancel a booking by ID
pub async fn run_cancel(booking_id: &str, format: OutputFormat) -> Result<()> {
    let client = get_api_client()?;
    let resp = client
        .post(api_url(&format!("bookings/{}/cancel", booking_id)))
        .send()
        .await
        .context("Failed to cancel booking")?;
    let resp = check_response(resp, "cancel booking").await?;

    let booking: Booking = resp.json().await.context("Failed to parse response")?;
    format.print(&booking);
    Ok(())
}

/// Show a booking by ID
pub async fn run_show(booking_id: &str, format: OutputFormat) -> Result<()> {
    let client = get_api_client()?;
    let resp = client
        .get(api_url(&format!("bookings/{}", booking_id)))
        .send()
        .await
        .context("Failed to fetch booking")?;
    let resp = check_response(resp, "fetch booking").await?;

    let booking: Booking = resp.json().await.context("Failed to parse response")?;
    format.print(&booking);
    Ok(())
}
