use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::schedule::DayWindow;

/// Which resources must be validated when checking or reserving a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    #[default]
    TimeOnly,
    StaffOnly,
    ResourceOnly,
    StaffAndResource,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::TimeOnly => "time_only",
            AllocationMode::StaffOnly => "staff_only",
            AllocationMode::ResourceOnly => "resource_only",
            AllocationMode::StaffAndResource => "staff_and_resource",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "time_only" => Some(AllocationMode::TimeOnly),
            "staff_only" => Some(AllocationMode::StaffOnly),
            "resource_only" => Some(AllocationMode::ResourceOnly),
            "staff_and_resource" => Some(AllocationMode::StaffAndResource),
            _ => None,
        }
    }

    pub fn requires_staff(&self) -> bool {
        matches!(
            self,
            AllocationMode::StaffOnly | AllocationMode::StaffAndResource
        )
    }

    pub fn requires_resource(&self) -> bool {
        matches!(
            self,
            AllocationMode::ResourceOnly | AllocationMode::StaffAndResource
        )
    }

    /// Only time-only businesses serve one booking at a time
    pub fn is_exclusive(&self) -> bool {
        matches!(self, AllocationMode::TimeOnly)
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub allocation_mode: AllocationMode,
    /// IANA zone name; UTC when unset
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingHoursPeriod {
    pub business_id: String,
    pub day_of_week: u8,
    pub window: DayWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub required_resource_types: Vec<String>,
}

impl Service {
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub business_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Recurring weekly window
    Schedule { day_of_week: u8 },
    /// Date-specific override
    Exception { date: NaiveDate },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAvailabilityRule {
    pub staff_id: String,
    pub kind: RuleKind,
    pub window: DayWindow,
}

impl StaffAvailabilityRule {
    pub fn is_exception(&self) -> bool {
        matches!(self.kind, RuleKind::Exception { .. })
    }

    /// An exception spanning the whole day, which blocks the date outright
    pub fn is_full_day_block(&self) -> bool {
        self.is_exception() && self.window.is_full_day()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub total_capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}
