// Alert log presentation
//
// The store delivers the complete alert set on every change. The presenter
// rebuilds a timestamp-descending sequence and a day grouping from each
// snapshot; filters are applied after grouping and drop days that end up empty.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alert::{AlertFilter, AlertRecord};
use crate::error::{MonitorError, Result};

/// Alerts of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertDayGroup {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-03-01"))]
    pub day: NaiveDate,
    pub alerts: Vec<AlertRecord>,
}

/// Filtered, grouped alert log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertLogView {
    /// Active filter (`all`, `temperature`, `fall` or `mood`)
    pub filter: String,
    /// Number of alerts matching the filter
    pub total: usize,
    /// Days in descending order
    pub groups: Vec<AlertDayGroup>,
}

/// Build a fixed offset from minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            MonitorError::config(format!("UTC offset out of range: {} minutes", minutes))
        })
}

/// Order records newest first; ties broken by id so the order is stable across snapshots
pub fn sort_newest_first(records: &mut [AlertRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
}

/// Group records by calendar day in the given offset, newest day first.
/// Order within a day follows the input order.
pub fn group_by_day(records: &[AlertRecord], offset: FixedOffset) -> Vec<AlertDayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<AlertRecord>> = BTreeMap::new();
    for record in records {
        let day = record.timestamp.with_timezone(&offset).date_naive();
        days.entry(day).or_default().push(record.clone());
    }
    days.into_iter()
        .rev()
        .map(|(day, alerts)| AlertDayGroup { day, alerts })
        .collect()
}

/// Apply a filter to grouped alerts, removing days without matches
pub fn filter_groups(groups: &[AlertDayGroup], filter: AlertFilter) -> Vec<AlertDayGroup> {
    groups
        .iter()
        .filter_map(|group| {
            let alerts: Vec<AlertRecord> = group
                .alerts
                .iter()
                .filter(|a| filter.matches(a))
                .cloned()
                .collect();
            (!alerts.is_empty()).then(|| AlertDayGroup {
                day: group.day,
                alerts,
            })
        })
        .collect()
}

/// Keeps the latest alert snapshot in display form
#[derive(Debug, Clone)]
pub struct AlertLogPresenter {
    offset: FixedOffset,
    records: Vec<AlertRecord>,
    groups: Vec<AlertDayGroup>,
    loaded: bool,
}

impl AlertLogPresenter {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            records: Vec::new(),
            groups: Vec::new(),
            loaded: false,
        }
    }

    /// Replace the state with a complete snapshot from the store
    pub fn apply_snapshot(&mut self, mut records: Vec<AlertRecord>) {
        sort_newest_first(&mut records);
        self.groups = group_by_day(&records, self.offset);
        self.records = records;
        self.loaded = true;
    }

    /// Drop everything locally after a clear-all
    pub fn clear(&mut self) {
        self.records.clear();
        self.groups.clear();
    }

    /// Whether a snapshot has arrived yet
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Records newest first, filtered
    pub fn records(&self, filter: AlertFilter) -> Vec<AlertRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub fn view(&self, filter: AlertFilter) -> AlertLogView {
        let groups = match filter {
            AlertFilter::All => self.groups.clone(),
            AlertFilter::Kind(_) => filter_groups(&self.groups, filter),
        };
        let total = groups.iter().map(|g| g.alerts.len()).sum();
        AlertLogView {
            filter: filter.to_string(),
            total,
            groups,
        }
    }
}
