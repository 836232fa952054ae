use crate::error::{Result, SyncError};
use crate::people::{PeopleApi, PhoneNumber, PhoneUpdate, PHONE_FIELDS};
use crate::retry::{Pause, RetryPolicy};
use crate::search::search_contacts;
use renumber_core::{normalize_number, MappingFile, MappingRow, NormalizedNumber};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_UPDATE_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub dry_run: bool,
    /// Pause after every successful update.
    pub update_pause: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            update_pause: DEFAULT_UPDATE_PAUSE,
        }
    }
}

/// Progress notices emitted while a mapping file is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    NotFound {
        old: String,
    },
    Mismatched {
        old: String,
        resource_name: String,
        display_name: Option<String>,
    },
    Updated {
        old: String,
        new: String,
        resource_name: String,
        display_name: Option<String>,
        updated_count: usize,
    },
    WouldUpdate {
        old: String,
        new: String,
        resource_name: String,
        display_name: Option<String>,
    },
    RowFailed {
        old: String,
        line: usize,
        error: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub rows: usize,
    pub skipped_rows: usize,
    pub not_found: usize,
    pub mismatched: usize,
    pub updated: usize,
    pub would_update: usize,
    pub failed_rows: usize,
    pub dry_run: bool,
}

/// Drives search, verification and phone replacement for every mapping row.
pub struct Updater<'a> {
    api: &'a mut dyn PeopleApi,
    pause: &'a mut dyn Pause,
    policy: RetryPolicy,
    options: UpdateOptions,
}

impl<'a> Updater<'a> {
    pub fn new(
        api: &'a mut dyn PeopleApi,
        pause: &'a mut dyn Pause,
        policy: RetryPolicy,
        options: UpdateOptions,
    ) -> Self {
        Self {
            api,
            pause,
            policy,
            options,
        }
    }

    /// Processes every row. Failures inside a row are reported through
    /// `on_event` and never stop the batch.
    pub fn run(
        &mut self,
        mappings: &MappingFile,
        on_event: &mut dyn FnMut(&UpdateEvent),
    ) -> UpdateReport {
        let mut report = UpdateReport {
            rows: mappings.rows.len() + mappings.skipped,
            skipped_rows: mappings.skipped,
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for row in &mappings.rows {
            if let Err(err) = self.process_row(row, &mut report, on_event) {
                let old = display_old(row);
                warn!(old = %old, line = row.line, error = %err, "row failed");
                report.failed_rows += 1;
                on_event(&UpdateEvent::RowFailed {
                    old,
                    line: row.line,
                    error: err.to_string(),
                });
            }
        }

        info!(
            updated = report.updated,
            not_found = report.not_found,
            mismatched = report.mismatched,
            failed = report.failed_rows,
            "mapping file processed"
        );
        report
    }

    fn process_row(
        &mut self,
        row: &MappingRow,
        report: &mut UpdateReport,
        on_event: &mut dyn FnMut(&UpdateEvent),
    ) -> Result<()> {
        // A number without digits cannot be on any contact.
        let Some(old) = row.old_number() else {
            report.not_found += 1;
            on_event(&UpdateEvent::NotFound {
                old: row.old_raw.clone(),
            });
            return Ok(());
        };
        let new = row.new_number()?;

        let hits = search_contacts(&mut *self.api, &self.policy, &mut *self.pause, &old);
        if hits.is_empty() {
            report.not_found += 1;
            on_event(&UpdateEvent::NotFound {
                old: old.to_string(),
            });
            return Ok(());
        }

        for hit in hits {
            let display_name = hit.display_name().map(str::to_string);
            let resource_name = hit.resource_name;
            if self.replace_phone(&resource_name, &old, &new, report)? {
                let event = if self.options.dry_run {
                    UpdateEvent::WouldUpdate {
                        old: old.to_string(),
                        new: new.to_string(),
                        resource_name,
                        display_name,
                    }
                } else {
                    UpdateEvent::Updated {
                        old: old.to_string(),
                        new: new.to_string(),
                        resource_name,
                        display_name,
                        updated_count: report.updated,
                    }
                };
                on_event(&event);
                if !self.options.dry_run {
                    self.pause.pause(self.options.update_pause);
                }
            } else {
                report.mismatched += 1;
                on_event(&UpdateEvent::Mismatched {
                    old: old.to_string(),
                    resource_name,
                    display_name,
                });
            }
        }

        Ok(())
    }

    /// Returns `false` when the contact does not carry the old number.
    fn replace_phone(
        &mut self,
        resource_name: &str,
        old: &NormalizedNumber,
        new: &NormalizedNumber,
        report: &mut UpdateReport,
    ) -> Result<bool> {
        let api = &mut *self.api;
        let current = self
            .policy
            .execute(&mut *self.pause, || api.get_person(resource_name, PHONE_FIELDS))?;

        let carries_old = current
            .phone_numbers
            .iter()
            .any(|phone| normalize_number(&phone.value) == old.as_str());
        if !carries_old {
            return Ok(false);
        }

        if self.options.dry_run {
            report.would_update += 1;
            return Ok(true);
        }

        let etag = current.etag.ok_or_else(|| {
            SyncError::Parse(format!("contact {resource_name} has no etag"))
        })?;
        let body = PhoneUpdate {
            etag,
            phone_numbers: vec![PhoneNumber::mobile(new.as_str())],
        };
        self.policy.execute(&mut *self.pause, || {
            api.update_contact(resource_name, PHONE_FIELDS, &body)
        })?;
        report.updated += 1;
        Ok(true)
    }
}

fn display_old(row: &MappingRow) -> String {
    let digits = normalize_number(&row.old_raw);
    if digits.is_empty() {
        row.old_raw.clone()
    } else {
        digits
    }
}
