//! Command implementations for the turnario CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use miette::Result;
use tracing::{info, warn};

use turnario_core::{
    AbsenceStatus, DoctorRoster, FixedHolidays, HolidayLookup, NoHolidays, RosterError, Session,
    export,
};
use turnario_store::{BackupCache, RemoteStore, RetryPolicy, StoreError};

use crate::{RosterAction, StoreArgs};

impl StoreArgs {
    fn remote(&self) -> Arc<RemoteStore> {
        Arc::new(
            RemoteStore::with_timeout(
                self.api_base.as_str(),
                self.token.as_str(),
                Duration::from_secs(self.timeout_secs),
            )
            .with_branch(self.branch.as_str()),
        )
    }

    fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    fn backup(&self) -> BackupCache {
        match &self.backup_dir {
            Some(dir) => BackupCache::new(dir),
            None => BackupCache::new(BackupCache::default_dir()),
        }
    }

    async fn load_roster(&self) -> Result<DoctorRoster> {
        let roster =
            DoctorRoster::load(self.remote(), self.retry(), self.backup(), self.path.as_str())
                .await
                .map_err(|e| miette::miette!("{}", e))?;
        if roster.is_degraded() {
            warn!("remote store unreachable: working from local backup data, writes will fail");
        }
        Ok(roster)
    }
}

/// Run a roster subcommand.
pub async fn run_roster(store: &StoreArgs, action: RosterAction) -> Result<()> {
    let mut roster = store.load_roster().await?;

    match action {
        RosterAction::List => {
            if roster.names().is_empty() {
                println!("(no doctors)");
            }
            for name in roster.names() {
                println!("{}", name);
            }
        }
        RosterAction::Add { name } => {
            let added = roster.add(&name).await.map_err(surface)?;
            info!(doctor = %added, "roster updated");
            println!("added {}", added);
        }
        RosterAction::Remove { name } => {
            let removed = roster.remove(&name).await.map_err(surface)?;
            info!(doctor = %removed, "roster updated");
            println!("removed {}", removed);
        }
    }
    Ok(())
}

/// Run the grid subcommand.
#[allow(clippy::too_many_arguments)]
pub async fn run_grid(
    store: &StoreArgs,
    year: i32,
    month: u32,
    doctors: Option<Vec<String>>,
    holidays_file: Option<&Path>,
    country: &str,
    edits: &[String],
    csv: Option<&Path>,
) -> Result<()> {
    let roster = store.load_roster().await?;

    let selected: Vec<String> = match doctors {
        Some(names) => names,
        None => roster.names().iter().map(|n| n.as_str().to_string()).collect(),
    };
    if selected.is_empty() {
        println!("(no doctors to plan)");
        return Ok(());
    }

    let lookup = load_holidays(holidays_file, country).await;
    let mut session = Session::new(roster, lookup, country, year, month)
        .map_err(|e| miette::miette!("{}", e))?;
    session
        .on_select_doctors(&selected)
        .map_err(|e| miette::miette!("{}", e))?;

    for edit in edits {
        let (date, doctor, status) = parse_edit(edit)?;
        session
            .on_cell_edit(date, &doctor, status)
            .map_err(|e| miette::miette!("{}", e))?;
    }

    let grid = session
        .grid()
        .ok_or_else(|| miette::miette!("no grid was generated"))?;
    print_grid(grid);

    if let Some(target) = csv {
        let path = if target.is_dir() {
            target.join(export::export_file_name(year, month))
        } else {
            target.to_path_buf()
        };
        tokio::fs::write(&path, export::to_csv(grid))
            .await
            .map_err(|e| miette::miette!("cannot write {}: {}", path.display(), e))?;
        println!("exported {}", path.display());
    }

    Ok(())
}

/// Load the holiday table, degrading to no holidays on any failure.
async fn load_holidays(
    file: Option<&Path>,
    country: &str,
) -> Arc<dyn HolidayLookup + Send + Sync> {
    let Some(file) = file else {
        return Arc::new(NoHolidays);
    };

    match tokio::fs::read_to_string(file).await {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(value) => {
                let table = FixedHolidays::from_json(country, &value);
                info!(count = table.len(), file = %file.display(), "holiday table loaded");
                Arc::new(table)
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "holiday table unreadable, proceeding without");
                Arc::new(NoHolidays)
            }
        },
        Err(e) => {
            warn!(file = %file.display(), error = %e, "holiday table unreadable, proceeding without");
            Arc::new(NoHolidays)
        }
    }
}

/// Parse a `DATE=DOCTOR=STATUS` cell edit.
fn parse_edit(raw: &str) -> Result<(NaiveDate, String, AbsenceStatus)> {
    let mut parts = raw.splitn(3, '=');
    let (Some(date), Some(doctor), Some(status)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(miette::miette!(
            "invalid edit '{}', expected DATE=DOCTOR=STATUS",
            raw
        ));
    };

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| miette::miette!("invalid date in edit '{}': {}", raw, e))?;
    let status = status
        .parse::<AbsenceStatus>()
        .map_err(|e| miette::miette!("invalid status in edit '{}': {}", raw, e))?;
    Ok((date, doctor.to_string(), status))
}

fn print_grid(grid: &turnario_core::ScheduleGrid) {
    let doctors: Vec<_> = grid.doctors().iter().collect();

    print!("{:<12} {:<10} {:<24}", "Date", "Day", "Holiday");
    for doctor in &doctors {
        print!(" {:<16}", doctor.as_str());
    }
    println!();

    for row in grid.rows() {
        let mut holiday = row.holiday_name().to_string();
        if row.clinic_day {
            holiday = "(clinic)".to_string();
        }
        print!(
            "{:<12} {:<10} {:<24}",
            row.date.format("%Y-%m-%d"),
            row.date.format("%A"),
            holiday
        );
        for doctor in &doctors {
            let status = row.status(doctor).unwrap_or_default();
            print!(" {:<16}", status.label());
        }
        println!();
    }
}

/// Translate roster failures into actionable operator messages.
fn surface(err: RosterError) -> miette::Report {
    match &err {
        RosterError::Store(StoreError::Conflict(_)) => miette::miette!(
            "{}: someone else updated the roster; re-run to reload and retry",
            err
        ),
        _ => miette::miette!("{}", err),
    }
}
