//! Current-period command.

use std::io::Write;

use chrono::Local;
use schoolhouse_client::PortalState;
use schoolhouse_client::timers::RefreshOutcome;
use schoolhouse_core::CurrentPeriod;

use super::CommandError;

fn print_period(period: Option<&CurrentPeriod>, out: &mut impl Write) -> Result<(), CommandError> {
    let Some(period) = period else {
        writeln!(out, "No lesson in progress")?;
        return Ok(());
    };

    let now = Local::now().time();
    write!(
        out,
        "{} - {} {}-{}",
        period.subject,
        period.class_name,
        period.starts_at.format("%H:%M"),
        period.ends_at.format("%H:%M"),
    )?;
    if let Some(teacher) = &period.teacher {
        write!(out, " with {teacher}")?;
    }
    if period.contains(now) {
        write!(out, " ({} min left)", period.minutes_remaining(now))?;
    }
    writeln!(out)?;
    Ok(())
}

/// Print the current period once, or keep printing changes until Ctrl-C.
///
/// Only the first fetch can fail the command; later polls are best-effort.
pub async fn watch(
    portal: &PortalState,
    once: bool,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    portal.api().session().load_persisted();

    let mut shown = match RefreshOutcome::fetch(portal.api()).await {
        RefreshOutcome::Updated(period) => Some(period),
        RefreshOutcome::NoPeriod => None,
        RefreshOutcome::Failed(e) => return Err(e.into()),
    };
    print_period(shown.as_ref(), out)?;
    if once {
        return Ok(());
    }
    out.flush()?;

    let refresher = portal.refresh_period();
    let mut changes = refresher.watch();
    tracing::info!(
        interval_secs = portal.config().period_refresh_interval.as_secs(),
        "Watching current period, Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = changes.borrow_and_update().clone();
                if latest != shown {
                    print_period(latest.as_ref(), out)?;
                    out.flush()?;
                    shown = latest;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
