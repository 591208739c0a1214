use std::time::Duration;

use crate::cli::commands::{open_pool, timestamp_or_now};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::geocode::{CachedGeocoder, NoopGeocoder, TimeoutGeocoder};
use crate::core::punch::{PunchLogic, PunchOptions, PunchState};
use crate::errors::AppResult;
use crate::models::{Location, Scope, Timerecord, Timestamp};
use crate::ui::messages::{info, success};
use crate::utils::colors::{color_for_state, paint};

fn hhmm(ts: &Option<Timestamp>) -> String {
    ts.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".into())
}

fn describe(record: &Timerecord) -> String {
    format!(
        "record #{} {} start {} (rounded {}) end {} (rounded {}) breaks {}",
        record.id,
        record.work_date.format("%Y-%m-%d"),
        record.start_time.format("%H:%M"),
        record.rounded_start_time.format("%H:%M"),
        hhmm(&record.end_time),
        hhmm(&record.rounded_end_time),
        record.breaks.len()
    )
}

fn state_label(state: PunchState) -> String {
    paint(color_for_state(state), state.as_str())
}

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    match cmd {
        Commands::Punch {
            event,
            staff,
            lat,
            lon,
            at,
        } => {
            let now = timestamp_or_now(at.as_deref())?;
            let location = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Location {
                    lat: *lat,
                    lon: *lon,
                    address: None,
                }),
                _ => None,
            };

            let geocoder = TimeoutGeocoder::new(
                CachedGeocoder::new(NoopGeocoder),
                Duration::from_millis(cfg.geocode_timeout_ms),
            );
            let opts = PunchOptions {
                cancel_window_seconds: cfg.cancel_window_seconds,
                geocoder: &geocoder,
            };

            let mut pool = open_pool(cfg)?;
            let outcome = PunchLogic::apply(
                &mut pool,
                scope,
                *staff,
                (*event).into(),
                now,
                location,
                &opts,
            )?;

            success(format!(
                "{} recorded for staff {} -> {}",
                outcome.event.as_str(),
                staff,
                state_label(outcome.state)
            ));
            if let Some(undone) = outcome.undone {
                info(format!("Undone: {undone:?}"));
            }
            if let Some(record) = &outcome.record {
                info(describe(record));
            }
        }

        Commands::Status { staff, at } => {
            let now = timestamp_or_now(at.as_deref())?;
            let pool = open_pool(cfg)?;
            let status = PunchLogic::state(&pool.conn, scope, *staff, now)?;

            info(format!("Staff {}: {}", staff, state_label(status.state)));
            if let Some(c) = &status.contract {
                info(format!("Contract: {} (#{})", c.contract_number, c.id));
            }
            if let Some(record) = &status.record {
                info(describe(record));
            }
        }

        _ => {}
    }

    Ok(())
}
