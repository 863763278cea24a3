//! Foreground time aggregation.
//!
//! Pairs foreground and background transitions into per-app foreground
//! totals for a window. Sources that only keep a raw event log use this to
//! answer aggregated usage queries.
//!
//! # Algorithm Summary
//!
//! At most one app is in the foreground at a time.
//!
//! 1. A `carried_in` app starts the window with an open session at `begin`
//! 2. A foreground-equivalent event for another app closes the open session
//!    at that timestamp and opens one for the new app
//! 3. A foreground-equivalent event for the open app keeps the earlier start
//! 4. A background-equivalent event for the open app closes its session
//! 5. A session still open is closed at `end`

use std::collections::HashMap;

use crate::event::TransitionEvent;
use crate::types::{AppId, TimeWindow};

/// Computes foreground milliseconds per app inside `window`.
///
/// Events must be sorted by timestamp ascending. Events outside the window
/// are ignored. Every app with a foreground or background transition in the
/// window, or a carried-in session, gets an entry (possibly zero). The
/// totals never add up to more than the window length.
pub fn foreground_totals<'e, I>(
    events: I,
    window: TimeWindow,
    carried_in: Option<&AppId>,
) -> HashMap<AppId, i64>
where
    I: IntoIterator<Item = &'e TransitionEvent>,
{
    let mut totals: HashMap<AppId, i64> = HashMap::new();
    let mut open: Option<(AppId, i64)> = None;

    if let Some(app) = carried_in {
        totals.insert(app.clone(), 0);
        open = Some((app.clone(), window.begin_ms()));
    }

    for event in events {
        let kind = event.kind;
        if !window.contains(event.timestamp_ms) || !(kind.is_foreground() || kind.is_background()) {
            continue;
        }
        totals.entry(event.app_id.clone()).or_insert(0);

        let is_open_app = open.as_ref().is_some_and(|(app, _)| *app == event.app_id);
        if kind.is_foreground() && is_open_app {
            continue;
        }
        if kind.is_background() && !is_open_app {
            continue;
        }
        if let Some((app, start)) = open.take() {
            close(&mut totals, app, start, event.timestamp_ms);
        }
        if kind.is_foreground() {
            open = Some((event.app_id.clone(), event.timestamp_ms));
        }
    }

    if let Some((app, start)) = open {
        close(&mut totals, app, start, window.end_ms());
    }

    totals
}

fn close(totals: &mut HashMap<AppId, i64>, app: AppId, start: i64, end: i64) {
    let total = totals.entry(app).or_insert(0);
    *total = total.saturating_add(end.saturating_sub(start));
}
