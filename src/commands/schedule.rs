use std::sync::Arc;

use chrono::{NaiveDateTime, Weekday};

use vidgrab_core::models::media::DownloadResult;

use super::print_result;
use crate::cli::MediaArgs;
use crate::core::scheduler::{Recurrence, ScheduleCallbacks, ScheduleRule, Scheduler};
use crate::AppContext;

pub fn build_rule(
    at: NaiveDateTime,
    repeat: Recurrence,
    days: Vec<Weekday>,
    day_of_month: Option<u32>,
    until: Option<NaiveDateTime>,
) -> ScheduleRule {
    let rule = match repeat {
        Recurrence::Once => ScheduleRule::once(at),
        Recurrence::Daily => ScheduleRule::daily(at),
        Recurrence::Weekly => ScheduleRule::weekly(at, days),
        Recurrence::Monthly => ScheduleRule::monthly(at, day_of_month),
    };
    match until {
        Some(end) => rule.until(end),
        None => rule,
    }
}

pub async fn run(
    ctx: &AppContext,
    url: &str,
    rule: ScheduleRule,
    media: &MediaArgs,
) -> anyhow::Result<()> {
    let scheduler = Scheduler::new(ctx.dispatcher.clone());
    let callbacks = ScheduleCallbacks {
        on_complete: Some(Arc::new(|result: DownloadResult| print_result(&result))),
        on_error: Some(Arc::new(|result: DownloadResult| print_result(&result))),
    };

    let control = scheduler.schedule(
        url,
        media.to_options(&ctx.settings.download),
        rule,
        callbacks,
    )?;
    let status = control.status();
    println!(
        "Scheduled {} as {}; next run {}. Press Ctrl-C to stop.",
        status.url, status.id, status.next_run
    );

    tokio::select! {
        _ = control.finished() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!("[schedule] ctrl-c handler failed: {}", e);
            }
            control.cancel();
        }
    }

    let status = control.status();
    println!(
        "Schedule {} ended ({}) after {} run(s)",
        status.id, status.phase, status.runs
    );
    Ok(())
}
