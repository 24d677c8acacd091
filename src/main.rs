use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use ulid::Ulid;

use daygrid::calendar::{display_color, format_date, format_time_12h, is_today, MonthNavigator};
use daygrid::config::Settings;
use daygrid::dispatch::{Command, Dispatcher};
use daygrid::layout::GridLayout;
use daygrid::model::{CalendarEvent, Px};
use daygrid::notify::ChangeHub;
use daygrid::store::Store;

/// An event as the timeline draws it.
#[derive(Serialize)]
struct EventView {
    id: Ulid,
    resource_id: Ulid,
    title: String,
    start_date: String,
    end_date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    color: String,
    top: Option<Px>,
}

impl From<&CalendarEvent> for EventView {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            resource_id: event.resource_id,
            title: event.title.clone(),
            start_date: format_date(event.span.start),
            end_date: format_date(event.span.end),
            start_time: event.start_time.map(format_time_12h),
            end_time: event.end_time.map(format_time_12h),
            color: display_color(event).to_string(),
            top: event.top,
        }
    }
}

#[derive(Serialize)]
struct MonthView {
    month: String,
    title: String,
    today: NaiveDate,
    /// Column of `today` in `grid.days`, when it falls in the shown month.
    today_column: Option<usize>,
    picker_weeks: Vec<[Option<NaiveDate>; 7]>,
    grid: GridLayout,
    events: Vec<EventView>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let settings = Settings::from_env()?;
    daygrid::observability::init(settings.metrics_port)?;
    std::fs::create_dir_all(&settings.data_dir)?;

    let notify = Arc::new(ChangeHub::new());
    let store = Arc::new(
        Store::open(settings.wal_path(), notify, settings.layout)?
            .with_minutes_per_pixel(settings.minutes_per_pixel),
    );
    info!("daygrid started");
    info!("  data_dir: {}", settings.data_dir.display());
    info!("  compaction: every {:?} past {} appends", settings.compact_interval, settings.compact_threshold);
    info!(
        "  metrics: {}",
        settings
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let dispatcher = Dispatcher::spawn(store.clone());
    if store.resource_count() == 0 {
        seed_resources(&dispatcher, settings.seed_resources).await?;
    }
    tokio::spawn(daygrid::maintenance::run_compactor(
        store.clone(),
        settings.compact_threshold,
        settings.compact_interval,
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (mut applied, mut rejected, mut line_no) = (0usize, 0usize, 0usize);
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command: Command = match serde_json::from_str(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!(line = line_no, "skipping malformed command: {e}");
                rejected += 1;
                continue;
            }
        };
        match dispatcher.submit(command).await {
            Ok(outcome) => {
                debug!(line = line_no, ?outcome, "applied");
                applied += 1;
            }
            Err(e) => {
                warn!(line = line_no, "command failed: {e}");
                rejected += 1;
            }
        }
    }
    info!(applied, rejected, "input drained");

    let today = Local::now().date_naive();
    let navigator = MonthNavigator::new(settings.month.unwrap_or(today));
    let grid = store.layout_days(&navigator.days()).await?;
    let mut events = Vec::new();
    for resource_id in grid.rows.iter().map(|r| r.resource_id) {
        let in_month = store
            .events_for_resource(resource_id)
            .await?
            .into_iter()
            .filter(|e| grid.days.iter().any(|&day| e.span.contains_day(day)));
        events.extend(in_month.map(|e| EventView::from(&e)));
    }

    let today_column = grid.days.iter().position(|&day| is_today(day, today));
    let view = MonthView {
        month: navigator.current().format("%Y-%m").to_string(),
        title: navigator.title(),
        today,
        today_column,
        picker_weeks: navigator.picker_weeks(),
        grid,
        events,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Fresh data directory: create "Resource A", "Resource B", ... so the grid
/// has rows to show. Ids are monotonic so rows keep this order.
async fn seed_resources(dispatcher: &Dispatcher, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut ids = ulid::Generator::new();
    for letter in (b'A'..=b'Z').take(count) {
        let command = Command::CreateResource {
            id: Some(ids.generate()?),
            name: format!("Resource {}", letter as char),
        };
        dispatcher.submit(command).await?;
    }
    info!(count, "seeded resources");
    Ok(())
}
