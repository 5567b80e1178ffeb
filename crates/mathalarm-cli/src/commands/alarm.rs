use chrono::{Local, Utc};
use clap::{Args, Subcommand};
use mathalarm_core::alarm::parse_clock_time;
use mathalarm_core::storage::Database;
use mathalarm_core::{compute_next_fire, AlarmEdit, AlarmId, AlarmSpec, Config, Meridiem, RepeatDays};
use serde_json::json;

use super::{print_json, AlarmState};

#[derive(Args)]
pub struct MeridiemArgs {
    /// Read the hour on a 12-hour dial, before noon
    #[arg(long, conflicts_with = "pm")]
    am: bool,
    /// Read the hour on a 12-hour dial, after noon
    #[arg(long)]
    pm: bool,
}

impl MeridiemArgs {
    fn meridiem(&self) -> Option<Meridiem> {
        match (self.am, self.pm) {
            (true, _) => Some(Meridiem::Am),
            (_, true) => Some(Meridiem::Pm),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create an alarm
    Add {
        /// Time as H:MM (24-hour unless --am/--pm). Defaults to the configured time
        time: Option<String>,
        #[command(flatten)]
        meridiem: MeridiemArgs,
        /// Alarm label
        #[arg(long)]
        label: Option<String>,
        /// Repeat days: everyday, weekdays, weekend, once, or a list like "mon,wed,fri"
        #[arg(long)]
        days: Option<String>,
        /// Create the alarm switched off
        #[arg(long)]
        disabled: bool,
    },
    /// List all alarms with their next fire time
    List,
    /// Switch an alarm on or off
    Toggle {
        /// Alarm ID
        id: String,
    },
    /// Change time, label or repeat days
    Edit {
        /// Alarm ID
        id: String,
        /// New time as H:MM
        #[arg(long)]
        time: Option<String>,
        #[command(flatten)]
        meridiem: MeridiemArgs,
        /// New label
        #[arg(long)]
        label: Option<String>,
        /// New repeat days
        #[arg(long)]
        days: Option<String>,
    },
    /// Delete an alarm
    Remove {
        /// Alarm ID
        id: String,
    },
    /// Show the next alarm due across all enabled alarms
    Next,
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut db = Database::open()?;
    let mut state = AlarmState::load(&db, &config)?;
    let now = Local::now();

    match action {
        AlarmAction::Add {
            time,
            meridiem,
            label,
            days,
            disabled,
        } => {
            let defaults = &config.alarm_defaults;
            let (hour, minute) = match time {
                Some(text) => parse_clock_time(&text, meridiem.meridiem())?,
                None => defaults.hour_minute()?,
            };
            let repeat_days = match days {
                Some(days) => RepeatDays::parse_list(&days)?,
                None => defaults.repeat_days()?,
            };
            let mut alarm = AlarmSpec::new(hour, minute)?
                .with_label(label.unwrap_or_default())
                .with_repeat_days(repeat_days);
            if disabled {
                alarm.set_enabled(false);
            }
            let id = alarm.id();
            let event = state.book.add(alarm, &now, &mut state.scheduler)?;
            state.save(&mut db)?;
            eprintln!("Alarm created: {id}");
            match event {
                Some(event) => print_json(&event)?,
                None => print_json(state.book.get(id)?)?,
            }
        }
        AlarmAction::List => {
            let rows: Vec<_> = state
                .book
                .list()
                .iter()
                .map(|alarm| {
                    let next = compute_next_fire(alarm, &now).ok();
                    json!({
                        "id": alarm.id(),
                        "time": alarm.to_string(),
                        "label": alarm.label(),
                        "repeat": alarm.repeat_days().to_string(),
                        "repeat_days": alarm.repeat_days(),
                        "enabled": alarm.is_enabled(),
                        "next_fire_at": next.map(|t| t.to_rfc3339()),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        AlarmAction::Toggle { id } => {
            let id: AlarmId = id.parse()?;
            let event = state.book.toggle(id, &now, &mut state.scheduler)?;
            state.save(&mut db)?;
            match event {
                Some(event) => print_json(&event)?,
                None => print_json(state.book.get(id)?)?,
            }
        }
        AlarmAction::Edit {
            id,
            time,
            meridiem,
            label,
            days,
        } => {
            let id: AlarmId = id.parse()?;
            let edit = AlarmEdit {
                time: time
                    .map(|text| parse_clock_time(&text, meridiem.meridiem()))
                    .transpose()?,
                repeat_days: days.map(|d| RepeatDays::parse_list(&d)).transpose()?,
                label,
            };
            let event = state.book.edit(id, edit, &now, &mut state.scheduler)?;
            state.save(&mut db)?;
            match event {
                Some(event) => print_json(&event)?,
                None => print_json(state.book.get(id)?)?,
            }
        }
        AlarmAction::Remove { id } => {
            let id: AlarmId = id.parse()?;
            let removed = state.book.remove(id, &mut state.scheduler)?;
            state.save(&mut db)?;
            eprintln!("Alarm removed: {removed}");
            print_json(&json!({ "type": "alarm_removed", "alarm_id": removed.id() }))?;
        }
        AlarmAction::Next => match state.book.next_due(&now) {
            Some(fire) => {
                let label = state.book.get(fire.alarm_id)?.label().to_string();
                print_json(&json!({
                    "alarm_id": fire.alarm_id,
                    "label": label,
                    "fire_at": fire.fire_at.with_timezone(&Local).to_rfc3339(),
                    "in_minutes": (fire.fire_at - now.with_timezone(&Utc)).num_minutes(),
                }))?;
            }
            None => {
                eprintln!("No alarms enabled");
                println!("null");
            }
        },
    }
    Ok(())
}
