//! Subcommand handlers.

use crate::cli::{Command, PeriodArgs, PlanArgs};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::http_advice::HttpAdviceProvider;
use dreamroad_core::db::open_db;
use dreamroad_core::{
    build_breakdown, core_version, flatten_periods, parse_overrides, AdviceOutcome, AdvicePolicy,
    Breakdown, GoalMap, MapService, PeriodNode, PlanningSession, SessionError,
    SqliteMapRepository,
};
use rusqlite::Connection;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

pub fn run(command: Command, config: &CliConfig) -> Result<(), CliError> {
    match command {
        Command::Breakdown { period, json } => breakdown(&period, json),
        Command::Plan(args) => plan(args, config),
        Command::Maps => {
            let conn = open_db(&config.db_path)?;
            let maps = map_service(&conn)?.list_maps()?;
            if maps.is_empty() {
                println!("no goal maps yet");
            }
            for map in &maps {
                println!("{}", map_summary(map));
            }
            Ok(())
        }
        Command::Show { map_id } => {
            let conn = open_db(&config.db_path)?;
            match map_service(&conn)?.get_map(map_id)? {
                Some(map) => print!("{}", render_map(&map)),
                None => println!("goal map not found: {map_id}"),
            }
            Ok(())
        }
        Command::Complete { map_id } => {
            let conn = open_db(&config.db_path)?;
            let progress = map_service(&conn)?.complete_current_step(map_id)?;
            if progress.is_finished() {
                println!("all {} steps done", progress.total_steps);
            } else {
                println!(
                    "step {}/{} done ({:.0}%)",
                    progress.current_step, progress.total_steps, progress.percent
                );
            }
            Ok(())
        }
        Command::Task { map_id, day, task } => {
            let conn = open_db(&config.db_path)?;
            map_service(&conn)?.update_step_task(map_id, day, &task)?;
            println!("day {day} updated");
            Ok(())
        }
        Command::Delete { map_id } => {
            let conn = open_db(&config.db_path)?;
            map_service(&conn)?.delete_map(map_id)?;
            println!("deleted {map_id}");
            Ok(())
        }
        Command::Version => {
            println!("dreamroad_core version={}", core_version());
            Ok(())
        }
    }
}

fn map_service(conn: &Connection) -> Result<MapService<SqliteMapRepository<'_>>, CliError> {
    Ok(MapService::new(SqliteMapRepository::try_new(conn)?))
}

fn breakdown(period: &PeriodArgs, json: bool) -> Result<(), CliError> {
    let total_days = period
        .choice()
        .total_days()
        .map_err(SessionError::from)?;
    let breakdown = build_breakdown(total_days);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&flatten_periods(&breakdown))?
        );
    } else {
        print!("{}", render_breakdown(&breakdown));
    }
    Ok(())
}

fn plan(args: PlanArgs, config: &CliConfig) -> Result<(), CliError> {
    let mut session = PlanningSession::new(args.goal, args.description, args.period.choice())?;

    if let Some(path) = &args.overrides {
        let overrides = parse_overrides(&read_overrides_file(path)?);
        let summary = session.apply_overrides(&overrides);
        println!(
            "overrides: {} of {} matched",
            summary.matched,
            overrides.len()
        );
    }

    if args.advice {
        let provider = HttpAdviceProvider::new(&config.api_url, config.advice_timeout);
        let policy = if args.accept_unserious {
            AdvicePolicy::AcceptAll
        } else {
            AdvicePolicy::RejectUnserious
        };
        match session.request_advice(&provider, policy)? {
            AdviceOutcome::Applied { summary, advice } => {
                println!(
                    "advice applied: {} titles, {} tasks",
                    summary.titles, summary.tasks
                );
                if let Some(advice) = advice {
                    println!("{advice}");
                }
            }
            AdviceOutcome::NotSerious { feedback } => {
                println!("advice skipped: {feedback}");
            }
            AdviceOutcome::NoPeriods => println!("advice service suggested no changes"),
            AdviceOutcome::Unsuccessful => println!("advice service could not process the goal"),
        }
    }

    let conn = open_db(&config.db_path)?;
    let map = map_service(&conn)?.create_map(session.finalize())?;
    println!("created {} ({} steps)", map.uuid, map.total_steps());
    Ok(())
}

/// Accepts a bare override array or a full advice response body.
fn read_overrides_file(path: &Path) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text)?;
    Ok(match value {
        Value::Object(mut object) => object.remove("periods").unwrap_or(Value::Null),
        other => other,
    })
}

fn render_breakdown(breakdown: &Breakdown) -> String {
    let mut out = String::new();
    for node in &breakdown.nodes {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &PeriodNode, depth: usize) {
    let _ = write!(
        out,
        "{:indent$}{} [{}] {}d",
        "",
        node.title,
        node.id,
        node.days,
        indent = depth * 2
    );
    if !node.task.is_empty() {
        let _ = write!(out, ": {}", node.task);
    }
    out.push('\n');
    for child in &node.children {
        render_node(out, child, depth + 1);
    }
}

fn map_summary(map: &GoalMap) -> String {
    let progress = map.progress();
    format!(
        "{}  {}  {}/{} ({:.0}%)",
        map.uuid, map.goal, progress.current_step, progress.total_steps, progress.percent
    )
}

fn render_map(map: &GoalMap) -> String {
    let mut out = map_summary(map);
    out.push('\n');
    if !map.description.is_empty() {
        let _ = writeln!(out, "{}", map.description);
    }
    for step in &map.steps {
        let marker = if step.completed {
            "x"
        } else if map.current().is_some_and(|current| current.day == step.day) {
            ">"
        } else {
            " "
        };
        let _ = write!(out, "[{marker}] {:>3}. {}", step.day, step.title);
        if !step.task.is_empty() {
            let _ = write!(out, ": {}", step.task);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{read_overrides_file, render_breakdown, render_map};
    use dreamroad_core::{
        build_breakdown, fallback_steps, GoalMap, PeriodChoice, PeriodPreset, TotalDays,
    };
    use serde_json::json;

    #[test]
    fn breakdown_renders_nested_indentation() {
        let rendered = render_breakdown(&build_breakdown(TotalDays::new(8).unwrap()));
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Неделя 1 [week--0] 7d");
        assert_eq!(lines[1], "  День 1 [day--0-0] 1d");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn map_render_marks_done_and_current_steps() {
        let mut map = GoalMap::new(
            "Цель",
            "",
            PeriodChoice::Preset {
                preset: PeriodPreset::Week,
            },
            3,
            fallback_steps(3),
        )
        .unwrap();
        map.complete_current_step();

        let rendered = render_map(&map);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert!(lines[0].ends_with("1/3 (33%)"));
        assert_eq!(lines[1], "[x]   1. День 1");
        assert_eq!(lines[2], "[>]   2. День 2");
        assert_eq!(lines[3], "[ ]   3. День 3");
    }

    #[test]
    fn overrides_file_accepts_response_body_or_array() {
        let dir = tempfile::tempdir().unwrap();
        let body = dir.path().join("body.json");
        std::fs::write(
            &body,
            json!({"success": true, "periods": [{"id": "day--0"}]}).to_string(),
        )
        .unwrap();
        let array = dir.path().join("array.json");
        std::fs::write(&array, json!([{"id": "day--1"}]).to_string()).unwrap();

        assert_eq!(
            read_overrides_file(&body).unwrap(),
            json!([{"id": "day--0"}])
        );
        assert_eq!(
            read_overrides_file(&array).unwrap(),
            json!([{"id": "day--1"}])
        );
        assert!(read_overrides_file(&dir.path().join("missing.json")).is_err());
    }
}
