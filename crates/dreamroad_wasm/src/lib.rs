//! WebAssembly bindings for the browser front end.
//!
//! Every export takes and returns JSON strings. Failures come back as
//! `{"error": "..."}`; nothing panics across the boundary.

use dreamroad_core::{
    apply_overrides as apply_overrides_inner, build_breakdown as build_breakdown_inner,
    flatten_periods as flatten_periods_inner, flatten_steps as flatten_steps_inner,
    parse_overrides, AdviceRequest, Breakdown, PeriodChoice, TotalDays,
};
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

fn error_json(msg: &str) -> String {
    json!({ "error": msg }).to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| error_json(&err.to_string()))
}

fn parse_breakdown(breakdown_json: &str) -> Result<Breakdown, String> {
    serde_json::from_str(breakdown_json).map_err(|err| format!("invalid breakdown JSON: {err}"))
}

/// Builds the default breakdown for a day count taken from a form field.
#[wasm_bindgen]
pub fn build_breakdown(total_days: f64) -> String {
    match TotalDays::from_f64(total_days) {
        Ok(total) => to_json(&build_breakdown_inner(total)),
        Err(err) => error_json(&err.to_string()),
    }
}

/// Resolves a duration choice such as `{"kind":"preset","preset":"month"}`
/// to `{"total_days": n}`.
#[wasm_bindgen]
pub fn period_days(choice_json: &str) -> String {
    let choice: PeriodChoice = match serde_json::from_str(choice_json) {
        Ok(choice) => choice,
        Err(err) => return error_json(&format!("invalid period JSON: {err}")),
    };
    match choice.total_days() {
        Ok(total) => json!({ "total_days": total.get() }).to_string(),
        Err(err) => error_json(&err.to_string()),
    }
}

#[wasm_bindgen]
pub fn flatten_steps(breakdown_json: &str) -> String {
    match parse_breakdown(breakdown_json) {
        Ok(breakdown) => to_json(&flatten_steps_inner(&breakdown)),
        Err(err) => error_json(&err),
    }
}

#[wasm_bindgen]
pub fn flatten_periods(breakdown_json: &str) -> String {
    match parse_breakdown(breakdown_json) {
        Ok(breakdown) => to_json(&flatten_periods_inner(&breakdown)),
        Err(err) => error_json(&err),
    }
}

/// Merges the `periods` array of an advice response into a breakdown.
///
/// Returns `{"breakdown": ..., "summary": {...}}`.
#[wasm_bindgen]
pub fn apply_overrides(breakdown_json: &str, periods_json: &str) -> String {
    let mut breakdown = match parse_breakdown(breakdown_json) {
        Ok(breakdown) => breakdown,
        Err(err) => return error_json(&err),
    };
    let periods: Value = match serde_json::from_str(periods_json) {
        Ok(periods) => periods,
        Err(err) => return error_json(&format!("invalid periods JSON: {err}")),
    };

    let summary = apply_overrides_inner(&mut breakdown, &parse_overrides(&periods));
    json!({
        "breakdown": breakdown,
        "summary": {
            "matched": summary.matched,
            "titles": summary.titles,
            "tasks": summary.tasks,
            "days": summary.days,
        }
    })
    .to_string()
}

/// Manual edit of one node; returns the updated breakdown.
#[wasm_bindgen]
pub fn edit_node(breakdown_json: &str, id: &str, title: &str, task: &str) -> String {
    let mut breakdown = match parse_breakdown(breakdown_json) {
        Ok(breakdown) => breakdown,
        Err(err) => return error_json(&err),
    };
    match breakdown.edit_node(id, title, task) {
        Ok(()) => to_json(&breakdown),
        Err(err) => error_json(&err.to_string()),
    }
}

/// Request body for the advice endpoint; the page performs the fetch.
#[wasm_bindgen]
pub fn advice_request(title: &str, description: &str, breakdown_json: &str) -> String {
    match parse_breakdown(breakdown_json) {
        Ok(breakdown) => to_json(&AdviceRequest {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            total_days: breakdown.total_days.get(),
            period_structure: flatten_periods_inner(&breakdown),
        }),
        Err(err) => error_json(&err),
    }
}

#[wasm_bindgen]
pub fn core_version() -> String {
    dreamroad_core::core_version().to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        advice_request, apply_overrides, build_breakdown, edit_node, flatten_periods,
        flatten_steps, period_days,
    };
    use serde_json::{json, Value};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn build_breakdown_rejects_bad_input() {
        for input in [0.0, -3.0, 2.5, f64::NAN] {
            assert!(parse(&build_breakdown(input))["error"].is_string());
        }
    }

    #[test]
    fn build_then_flatten_yields_one_step_per_day() {
        let breakdown = build_breakdown(10.0);
        let tree = parse(&breakdown);
        assert_eq!(tree["total_days"], 10);
        assert_eq!(tree["nodes"][0]["type"], "week");

        let steps = parse(&flatten_steps(&breakdown));
        assert_eq!(steps.as_array().unwrap().len(), 10);
        assert_eq!(steps[9]["day"], 10);
        assert_eq!(steps[9]["id"], "day--1-2");

        let periods = parse(&flatten_periods(&breakdown));
        assert_eq!(periods.as_array().unwrap().len(), 12);
    }

    #[test]
    fn breakdown_exports_reject_out_of_range_total_days() {
        for payload in [
            r#"{"total_days":0,"nodes":[]}"#,
            r#"{"total_days":4000000000,"nodes":[]}"#,
        ] {
            assert!(parse(&flatten_steps(payload))["error"].is_string());
            assert!(parse(&flatten_periods(payload))["error"].is_string());
            assert!(parse(&apply_overrides(payload, "[]"))["error"].is_string());
            assert!(parse(&advice_request("Цель", "", payload))["error"].is_string());
        }
    }

    #[test]
    fn period_days_resolves_choices() {
        assert_eq!(
            parse(&period_days(r#"{"kind":"preset","preset":"half-year"}"#)),
            json!({"total_days": 168})
        );
        assert_eq!(
            parse(&period_days(r#"{"kind":"custom","weeks":2,"days":1}"#)),
            json!({"total_days": 15})
        );
        assert!(parse(&period_days(r#"{"kind":"custom"}"#))["error"].is_string());
        assert!(parse(&period_days("not json"))["error"].is_string());
    }

    #[test]
    fn apply_overrides_reports_summary() {
        let breakdown = build_breakdown(7.0);
        let result = parse(&apply_overrides(
            &breakdown,
            r#"[{"id":"day--0-0","task":"Run 5km"},{"id":"nope","title":"x"}]"#,
        ));
        assert_eq!(result["summary"]["matched"], 1);
        assert_eq!(result["summary"]["tasks"], 1);
        assert_eq!(
            result["breakdown"]["nodes"][0]["children"][0]["task"],
            "Run 5km"
        );
        assert!(parse(&apply_overrides("{}", "[]"))["error"].is_string());
    }

    #[test]
    fn edit_node_reports_missing_ids() {
        let breakdown = build_breakdown(3.0);
        let edited = parse(&edit_node(&breakdown, "day--1", "Отдых", ""));
        assert_eq!(edited["nodes"][1]["title"], "Отдых");
        assert!(parse(&edit_node(&breakdown, "day--9", "x", ""))["error"].is_string());
        assert!(parse(&edit_node(&breakdown, "day--1", "  ", ""))["error"].is_string());
    }

    #[test]
    fn advice_request_matches_the_wire_schema() {
        let request = parse(&advice_request(" Бегать ", "", &build_breakdown(2.0)));
        assert_eq!(request["title"], "Бегать");
        assert_eq!(request["total_days"], 2);
        assert_eq!(request["period_structure"][1]["id"], "day--1");
        assert_eq!(request["period_structure"][1]["description"], "");
    }
}
