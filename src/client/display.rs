//! Plain-text rendering of dashboard responses for the terminal

use std::fmt::Write;

use serde_json::Value;

use super::{ViewKind, ViewState};
use crate::model::{AttackLogic, CounterArgument, VoteDirection};

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn number(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Render any view state, delegating the ready case to `render`
pub fn render_state<T>(state: &ViewState<T>, render: impl FnOnce(&T) -> String) -> String {
    match state {
        ViewState::Loading => "Loading...\n".to_string(),
        ViewState::Empty => "Nothing to show yet.\n".to_string(),
        ViewState::Error(message) => format!("Error: {}\n", message),
        ViewState::Ready(value) => render(value),
    }
}

/// One line per worldview plus the pagination footer
pub fn render_worldview_page(page: &Value) -> String {
    let mut out = String::new();
    for worldview in items(page, "worldviews") {
        let _ = writeln!(
            out,
            "{:<12} {:<40} strength {:>5.2}  perceptions {:>5}  density {:>5.2}",
            text(worldview, "id"),
            text(worldview, "title"),
            number(worldview, "strength_overall"),
            number(worldview, "total_perceptions") as i64,
            number(worldview, "perception_density"),
        );
    }

    let pagination = &page["pagination"];
    let _ = writeln!(
        out,
        "-- showing {} from offset {} of {}{}",
        items(page, "worldviews").len(),
        number(pagination, "offset") as u64,
        number(pagination, "total") as u64,
        if pagination["hasMore"].as_bool().unwrap_or(false) {
            ", more available"
        } else {
            ""
        }
    );
    out
}

pub fn render_detail(detail: &Value) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", text(detail, "title"));
    if let Some(description) = detail.get("description").and_then(Value::as_str) {
        let _ = writeln!(out, "{}", description);
    }

    let stats = &detail["stats"];
    let _ = writeln!(
        out,
        "perceptions {}  contents {}  density {:.2}  valence {}  span {} days",
        number(stats, "total_perceptions") as i64,
        number(stats, "total_contents") as i64,
        number(stats, "perception_density"),
        text(stats, "avg_valence"),
        number(stats, "temporal_span_days") as i64,
    );

    let history = items(detail, "strength_history");
    if !history.is_empty() {
        let points: Vec<String> = history
            .iter()
            .map(|s| format!("{:.2}", number(s, "strength_overall")))
            .collect();
        let _ = writeln!(out, "strength: {}", points.join(" "));
    }
    out
}

/// Logic chain stages and interpretation gaps from the comparison endpoint
pub fn render_comparison(comparison: &Value) -> String {
    let mut out = String::new();

    if let Some(chain) = comparison.get("logic_chain").filter(|c| !c.is_null()) {
        for stage in items(chain, "stages") {
            if let Some(transition) = stage.get("transition").and_then(Value::as_str) {
                let _ = writeln!(out, "   ↓ {}", transition);
            }
            let _ = writeln!(out, "[{}]", text(stage, "label"));
            for item in items(stage, "items") {
                let _ = writeln!(out, "  - {}", text(item, "text"));
            }
        }
    }

    for entry in items(comparison, "comparisons") {
        let _ = writeln!(out, "\n{}", text(entry, "case"));
        let _ = writeln!(out, "  framed:  {}", text(entry, "biased_interpretation"));
        let _ = writeln!(out, "  neutral: {}", text(entry, "neutral_interpretation"));
        let why = text(entry, "why_this_matters");
        if !why.is_empty() {
            let _ = writeln!(out, "  why it matters: {}", why);
        }
    }
    out
}

pub fn render_view(kind: ViewKind, view: &Value) -> String {
    let mut out = String::new();
    match kind {
        ViewKind::Categories => {
            for group in items(view, "groups") {
                let _ = writeln!(
                    out,
                    "{} ({})",
                    text(group, "category"),
                    number(group, "total_perceptions") as i64
                );
                for member in items(group, "worldviews") {
                    let _ = writeln!(out, "  {}", text(member, "title"));
                }
            }
        }
        ViewKind::Actors => {
            for group in items(view, "groups") {
                let mechanisms: Vec<&str> = items(group, "mechanisms")
                    .iter()
                    .filter_map(Value::as_str)
                    .collect();
                let _ = writeln!(
                    out,
                    "{} ({}) [{}]",
                    text(group, "actor"),
                    number(group, "total_perceptions") as i64,
                    mechanisms.join(", ")
                );
            }
        }
        ViewKind::Mechanisms => {
            for bucket in items(view, "buckets") {
                let _ = writeln!(
                    out,
                    "{:<24} {:>6}  {} worldviews",
                    text(bucket, "label"),
                    number(bucket, "total_perceptions") as i64,
                    items(bucket, "worldviews").len()
                );
            }
        }
        ViewKind::Priority => {
            let _ = writeln!(
                out,
                "top 3 hold {:.1}% of perceptions, {} high priority",
                number(view, "top3_percentage"),
                number(view, "high_priority_count") as i64
            );
            for (rank, entry) in items(view, "top")
                .iter()
                .chain(items(view, "rest"))
                .enumerate()
            {
                let _ = writeln!(
                    out,
                    "{:>3}. [{}] {} ({})",
                    rank + 1,
                    text(entry, "priority"),
                    text(entry, "title"),
                    number(entry, "total_perceptions") as i64
                );
            }
        }
    }

    let skipped = number(&view["skipped"], "count") as u64;
    if skipped > 0 {
        let _ = writeln!(out, "({} worldviews skipped: unreadable frame)", skipped);
    }
    out
}

/// Counter-arguments with vote counts; `mine` marks the local user's vote
pub fn render_counters(
    counters: &[CounterArgument],
    mine: impl Fn(&str) -> Option<VoteDirection>,
) -> String {
    let mut out = String::new();
    for counter in counters {
        let marker = match mine(&counter.id) {
            Some(VoteDirection::Up) => "▲",
            Some(VoteDirection::Down) => "▼",
            None => " ",
        };
        let _ = writeln!(
            out,
            "{} {:<10} +{} -{}  {}  ({})",
            marker, counter.id, counter.upvotes, counter.downvotes, counter.content, counter.author_name
        );
    }
    out
}

/// Attack list; similarity is shown when the entry came from a search
pub fn render_attacks(attacks: &[AttackLogic]) -> String {
    let mut out = String::new();
    for attack in attacks {
        let score = attack
            .similarity
            .map(|s| format!("  ~{:.0}%", s * 100.0))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<10} {:>3} counters  {}{}",
            attack.id, attack.counter_count, attack.core_argument, score
        );
    }
    out
}
