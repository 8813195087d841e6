use chrono::Timelike;

use crate::decode::PartialTrace;

/// Symbolic time tokens for a decoded event, used to ground prompts.
///
/// Tokens that depend on the start time are omitted when it is absent; the
/// duration token also needs an end time.
pub fn tempo_tokens(event: &PartialTrace) -> Vec<String> {
    let mut tokens = Vec::new();

    if let Some(uid) = &event.id {
        tokens.push(format!("<tempo:uid-{uid}>"));
    }

    if let Some(start) = event.start {
        tokens.push(format!("<tempo:{}>", start.format("%Y-%m-%dT%H:%MZ")));
        tokens.push(format!("<tempo:{}>", start.format("%A")));
        tokens.push(format!("<tempo:{}>", part_of_day(start.hour())));
    }

    if let Some(minutes) = event.duration_minutes {
        tokens.push(format!("<tempo:duration-{minutes}min>"));
    }

    if event
        .title
        .as_deref()
        .is_some_and(|title| title.to_lowercase().contains("meeting"))
    {
        tokens.push("<tempo:meeting>".to_string());
    }
    if event
        .content
        .as_deref()
        .is_some_and(|content| content.to_lowercase().contains("urgent"))
    {
        tokens.push("<tempo:urgent>".to_string());
    }

    tokens
}

fn part_of_day(hour: u32) -> &'static str {
    match hour {
        0..12 => "Morning",
        12..17 => "Afternoon",
        _ => "Evening",
    }
}
