use chrono::{prelude::*, Days, Months};

use crate::capture::{CaptureError, TaskInput};
use crate::model::{DateKey, NewTask, NotificationRequest, TimeOfDay};

/// Result of inline token parsing from the capture text.
#[derive(Debug, Default)]
struct InlineTokens {
    words: Vec<String>,
    date: Option<DateKey>,
    time: Option<TimeOfDay>,
    private: bool,
    remind_minutes: Option<u32>,
}

/// Build a [`NewTask`] from raw input. Inline tokens (`on:`, `at:`, `remind:`,
/// `!private`) are honoured unless the matching explicit field is set.
pub fn parse_capture(input: &TaskInput, today: DateKey) -> Result<NewTask, CaptureError> {
    input.require_text()?;
    let raw_text = input.text.join(" ");
    let inline = parse_inline_tokens(&raw_text, today)?;

    let text = inline.words.join(" ").trim().to_string();
    if text.is_empty() {
        return Err(CaptureError::EmptyText);
    }

    let date = match &input.date {
        Some(spec) => Some(parse_date_spec(spec, today)?),
        None => inline.date,
    }
    .ok_or(CaptureError::MissingDate)?;

    let time = match &input.time {
        Some(spec) if !spec.trim().is_empty() => Some(parse_time_spec(spec)?),
        _ => inline.time,
    };

    let remind_minutes = input.remind_minutes.or(inline.remind_minutes);
    let notification = remind_minutes.map(NotificationRequest::minutes_before);

    Ok(NewTask {
        text,
        date,
        time,
        is_private: input.private || inline.private,
        voice_note: input.voice_note.clone(),
        notification,
    })
}

/// Like [`parse_capture`], but a task without any date lands on `fallback`.
pub fn parse_capture_on(
    input: &TaskInput,
    today: DateKey,
    fallback: DateKey,
) -> Result<NewTask, CaptureError> {
    match parse_capture(input, today) {
        Err(CaptureError::MissingDate) if input.date.is_none() => {
            let dated = TaskInput {
                date: Some(fallback.to_string()),
                ..input.clone()
            };
            parse_capture(&dated, today)
        }
        other => other,
    }
}

fn parse_inline_tokens(text: &str, today: DateKey) -> Result<InlineTokens, CaptureError> {
    let mut result = InlineTokens::default();

    for piece in text.split_whitespace() {
        if let Some(spec) = piece.strip_prefix("on:") {
            result.date = Some(parse_date_spec(spec, today)?);
            continue;
        }
        if let Some(spec) = piece.strip_prefix("at:") {
            result.time = Some(parse_time_spec(spec)?);
            continue;
        }
        if let Some(spec) = piece.strip_prefix("remind:") {
            result.remind_minutes = Some(parse_minutes(spec)?);
            continue;
        }
        if piece.eq_ignore_ascii_case("!private") {
            result.private = true;
            continue;
        }

        result.words.push(piece.to_string());
    }

    Ok(result)
}

pub fn parse_time_spec(spec: &str) -> Result<TimeOfDay, CaptureError> {
    spec.parse::<TimeOfDay>()
        .map_err(|_| CaptureError::InvalidTime(spec.to_string()))
}

/// Parse a reminder lead time such as `15`, `15m`, or `1h`.
pub fn parse_minutes(spec: &str) -> Result<u32, CaptureError> {
    let lower = spec.trim().to_ascii_lowercase();
    let invalid = || CaptureError::InvalidReminder(spec.to_string());
    let minutes = if let Some(number) = lower.strip_suffix('h') {
        number
            .parse::<u32>()
            .map_err(|_| invalid())?
            .saturating_mul(60)
    } else {
        lower
            .strip_suffix('m')
            .unwrap_or(&lower)
            .parse::<u32>()
            .map_err(|_| invalid())?
    };
    if minutes == 0 {
        return Err(invalid());
    }
    Ok(minutes)
}

/// Resolve a date specification relative to `today`.
pub fn parse_date_spec(spec: &str, today: DateKey) -> Result<DateKey, CaptureError> {
    let trimmed = spec.trim();
    let invalid = || CaptureError::InvalidDate(spec.to_string());
    if trimmed.is_empty() {
        return Err(CaptureError::MissingDate);
    }

    let lower = trimmed.to_ascii_lowercase();
    match lower.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today.succ()),
        "yesterday" => return Ok(today.pred()),
        _ => {}
    }

    if lower.starts_with('+') || lower.starts_with('-') {
        return parse_relative_spec(&lower, today).ok_or_else(invalid);
    }

    if let Some(weekday) = parse_weekday(&lower) {
        let mut days_ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7;
        }
        return Ok(today.offset(days_ahead));
    }

    trimmed.parse::<DateKey>().map_err(|_| invalid())
}

fn shift_days(base: NaiveDate, value: i64) -> Option<NaiveDate> {
    let days = Days::new(value.unsigned_abs());
    if value >= 0 {
        base.checked_add_days(days)
    } else {
        base.checked_sub_days(days)
    }
}

fn parse_relative_spec(spec: &str, today: DateKey) -> Option<DateKey> {
    if spec.len() < 3 {
        return None;
    }
    let (number_part, unit) = spec.split_at(spec.len() - 1);
    let value: i64 = number_part.parse().ok()?;
    let base = today.as_naive();
    let date = match unit {
        "d" => shift_days(base, value)?,
        "w" => shift_days(base, value.checked_mul(7)?)?,
        "m" => {
            let months = Months::new(u32::try_from(value.unsigned_abs()).ok()?);
            if value >= 0 {
                base.checked_add_months(months)?
            } else {
                base.checked_sub_months(months)?
            }
        }
        _ => return None,
    };
    Some(DateKey::new(date))
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
