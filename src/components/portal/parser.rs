use super::models::RawAppointment;
use crate::error::{portal_error, SyncResult};
use crate::utils::time::{parse_portal_date, parse_time};
use scraper::{ElementRef, Html, Selector};

/// Prefix the portal uses for director notes
pub const NOTE_PREFIX: &str = "Regie:";

const DATE_ROW_BACKGROUND: &str = "background:#9bc7e6";
const APPOINTMENT_ROW_BACKGROUND: &str = "background:whitesmoke";
const APPOINTMENT_CELLS: usize = 5;

fn selector(css: &str) -> SyncResult<Selector> {
    Selector::parse(css).map_err(|e| portal_error(&format!("Invalid selector {}: {}", css, e)))
}

/// Lowercase and drop whitespace so inline styles compare reliably
fn normalize_style(style: &str) -> String {
    style
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Non-empty, trimmed text nodes of an element
fn text_lines(element: &ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn joined_text(element: &ElementRef<'_>) -> String {
    text_lines(element).join(" ")
}

/// Pick the DD.MM.YYYY token out of a header such as "Mittwoch 12.06.2024"
fn extract_date(text: &str) -> String {
    text.split_whitespace()
        .find(|token| parse_portal_date(token).is_some())
        .unwrap_or(text.trim())
        .to_string()
}

/// Find the start and end HH:MM in a cell like "09:00 - 11:00" or "09:0011:00"
fn extract_times(text: &str) -> (String, String) {
    let mut times = Vec::new();
    for token in text.split(|c: char| !(c.is_ascii_digit() || c == ':')) {
        if parse_time(token).is_some() {
            times.push(token.to_string());
            continue;
        }
        // Times glued together without a separator
        if token.len() == 10 {
            let (first, second) = token.split_at(5);
            if parse_time(first).is_some() && parse_time(second).is_some() {
                times.push(first.to_string());
                times.push(second.to_string());
            }
        }
    }

    let mut times = times.into_iter();
    let start = times.next().unwrap_or_default();
    let end = times.next().unwrap_or_default();
    (start, end)
}

/// Extract the CSRF token from the login form
pub fn parse_csrf_token(html: &str) -> SyncResult<Option<String>> {
    let document = Html::parse_document(html);
    let token_input = selector("input[name=\"_token\"]")?;

    Ok(document
        .select(&token_input)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string))
}

/// Parse the appointment table of the events page.
///
/// The table alternates date header rows and appointment rows. Every
/// appointment row belongs to the closest header row above it. Rows that do
/// not have the expected five cells are ignored; missing pieces inside a
/// valid row become empty strings and are rejected later by the normalizer.
pub fn parse_appointments(html: &str) -> SyncResult<Vec<RawAppointment>> {
    let document = Html::parse_document(html);
    let rows = selector("tr")?;
    let cells = selector("td")?;
    let bold = selector("b")?;

    let mut appointments = Vec::new();
    let mut current_date = String::new();

    for row in document.select(&rows) {
        let style = normalize_style(row.value().attr("style").unwrap_or_default());
        let columns: Vec<ElementRef<'_>> = row.select(&cells).collect();

        if style.contains(DATE_ROW_BACKGROUND) {
            current_date = columns
                .get(1)
                .map(|cell| extract_date(&joined_text(cell)))
                .unwrap_or_default();
            continue;
        }

        if !style.contains(APPOINTMENT_ROW_BACKGROUND) || columns.len() != APPOINTMENT_CELLS {
            continue;
        }

        let (start_time, end_time) = extract_times(&joined_text(&columns[0]));

        let studio_name = columns[1]
            .select(&bold)
            .next()
            .map(|b| joined_text(&b))
            .unwrap_or_default();

        // The address is the last line of the studio cell
        let address = text_lines(&columns[1])
            .into_iter()
            .filter(|line| *line != studio_name)
            .last()
            .unwrap_or_default();

        let note = columns[2..]
            .iter()
            .map(joined_text)
            .find(|text| text.starts_with(NOTE_PREFIX))
            .unwrap_or_default();

        appointments.push(RawAppointment {
            date: current_date.clone(),
            start_time,
            end_time,
            studio_name,
            address,
            note,
        });
    }

    Ok(appointments)
}

/// Whether a response after login shows the logged-in area
pub fn is_logged_in(html: &str) -> bool {
    html.contains("Termine")
}
