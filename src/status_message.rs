//! End-of-day status text shown next to the capture.

use chrono::NaiveDate;

const PLACEHOLDER_NAME: &str = "Your Name";

/// Render the sign-out message for `date`.
///
/// A blank name falls back to a placeholder; the note line only appears
/// when there is a note.
pub fn compose(name: &str, note: &str, date: NaiveDate) -> String {
    let name = match name.trim() {
        "" => PLACEHOLDER_NAME,
        trimmed => trimmed,
    };

    let mut message = format!(
        "{}'s Work Status:\nDate: {}\nSigning out",
        name,
        date.format("%d/%m/%Y")
    );

    let note = note.trim();
    if !note.is_empty() {
        message.push_str("\nNote: ");
        message.push_str(note);
    }

    message
}
