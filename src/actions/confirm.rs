//! Typed-keyword confirmation before removing duplicates.

use std::io::{self, BufRead, Write};

/// Prompt shown before removal.
pub const CONFIRM_PROMPT: &str = "for deleting founded duplicate files type 'delete': ";

/// Decide whether duplicates may be removed.
///
/// Returns true without prompting when `remove` is set. Otherwise writes
/// [`CONFIRM_PROMPT`] to `output` and reads one line from `input`; the
/// answer is accepted when, trimmed and lowercased, it equals one of
/// `accepted` (also compared lowercased). End of input counts as a refusal.
///
/// # Errors
///
/// Returns an I/O error if the prompt cannot be written or the answer read.
pub fn confirm_removal<R: BufRead, W: Write>(
    remove: bool,
    mut input: R,
    mut output: W,
    accepted: &[String],
) -> io::Result<bool> {
    if remove {
        return Ok(true);
    }

    write!(output, "{CONFIRM_PROMPT}")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        log::info!("No confirmation received, keeping duplicates");
        return Ok(false);
    }

    let answer = answer.trim().to_lowercase();
    let confirmed = accepted.iter().any(|a| a.trim().to_lowercase() == answer);
    if !confirmed {
        log::info!("Removal not confirmed, keeping duplicates");
    }
    Ok(confirmed)
}
