//! Interactive y/N confirmation.

use anyhow::Result;
use std::io::{self, BufRead, Write};

use super::RealRuntime;

/// Ask `prompt` on `output` and read one answer line from `input`.
///
/// Only `y` or `yes` (any case, surrounding whitespace ignored) confirm;
/// an empty line or end of input declines.
pub(crate) fn ask_yes_no<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        ask_yes_no(prompt, &mut stdin.lock(), &mut stdout)
    }
}
