//! Interactive collection of missing values

use std::io::{BufRead, Write};

use contracts::ContractError;

use crate::RawConfig;

/// Prompt for every required value the merged configuration still lacks
///
/// Values are asked in a fixed order: worker count, url, data file, method.
pub fn prompt_missing<R: BufRead, W: Write>(
    raw: &mut RawConfig,
    input: &mut R,
    output: &mut W,
) -> Result<(), ContractError> {
    for field in raw.missing_required() {
        let answer = ask(field.prompt(), input, output)?;
        raw.set_required(field, &answer)?;
    }
    Ok(())
}

/// Offer to add one extra header
///
/// Answers other than `y`/`Y` add nothing; a malformed header line is ignored.
pub fn prompt_additional_header<R: BufRead, W: Write>(
    raw: &mut RawConfig,
    input: &mut R,
    output: &mut W,
) -> Result<(), ContractError> {
    let answer = ask("Add additional headers? (y/N): ", input, output)?;
    if !answer.trim().eq_ignore_ascii_case("y") {
        return Ok(());
    }

    let header = ask("Provide colon-separated header name and value: ", input, output)?;
    if header.contains(':') {
        raw.headers.push(header.trim().to_string());
    }
    Ok(())
}

fn ask<R: BufRead, W: Write>(label: &str, input: &mut R, output: &mut W) -> Result<String, ContractError> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
