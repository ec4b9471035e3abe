// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Operator input. Invalid answers are reported and asked again; only a closed
//! input stream ends a prompt with an error.

use crate::common::units::native_to_wei;
use crate::domain::error::AppError;
use alloy::primitives::U256;
use std::io::{BufRead, Write};

pub const MAX_TRANSFER_AMOUNT: u64 = 999;

pub fn parse_cycle_count(raw: &str, default: u32) -> Result<u32, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::validation(
            "cycles",
            format!("'{raw}' is not a positive whole number"),
        )),
    }
}

/// Native amount with `0 < amount <= 999`.
pub fn parse_amount(raw: &str, default: U256) -> Result<U256, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    let wei = native_to_wei(raw)?;
    let max = U256::from(MAX_TRANSFER_AMOUNT) * U256::from(10u64).pow(U256::from(18u64));
    if wei.is_zero() || wei > max {
        return Err(AppError::validation(
            "amount",
            format!("{raw} must be greater than 0 and at most {MAX_TRANSFER_AMOUNT}"),
        ));
    }
    Ok(wei)
}

/// 1-based choice among `options` entries, returned 0-based.
pub fn parse_menu_choice(raw: &str, options: usize) -> Result<usize, AppError> {
    let raw = raw.trim();
    match raw.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Ok(n - 1),
        _ => Err(AppError::validation(
            "choice",
            format!("enter a number between 1 and {options}"),
        )),
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Raw line without the trailing newline; `None` once input is closed.
    pub fn line(&mut self, question: &str) -> Result<Option<String>, AppError> {
        write!(self.output, "{question}").map_err(io_err)?;
        self.output.flush().map_err(io_err)?;
        let mut buf = String::new();
        let read = self.input.read_line(&mut buf).map_err(io_err)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn ask<T>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        loop {
            let Some(answer) = self.line(question)? else {
                return Err(AppError::validation("input", "input closed"));
            };
            match parse(&answer) {
                Ok(v) => return Ok(v),
                Err(e) => writeln!(self.output, "  {e}").map_err(io_err)?,
            }
        }
    }

    pub fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}").map_err(io_err)
    }
}

fn io_err(e: std::io::Error) -> AppError {
    AppError::Unknown(e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cycle_count_validation() {
        assert_eq!(parse_cycle_count("", 1).unwrap(), 1);
        assert_eq!(parse_cycle_count(" 4 ", 1).unwrap(), 4);
        assert!(parse_cycle_count("0", 1).is_err());
        assert!(parse_cycle_count("-2", 1).is_err());
        assert!(parse_cycle_count("two", 1).is_err());
    }

    #[test]
    fn amount_bounds() {
        let one = native_to_wei("1").unwrap();
        assert_eq!(parse_amount("1", U256::ZERO).unwrap(), one);
        assert_eq!(parse_amount("", one).unwrap(), one);
        assert!(parse_amount("999", U256::ZERO).is_ok());
        assert!(parse_amount("999.0001", U256::ZERO).is_err());
        assert!(parse_amount("0", U256::ZERO).is_err());
        assert!(parse_amount("abc", U256::ZERO).is_err());
    }

    #[test]
    fn reprompts_until_valid() {
        let input = Cursor::new("x\n0\n3\n");
        let mut out = Vec::new();
        let mut p = Prompter::new(input, &mut out);
        assert_eq!(p.ask("cycles? ", |s| parse_cycle_count(s, 1)).unwrap(), 3);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("cycles? ").count(), 3);
    }

    #[test]
    fn closed_input_ends_prompt() {
        let mut out = Vec::new();
        let mut p = Prompter::new(Cursor::new(""), &mut out);
        assert!(p.ask("choice? ", |s| parse_menu_choice(s, 3)).is_err());
        assert_eq!(parse_menu_choice("3", 3).unwrap(), 2);
        assert!(parse_menu_choice("4", 3).is_err());
    }
}
