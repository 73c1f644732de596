/*!
    Strict `YYYY-MM-DD` parsing for deadline input.
!*/
use chrono::NaiveDate;
use winnow::Parser;
use winnow::Result;
use winnow::error::ParserError;
use winnow::token::take_while;

use crate::error::Error;

/// Parses a deadline typed at the prompt. Surrounding whitespace is ignored,
/// anything else that is not an existing calendar date is rejected.
pub fn parse_deadline(input: &str) -> crate::error::Result<NaiveDate> {
    let trimmed = input.trim();
    parse_date
        .parse(trimmed)
        .map_err(|_| Error::InvalidDate(trimmed.to_string()))
}

fn parse_date(input: &mut &str) -> Result<NaiveDate> {
    let (year, _, month, _, day) = (
        parse_year,
        parse_separator,
        parse_two_digits,
        parse_separator,
        parse_two_digits,
    )
        .parse_next(input)?;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => Ok(d),
        None => Err(ParserError::from_input(input)),
    }
}

fn parse_year(input: &mut &str) -> Result<i32> {
    take_while(4, '0'..='9')
        .try_map(str::parse::<i32>)
        .parse_next(input)
}

fn parse_two_digits(input: &mut &str) -> Result<u32> {
    take_while(2, '0'..='9')
        .try_map(str::parse::<u32>)
        .parse_next(input)
}

fn parse_separator(input: &mut &str) -> Result<char> {
    '-'.parse_next(input)
}
