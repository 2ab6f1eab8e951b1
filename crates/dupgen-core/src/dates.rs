//! Epoch-day calendar used by date fields.
//!
//! Day 0 is 1 January 1900. Dates before 15 October 1582 follow the Julian
//! calendar, later dates the Gregorian one, so the ten days between
//! 4 and 15 October 1582 do not exist.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Epoch day of 15 October 1582, the first Gregorian day.
const GREGORIAN_FIRST_DAY: i64 = -115_860;
/// Epoch day of 31 December 1582.
const GREGORIAN_FIRST_YEAR_END: i64 = -115_783;
/// Epoch day of 1 January 1 AD.
const FIRST_AD_DAY: i64 = -693_597;
const MEAN_YEAR_DAYS: f64 = 365.2425;

const MONTH_LENGTHS: [[i64; 12]; 2] = [
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
    [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
];

/// Calendar date as day, month and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateParts {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl DateParts {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self { day, month, year }
    }

    /// `yyyymmdd` rendering used for date field values.
    pub fn to_compact_string(&self) -> String {
        format!("{}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// Whether `year` has 366 days (Julian rule before 1600).
pub fn is_leap_year(year: i32) -> bool {
    if year < 1600 {
        return year.rem_euclid(4) == 0;
    }
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` of `year`, or `None` for an unknown month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let lengths = &MONTH_LENGTHS[usize::from(is_leap_year(year))];
    Some(lengths[month as usize - 1] as u32)
}

/// Epoch day of 1 January of `year`.
pub fn first_day_of_year(year: i32) -> Result<i64> {
    let year = i64::from(year);
    if year == 0 {
        return Err(Error::InvalidDate("year 0 does not exist".to_string()));
    }
    if year < 0 {
        return Ok(year * 365 + (year - 1) / 4 - 693_596);
    }

    let mut leap_adjustment = (year + 3) / 4;
    if year > 1600 {
        leap_adjustment = leap_adjustment - (year + 99 - 1600) / 100 + (year + 399 - 1600) / 400;
    }
    let mut first_day = year * 365 + leap_adjustment - 693_963;
    if year > 1582 {
        first_day -= 10;
    }
    Ok(first_day)
}

/// Convert a date to its epoch day. Years must be after 1000.
pub fn date_to_epoch(day: u32, month: u32, year: i32) -> Result<i64> {
    if year <= 1000 {
        return Err(Error::InvalidDate(format!(
            "year {year} must be greater than 1000"
        )));
    }
    let month_length = days_in_month(year, month)
        .ok_or_else(|| Error::InvalidDate(format!("month {month} is not between 1 and 12")))?;
    if day == 0 || day > month_length {
        return Err(Error::InvalidDate(format!(
            "day {day} does not exist in month {month} of {year}"
        )));
    }
    if year == 1582 && month == 10 && (5..=14).contains(&day) {
        return Err(Error::InvalidDate(format!(
            "{day}/10/1582 falls in the Gregorian calendar gap"
        )));
    }

    let leap = usize::from(is_leap_year(year));
    let prior_months: i64 = MONTH_LENGTHS[leap][..month as usize - 1].iter().sum();
    let mut days = first_day_of_year(year)? + i64::from(day) - 1 + prior_months;

    if year == 1582 && (month > 10 || (month == 10 && day > 4)) {
        days -= 10;
    }
    Ok(days)
}

/// Convert an epoch day back to a calendar date.
pub fn epoch_to_date(daynum: i64) -> Result<DateParts> {
    let estimate = |shift: i64| ((daynum + shift) as f64 / MEAN_YEAR_DAYS).floor() as i64;
    let year = if daynum >= GREGORIAN_FIRST_DAY {
        1600 + estimate(109_573)
    } else if daynum >= FIRST_AD_DAY {
        4 + estimate(692_502)
    } else {
        -4 + estimate(695_058)
    };
    let mut year = i32::try_from(year)
        .map_err(|_| Error::InvalidDate(format!("epoch day {daynum} is out of range")))?;

    let mut days = daynum - first_day_of_year(year)? + 1;
    if days <= 0 {
        year -= 1;
        days = daynum - first_day_of_year(year)? + 1;
    }
    let days_in_year = if is_leap_year(year) { 366 } else { 365 };
    if days > days_in_year {
        year += 1;
        days = daynum - first_day_of_year(year)? + 1;
    }

    if (GREGORIAN_FIRST_DAY..=GREGORIAN_FIRST_YEAR_END).contains(&daynum) {
        days += 10;
    }

    let lengths = &MONTH_LENGTHS[usize::from(is_leap_year(year))];
    let mut month = 12;
    let mut elapsed = 0;
    for (idx, length) in lengths.iter().enumerate() {
        elapsed += length;
        if elapsed >= days {
            month = idx + 1;
            break;
        }
    }
    let prior_months: i64 = lengths[..month - 1].iter().sum();

    Ok(DateParts {
        day: (days - prior_months) as u32,
        month: month as u32,
        year,
    })
}
