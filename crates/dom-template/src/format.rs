/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Format classes.
//!
//! The formatting operator names a format class registered on the template;
//! the `text` and `value` operators of the same element then render their
//! value through it instead of the default textual form.

use std::collections::HashMap;
use std::fmt::{self, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{TemplateError, TemplateResult};
use crate::value::ContentValue;

pub trait Format {
    fn format(&self, value: &ContentValue) -> TemplateResult<String>;

    fn parse(&self, text: &str) -> TemplateResult<ContentValue>;

    /// True when `text` is acceptable input for [`Format::parse`].
    fn test(&self, text: &str) -> bool {
        self.parse(text).is_ok()
    }
}

/// Format classes by name.
#[derive(Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, format: impl Format + 'static) {
        self.formats.insert(name.into(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Format> {
        self.formats.get(name).map(|f| f.as_ref())
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatRegistry").field("formats", &names).finish()
    }
}

/// Dates rendered with a `strftime` pattern, e.g. `%Y-%m-%d`.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Format for DateFormat {
    fn format(&self, value: &ContentValue) -> TemplateResult<String> {
        match value {
            ContentValue::Date(date) => {
                let mut out = String::new();
                write!(out, "{}", date.format(&self.pattern)).map_err(|_| TemplateError::Format {
                    message: format!("Invalid date pattern `{}`.", self.pattern),
                })?;
                Ok(out)
            }
            other => Err(TemplateError::Format {
                message: format!("Date format expects a date but got {}.", other.kind()),
            }),
        }
    }

    fn parse(&self, text: &str) -> TemplateResult<ContentValue> {
        let parsed = NaiveDateTime::parse_from_str(text, &self.pattern).or_else(|_| {
            NaiveDate::parse_from_str(text, &self.pattern).map(|d| d.and_time(NaiveTime::MIN))
        });
        match parsed {
            Ok(naive) => Ok(ContentValue::Date(DateTime::<Utc>::from_naive_utc_and_offset(
                naive, Utc,
            ))),
            Err(err) => Err(TemplateError::Format {
                message: format!("Cannot parse `{}` as date: {}", text, err),
            }),
        }
    }
}

/// Numbers with a fixed count of fraction digits and optional digit grouping.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    decimals: usize,
    grouping: Option<char>,
}

impl NumberFormat {
    pub fn new(decimals: usize) -> Self {
        Self {
            decimals,
            grouping: None,
        }
    }

    pub fn with_grouping(mut self, separator: char) -> Self {
        self.grouping = Some(separator);
        self
    }
}

impl Format for NumberFormat {
    fn format(&self, value: &ContentValue) -> TemplateResult<String> {
        let ContentValue::Number(n) = value else {
            return Err(TemplateError::Format {
                message: format!("Number format expects a number but got {}.", value.kind()),
            });
        };
        let fixed = format!("{:.*}", self.decimals, n);
        let Some(separator) = self.grouping else {
            return Ok(fixed);
        };

        let (sign, unsigned) = match fixed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", fixed.as_str()),
        };
        let (integer, fraction) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };
        let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(separator);
            }
            grouped.push(digit);
        }
        Ok(match fraction {
            Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
            None => format!("{}{}", sign, grouped),
        })
    }

    fn parse(&self, text: &str) -> TemplateResult<ContentValue> {
        let cleaned: String = match self.grouping {
            Some(separator) => text.chars().filter(|c| *c != separator).collect(),
            None => text.to_string(),
        };
        cleaned
            .trim()
            .parse::<f64>()
            .map(ContentValue::Number)
            .map_err(|err| TemplateError::Format {
                message: format!("Cannot parse `{}` as number: {}", text, err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_format() {
        let format = DateFormat::new("%d.%m.%Y");
        let date = Utc.with_ymd_and_hms(1964, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(format.format(&ContentValue::Date(date)).unwrap(), "15.03.1964");
        assert_eq!(format.parse("15.03.1964").unwrap(), ContentValue::Date(date));
        assert!(format.test("01.01.2000"));
        assert!(!format.test("2000-01-01"));
        assert!(format.format(&ContentValue::from("x")).is_err());
    }

    #[test]
    fn test_number_format() {
        let format = NumberFormat::new(2).with_grouping(',');
        assert_eq!(format.format(&ContentValue::from(1_234_567.5)).unwrap(), "1,234,567.50");
        assert_eq!(format.format(&ContentValue::from(-999)).unwrap(), "-999.00");
        assert_eq!(format.parse("1,000.25").unwrap(), ContentValue::Number(1000.25));

        let plain = NumberFormat::new(0);
        assert_eq!(plain.format(&ContentValue::from(42.4)).unwrap(), "42");
        assert!(!plain.test("forty-two"));
    }

    #[test]
    fn test_registry() {
        let mut registry = FormatRegistry::new();
        registry.register("price", NumberFormat::new(2));
        assert!(registry.get("price").is_some());
        assert!(registry.get("date").is_none());
    }
}
