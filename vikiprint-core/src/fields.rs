//! Typed reading of FS-separated reply fields

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use vikiprint_types::Amount;

use crate::{
    command::Command,
    constants::FS,
    error::{Error, Result},
};

/// Sequential reader over the fields of a reply payload
///
/// Each accessor consumes one field and fails with
/// [`Error::MalformedPayload`] naming the command when the field is missing
/// or does not parse. Nothing is defaulted.
pub struct Fields<'a> {
    command: Command,
    items: Vec<&'a str>,
    pos: usize,
}

impl<'a> Fields<'a> {
    pub fn new(command: Command, data: &'a str) -> Self {
        let items = if data.is_empty() {
            Vec::new()
        } else {
            data.split(char::from(FS)).collect()
        };

        Self {
            command,
            items,
            pos: 0,
        }
    }

    /// Whether the payload carried no fields at all
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the next field as text
    pub fn next_str(&mut self, name: &str) -> Result<&'a str> {
        let value = self
            .items
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::malformed(self.command, format!("missing field `{name}`")))?;
        self.pos += 1;
        Ok(value)
    }

    pub fn string(&mut self, name: &str) -> Result<String> {
        self.next_str(name).map(str::to_owned)
    }

    /// Take the next field as an unsigned integer
    pub fn uint<T: FromStr>(&mut self, name: &str) -> Result<T> {
        let value = self.next_str(name)?;
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.invalid(name, value));
        }
        value.parse().map_err(|_| self.invalid(name, value))
    }

    /// Take the next field as a fixed-point amount
    pub fn amount(&mut self, name: &str) -> Result<Amount> {
        let value = self.next_str(name)?;
        value.parse().map_err(|_| self.invalid(name, value))
    }

    /// Take a date field (`ddMMyy` or `ddMMyyyy`) and a time field (`HHmmss`)
    pub fn date_time(&mut self, date_name: &str, time_name: &str) -> Result<NaiveDateTime> {
        let date = self.next_str(date_name)?;
        let time = self.next_str(time_name)?;

        let date = parse_date(date).ok_or_else(|| self.invalid(date_name, date))?;
        let time = parse_time(time).ok_or_else(|| self.invalid(time_name, time))?;

        Ok(NaiveDateTime::new(date, time))
    }

    /// Everything not consumed yet, without the trailing empty field
    pub fn rest(&mut self) -> Vec<String> {
        let mut rest: Vec<String> = self.items[self.pos.min(self.items.len())..]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        if rest.last().is_some_and(|s| s.is_empty()) {
            rest.pop();
        }
        self.pos = self.items.len();
        rest
    }

    fn invalid(&self, name: &str, value: &str) -> Error {
        Error::malformed(self.command, format!("invalid field `{name}`: {value:?}"))
    }
}

fn digits(s: &str, range: std::ops::Range<usize>) -> Option<u32> {
    let part = s.get(range)?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// `ddMMyy` (years 2000-2099) or `ddMMyyyy`
fn parse_date(s: &str) -> Option<NaiveDate> {
    let year = match s.len() {
        6 => 2000 + digits(s, 4..6)? as i32,
        8 => digits(s, 4..8)? as i32,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, digits(s, 2..4)?, digits(s, 0..2)?)
}

/// `HHmmss`
fn parse_time(s: &str) -> Option<NaiveTime> {
    if s.len() != 6 {
        return None;
    }
    NaiveTime::from_hms_opt(digits(s, 0..2)?, digits(s, 2..4)?, digits(s, 4..6)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trailing_empty_field() {
        let mut fields = Fields::new(Command::StatusFlags, "0\u{1c}4\u{1c}2\u{1c}");
        assert_eq!(fields.uint::<u32>("fatal").unwrap(), 0);
        assert_eq!(fields.uint::<u32>("flags").unwrap(), 4);
        assert_eq!(fields.uint::<u32>("document").unwrap(), 2);
        assert!(fields.rest().is_empty());
    }

    #[test]
    fn test_missing_field() {
        let mut fields = Fields::new(Command::StatusFlags, "0");
        fields.uint::<u32>("fatal").unwrap();
        let err = fields.uint::<u32>("flags").unwrap_err();
        assert_eq!(
            err,
            Error::MalformedPayload {
                command: Command::StatusFlags,
                reason: "missing field `flags`".into(),
            }
        );
    }

    #[test]
    fn test_non_numeric_field() {
        let mut fields = Fields::new(Command::StatusFlags, "x\u{1c}");
        assert!(matches!(
            fields.uint::<u32>("fatal"),
            Err(Error::MalformedPayload { command: Command::StatusFlags, .. })
        ));

        let mut fields = Fields::new(Command::StatusFlags, "\u{1c}");
        assert!(fields.uint::<u32>("fatal").is_err());
    }

    #[test]
    fn test_empty_payload_has_no_fields() {
        let fields = Fields::new(Command::AddItem, "");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_date_time_short_year() {
        let mut fields = Fields::new(Command::CloseDocument, "310124\u{1c}235959");
        let at = fields.date_time("date", "time").unwrap();
        assert_eq!(at.to_string(), "2024-01-31 23:59:59");
    }

    #[test]
    fn test_date_time_long_year() {
        let mut fields = Fields::new(Command::CloseDocument, "01022025\u{1c}080000");
        let at = fields.date_time("date", "time").unwrap();
        assert_eq!(at.to_string(), "2025-02-01 08:00:00");
    }

    #[test]
    fn test_date_time_invalid() {
        let mut fields = Fields::new(Command::CloseDocument, "3101\u{1c}235959");
        assert!(fields.date_time("date", "time").is_err());

        let mut fields = Fields::new(Command::CloseDocument, "320124\u{1c}235959");
        assert!(fields.date_time("date", "time").is_err());

        let mut fields = Fields::new(Command::CloseDocument, "310124\u{1c}2359");
        assert!(fields.date_time("date", "time").is_err());
    }

    #[test]
    fn test_rest() {
        let mut fields = Fields::new(Command::ErrorInfo, "3\u{1c}a\u{1c}b\u{1c}");
        assert_eq!(fields.uint::<u32>("request").unwrap(), 3);
        assert_eq!(fields.rest(), vec!["a".to_string(), "b".to_string()]);
    }
}
