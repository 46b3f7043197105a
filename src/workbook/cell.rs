use crate::error::DecodeError;
use crate::table::Value;
use crate::workbook::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::TimeDelta;

/// Serial day of 9999-12-31, the last date a workbook can hold.
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// How the raw text of a workbook cell must be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Serial date-time counted from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial date-time counted from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    IsoDateTime,
    IsoDuration,
    /// Literal text, including resolved shared strings
    Text,
    /// Index into the xlsx shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Built-in xlsx number formats that denote dates or times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::date_time(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::time(is_1904)),
            _ => None,
        }
    }

    /// Classifies a custom format code by the date and time tokens it uses
    /// outside of literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::date_time(is_1904),
            (true, false) => Self::date(is_1904),
            (false, true) => Self::time(is_1904),
            (false, false) => Self::Number,
        }
    }

    fn date_time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }
    }

    fn time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }
    }
}

/// A raw cell as read from a worksheet part.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw text into a normalized [`Value`].
    ///
    /// Date and time serials become ISO text; numbers that do not parse are
    /// kept as text rather than rejected.
    pub(crate) fn to_value(&self) -> Result<Value, DecodeError> {
        let value = match self.kind {
            CellType::Empty => Value::Empty,
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value == "true"),
            CellType::Number => match self.value.trim().parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::Text(self.value.to_owned()),
            },
            CellType::NumberDateTime1900 => Value::Text(to_datetime_string(&self.value, false)?),
            CellType::NumberDateTime1904 => Value::Text(to_datetime_string(&self.value, true)?),
            CellType::NumberDate1900 => Value::Text(to_date_string(&self.value, false)?),
            CellType::NumberDate1904 => Value::Text(to_date_string(&self.value, true)?),
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                Value::Text(to_time_string(&self.value)?)
            }
            CellType::IsoDateTime => Value::Text(self.value.replace('T', " ")),
            CellType::IsoDuration => Value::Text(
                self.value
                    .replace("PT", "")
                    .replace('H', ":")
                    .replace('M', ":")
                    .replace('S', ""),
            ),
            CellType::Text | CellType::SharedString | CellType::Error => {
                Value::Text(self.value.to_owned())
            }
        };
        Ok(value)
    }
}

/// Serial day number to `YYYY-MM-DD`, honouring the Lotus 1-2-3 leap year bug
/// in the 1900 system.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, DecodeError> {
    let out_of_range = || DecodeError::WithContextError(format!("date serial '{}' out of range", value));
    let serial = value.trim().parse::<f64>()?.trunc();
    if !serial.is_finite() || serial.abs() > MAX_DATE_SERIAL {
        return Err(out_of_range());
    }
    let days = serial as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch literal");
    TimeDelta::try_days(days + offset)
        .and_then(|delta| epoch.checked_add_signed(delta))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(out_of_range)
}

/// Day fraction to `HH:MM:SS` (with milliseconds when present).
fn to_time_string(value: &str) -> Result<String, DecodeError> {
    let fraction = value.trim().parse::<f64>()?.fract();
    let mut remaining = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = remaining % 1_000;
    remaining /= 1_000;
    let seconds = remaining % 60;
    remaining /= 60;
    let minutes = remaining % 60;
    let hours = remaining / 60;
    Ok(if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    })
}

fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, DecodeError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 0,
            col: 0,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn builtin_formats() {
        assert_eq!(
            CellType::parse_builtin_number_format_id("14", false),
            Some(CellType::NumberDate1900)
        );
        assert_eq!(
            CellType::parse_builtin_number_format_id("22", true),
            Some(CellType::NumberDateTime1904)
        );
        assert_eq!(CellType::parse_builtin_number_format_id("0", false), None);
    }

    #[test]
    fn custom_formats() {
        assert_eq!(
            CellType::parse_custom_number_format("yyyy-mm-dd", false),
            CellType::NumberDate1900
        );
        assert_eq!(
            CellType::parse_custom_number_format("hh:mm:ss", false),
            CellType::NumberTime1900
        );
        assert_eq!(
            CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", true),
            CellType::NumberDateTime1904
        );
        // colour sections and literals do not count as date tokens
        assert_eq!(
            CellType::parse_custom_number_format("[Red]0.00\"days\"", false),
            CellType::Number
        );
    }

    #[test]
    fn converts_numbers_and_text() {
        assert_eq!(cell(CellType::Number, "42").to_value().unwrap(), Value::Number(42.0));
        assert_eq!(cell(CellType::Number, "4.5").to_value().unwrap(), Value::Number(4.5));
        assert_eq!(cell(CellType::Number, "n/a").to_value().unwrap(), Value::from("n/a"));
        assert_eq!(cell(CellType::Text, "Alice").to_value().unwrap(), Value::from("Alice"));
        assert_eq!(cell(CellType::Boolean, "1").to_value().unwrap(), Value::Boolean(true));
        assert_eq!(cell(CellType::Boolean, "0").to_value().unwrap(), Value::Boolean(false));
    }

    #[test]
    fn converts_date_serials() {
        assert_eq!(
            cell(CellType::NumberDate1900, "45292").to_value().unwrap(),
            Value::from("2024-01-01")
        );
        assert_eq!(
            cell(CellType::NumberDate1904, "0").to_value().unwrap(),
            Value::from("1904-01-01")
        );
        assert_eq!(
            cell(CellType::NumberDateTime1900, "45292.5").to_value().unwrap(),
            Value::from("2024-01-01 12:00:00")
        );
        assert_eq!(
            cell(CellType::NumberTime1900, "0.25").to_value().unwrap(),
            Value::from("06:00:00")
        );
    }

    #[test]
    fn rejects_out_of_range_serials() {
        assert_eq!(
            cell(CellType::NumberDate1900, "2958465").to_value().unwrap(),
            Value::from("9999-12-31")
        );
        for serial in ["1e20", "-1e20", "2958466", "inf", "NaN"] {
            let error = cell(CellType::NumberDate1900, serial).to_value().unwrap_err();
            assert!(error.to_string().contains("out of range"), "{serial}: {error}");
        }
        assert!(cell(CellType::NumberDateTime1904, "1e300").to_value().is_err());
    }

    #[test]
    fn converts_iso_values() {
        assert_eq!(
            cell(CellType::IsoDateTime, "2024-03-01T08:30:00").to_value().unwrap(),
            Value::from("2024-03-01 08:30:00")
        );
        assert_eq!(
            cell(CellType::IsoDuration, "PT10H15M30S").to_value().unwrap(),
            Value::from("10:15:30")
        );
    }

    #[test]
    fn reference_of_cell() {
        let mut cell = cell(CellType::Text, "x");
        cell.row = 1;
        cell.col = 2;
        assert_eq!(cell.reference(), "C2");
    }
}
