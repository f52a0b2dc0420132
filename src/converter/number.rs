use crate::converter::{Converter, FromArguments, ValidationError};
use crate::error::RuleError;
use crate::parser::{parse_arguments, ArgSpec, ArgKind, ArgValue};
use crate::value::Value;

///Matches positive integers, and negative integers with `signed=true`.
///
///```text
///<int:id>
///<int(fixed_digits=4):year>
///<int(min=1, max=12):month>
///```
///
///A number with `fixed_digits` is zero padded when a URL is built and has to
///have exactly that many digits when it's matched. Values outside `min` and
///`max` are rejected in both directions.
#[derive(Clone, Debug, Default)]
pub struct IntegerConverter {
    ///The exact number of digits, if any.
    pub fixed_digits: Option<usize>,
    ///The smallest accepted value, if any.
    pub min: Option<i64>,
    ///The largest accepted value, if any.
    pub max: Option<i64>,
    ///Accept negative numbers.
    pub signed: bool,
}

impl IntegerConverter {
    fn check(&self, value: i64) -> Result<i64, ValidationError> {
        if (!self.signed && value < 0)
            || self.min.map_or(false, |min| value < min)
            || self.max.map_or(false, |max| value > max) {
            Err(ValidationError)
        } else {
            Ok(value)
        }
    }
}

impl FromArguments for IntegerConverter {
    fn from_arguments(args: Option<&str>) -> Result<IntegerConverter, RuleError> {
        let arguments = parse_arguments(args, &[
            ArgSpec::new("fixed_digits", ArgKind::Int),
            ArgSpec::new("min", ArgKind::Int),
            ArgSpec::new("max", ArgKind::Int),
            ArgSpec::with_default("signed", ArgKind::Bool, ArgValue::Bool(false)),
        ])?;

        let fixed_digits = match arguments.int("fixed_digits") {
            Some(digits) if digits < 1 => return Err(RuleError::InvalidArgument(format!("fixed_digits must be positive, not {}", digits))),
            digits => digits.map(|digits| digits as usize),
        };

        let converter = IntegerConverter {
            fixed_digits: fixed_digits,
            min: arguments.int("min"),
            max: arguments.int("max"),
            signed: arguments.flag("signed"),
        };

        check_bounds(converter.min, converter.max)?;
        Ok(converter)
    }
}

impl Converter for IntegerConverter {
    fn regex(&self) -> &str {
        if self.signed { r"-?\d+" } else { r"\d+" }
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        if let Some(digits) = self.fixed_digits {
            if raw.trim_start_matches('-').len() != digits {
                return Err(ValidationError);
            }
        }

        let value = raw.parse().map_err(|_| ValidationError)?;
        self.check(value).map(Value::Int)
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let value = match *value {
            Value::Int(i) => i,
            Value::Str(ref s) => s.parse().map_err(|_| ValidationError)?,
            Value::Float(_) => return Err(ValidationError),
        };

        let value = self.check(value)?;
        let sign = if value < 0 { "-" } else { "" };
        let digits = value.unsigned_abs().to_string();

        match self.fixed_digits {
            Some(width) if digits.len() > width => Err(ValidationError),
            Some(width) => Ok(format!("{}{:0>width$}", sign, digits, width = width)),
            None => Ok(format!("{}{}", sign, digits)),
        }
    }
}

///Matches floating point numbers with a decimal point, like `1.0` or
///`0.25`. Negative numbers are accepted with `signed=true`.
///
///```text
///<float:ratio>
///<float(min=0.0, max=1.0):opacity>
///```
#[derive(Clone, Debug, Default)]
pub struct FloatConverter {
    ///The smallest accepted value, if any.
    pub min: Option<f64>,
    ///The largest accepted value, if any.
    pub max: Option<f64>,
    ///Accept negative numbers.
    pub signed: bool,
}

impl FloatConverter {
    fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite()
            || (!self.signed && value < 0.0)
            || self.min.map_or(false, |min| value < min)
            || self.max.map_or(false, |max| value > max) {
            Err(ValidationError)
        } else {
            Ok(value)
        }
    }
}

impl FromArguments for FloatConverter {
    fn from_arguments(args: Option<&str>) -> Result<FloatConverter, RuleError> {
        let arguments = parse_arguments(args, &[
            ArgSpec::new("min", ArgKind::Float),
            ArgSpec::new("max", ArgKind::Float),
            ArgSpec::with_default("signed", ArgKind::Bool, ArgValue::Bool(false)),
        ])?;

        let converter = FloatConverter {
            min: arguments.float("min"),
            max: arguments.float("max"),
            signed: arguments.flag("signed"),
        };

        check_bounds(converter.min, converter.max)?;
        Ok(converter)
    }
}

impl Converter for FloatConverter {
    fn regex(&self) -> &str {
        if self.signed { r"-?\d+\.\d+" } else { r"\d+\.\d+" }
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        let value = raw.parse().map_err(|_| ValidationError)?;
        self.check(value).map(Value::Float)
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let value = match *value {
            Value::Float(f) => f,
            Value::Int(i) => i as f64,
            Value::Str(ref s) => s.parse().map_err(|_| ValidationError)?,
        };

        let mut formatted = self.check(value)?.to_string();
        if !formatted.contains('.') {
            formatted.push_str(".0");
        }

        Ok(formatted)
    }
}

fn check_bounds<T: PartialOrd + ::std::fmt::Display>(min: Option<T>, max: Option<T>) -> Result<(), RuleError> {
    match (min, max) {
        (Some(min), Some(max)) if max < min => Err(RuleError::InvalidArgument(format!("max {} is less than min {}", max, min))),
        _ => Ok(()),
    }
}
