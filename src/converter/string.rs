use uuid::Uuid;

use crate::converter::{Converter, FromArguments, ValidationError};
use crate::error::RuleError;
use crate::parser::{parse_arguments, ArgSpec, ArgKind, ArgValue};
use crate::utils::{quote_segment, quote_path};
use crate::value::Value;

///The default converter, for text.
///
///It accepts one or more characters, except slashes, by default. The length
///can be limited with `minlength`, `maxlength` or an exact `length`, and
///slashes are accepted with `allow_slash=true`.
///
///```text
///<name>
///<string(length=2):lang>
///<string(minlength=3, maxlength=20):username>
///```
#[derive(Clone, Debug)]
pub struct UnicodeConverter {
    regex: String,
    minlength: usize,
    maxlength: Option<usize>,
    allow_slash: bool,
}

impl UnicodeConverter {
    ///Create a converter with explicit limits.
    pub fn new(minlength: usize, maxlength: Option<usize>, allow_slash: bool) -> Result<UnicodeConverter, RuleError> {
        if let Some(max) = maxlength {
            if max < minlength {
                return Err(RuleError::InvalidArgument(format!("maxlength {} is less than minlength {}", max, minlength)));
            }
        }

        let class = if allow_slash { "." } else { "[^/]" };
        let quantifier = match maxlength {
            Some(max) if max == minlength => format!("{{{}}}", max),
            Some(max) => format!("{{{},{}}}", minlength, max),
            None => format!("{{{},}}", minlength),
        };

        //A trailing slash after the variable belongs to the rule, not the value.
        let lazy = if allow_slash { "?" } else { "" };

        Ok(UnicodeConverter {
            regex: format!("{}{}{}", class, quantifier, lazy),
            minlength: minlength,
            maxlength: maxlength,
            allow_slash: allow_slash,
        })
    }
}

impl FromArguments for UnicodeConverter {
    fn from_arguments(args: Option<&str>) -> Result<UnicodeConverter, RuleError> {
        let arguments = parse_arguments(args, &[
            ArgSpec::with_default("minlength", ArgKind::Int, ArgValue::Int(1)),
            ArgSpec::new("maxlength", ArgKind::Int),
            ArgSpec::new("length", ArgKind::Int),
            ArgSpec::with_default("allow_slash", ArgKind::Bool, ArgValue::Bool(false)),
        ])?;

        let minlength = arguments.int("minlength").map(non_negative).unwrap_or(Ok(1))?;
        let maxlength = arguments.int("maxlength").map(non_negative).transpose()?;

        match arguments.int("length").map(non_negative).transpose()? {
            Some(length) => UnicodeConverter::new(length, Some(length), arguments.flag("allow_slash")),
            None => UnicodeConverter::new(minlength, maxlength, arguments.flag("allow_slash")),
        }
    }
}

impl Converter for UnicodeConverter {
    fn regex(&self) -> &str {
        &self.regex
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        Ok(Value::Str(raw.to_owned()))
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let text = value.to_string();
        let length = text.chars().count();

        if length < self.minlength || self.maxlength.map_or(false, |max| length > max) {
            return Err(ValidationError);
        }

        if self.allow_slash {
            Ok(quote_path(&text))
        } else {
            Ok(quote_segment(&text))
        }
    }
}

///Like the default converter, but it accepts slashes.
///
///It's meant for file paths and similar, so it has to start with a non-slash
///character.
///
///```text
/// /files/<path:file>
///```
#[derive(Clone, Copy, Debug, Default)]
pub struct PathConverter;

impl FromArguments for PathConverter {
    fn from_arguments(args: Option<&str>) -> Result<PathConverter, RuleError> {
        parse_arguments(args, &[])?;
        Ok(PathConverter)
    }
}

impl Converter for PathConverter {
    fn regex(&self) -> &str {
        "[^/].*?"
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        Ok(Value::Str(raw.to_owned()))
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let text = value.to_string();
        if text.is_empty() || text.starts_with('/') {
            Err(ValidationError)
        } else {
            Ok(quote_path(&text))
        }
    }
}

///Matches one of a fixed set of items.
///
///```text
/// /<any(about, help, imprint, "class"):page_name>
///```
#[derive(Clone, Debug)]
pub struct AnyConverter {
    regex: String,
    items: Vec<String>,
}

impl AnyConverter {
    ///Create a converter for the given items.
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(items: I) -> Result<AnyConverter, RuleError> {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(RuleError::InvalidArgument("the any converter needs at least one item".into()));
        }

        let alternatives: Vec<String> = items.iter().map(|item| regex::escape(item)).collect();

        Ok(AnyConverter {
            regex: format!("(?:{})", alternatives.join("|")),
            items: items,
        })
    }
}

impl FromArguments for AnyConverter {
    fn from_arguments(args: Option<&str>) -> Result<AnyConverter, RuleError> {
        AnyConverter::new(parse_arguments(args, &[])?.positional)
    }
}

impl Converter for AnyConverter {
    fn regex(&self) -> &str {
        &self.regex
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        Ok(Value::Str(raw.to_owned()))
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let text = value.to_string();
        if self.items.contains(&text) {
            Ok(quote_segment(&text))
        } else {
            Err(ValidationError)
        }
    }
}

///Accepts hyphenated UUIDs in any case. Values are lowercase.
///
///```text
/// /objects/<uuid:id>
///```
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidConverter;

impl FromArguments for UuidConverter {
    fn from_arguments(args: Option<&str>) -> Result<UuidConverter, RuleError> {
        parse_arguments(args, &[])?;
        Ok(UuidConverter)
    }
}

impl Converter for UuidConverter {
    fn regex(&self) -> &str {
        "[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}"
    }

    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
        let uuid = Uuid::parse_str(raw).map_err(|_| ValidationError)?;
        Ok(Value::Str(uuid.hyphenated().to_string()))
    }

    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
        let uuid = value.as_str().ok_or(ValidationError).and_then(|text| Uuid::parse_str(text).map_err(|_| ValidationError))?;
        Ok(uuid.hyphenated().to_string())
    }
}

fn non_negative(value: i64) -> Result<usize, RuleError> {
    if value < 0 {
        Err(RuleError::InvalidArgument(format!("length {} is negative", value)))
    } else {
        Ok(value as usize)
    }
}

#[cfg(test)]
mod test {
    use super::{UnicodeConverter, PathConverter, AnyConverter, UuidConverter};
    use crate::converter::{Converter, FromArguments, ValidationError};
    use crate::value::Value;

    #[test]
    fn unicode_regex() {
        assert_eq!(UnicodeConverter::from_arguments(None).unwrap().regex(), "[^/]{1,}");
        assert_eq!(UnicodeConverter::from_arguments(Some("length=2")).unwrap().regex(), "[^/]{2}");
        assert_eq!(UnicodeConverter::from_arguments(Some("minlength=2, maxlength=6")).unwrap().regex(), "[^/]{2,6}");
        assert_eq!(UnicodeConverter::from_arguments(Some("allow_slash=yes")).unwrap().regex(), ".{1,}?");
        assert!(UnicodeConverter::from_arguments(Some("minlength=6, maxlength=2")).is_err());
        assert!(UnicodeConverter::from_arguments(Some("length=-1")).is_err());
    }

    #[test]
    fn unicode_urls() {
        let converter = UnicodeConverter::from_arguments(Some("minlength=2, maxlength=3")).unwrap();
        assert_eq!(converter.to_value("ab"), Ok(Value::Str("ab".into())));
        assert_eq!(converter.to_url(&"ab".into()), Ok("ab".into()));
        assert_eq!(converter.to_url(&"a/b".into()), Ok("a%2Fb".into()));
        assert_eq!(converter.to_url(&"a".into()), Err(ValidationError));
        assert_eq!(converter.to_url(&"abcd".into()), Err(ValidationError));
        assert_eq!(converter.to_url(&Value::Int(12)), Ok("12".into()));

        let slashes = UnicodeConverter::from_arguments(Some("allow_slash=true")).unwrap();
        assert_eq!(slashes.to_url(&"a b/c".into()), Ok("a%20b/c".into()));
    }

    #[test]
    fn path() {
        let converter = PathConverter;
        assert_eq!(converter.to_url(&"docs/index.html".into()), Ok("docs/index.html".into()));
        assert_eq!(converter.to_url(&"/etc".into()), Err(ValidationError));
        assert!(PathConverter::from_arguments(Some("x=1")).is_err());
    }

    #[test]
    fn any() {
        let converter = AnyConverter::from_arguments(Some("about, help, 'a.b'")).unwrap();
        assert_eq!(converter.regex(), r"(?:about|help|a\.b)");
        assert_eq!(converter.to_url(&"help".into()), Ok("help".into()));
        assert_eq!(converter.to_url(&"imprint".into()), Err(ValidationError));
        assert!(AnyConverter::from_arguments(None).is_err());
    }

    #[test]
    fn uuid() {
        let converter = UuidConverter;
        assert_eq!(converter.to_value("A8098C1A-F86E-11DA-BD1A-00112444BE1E"), Ok("a8098c1a-f86e-11da-bd1a-00112444be1e".into()));
        assert_eq!(converter.to_url(&"a8098c1a-f86e-11da-bd1a-00112444be1e".into()), Ok("a8098c1a-f86e-11da-bd1a-00112444be1e".into()));
        assert_eq!(converter.to_url(&"not-a-uuid".into()), Err(ValidationError));
        assert_eq!(converter.to_url(&Value::Int(1)), Err(ValidationError));
        assert!(UuidConverter::from_arguments(Some("x=1")).is_err());
    }
}
