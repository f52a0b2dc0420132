//!Rule template and converter argument parsing.
//!
//!A template is a sequence of static text and variables:
//!
//!```text
//!/browse/<int:id>/<int(min=1):page>
//!/user/<name>
//!```
//!
//!`<name>` is the same as `<default:name>`.

use std::collections::{HashMap, HashSet};

use crate::error::RuleError;

///A part of a parsed rule template.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment<'a> {
    ///Static text that is matched and built as it is.
    Static(&'a str),
    ///A variable that is handled by a converter.
    Variable {
        ///The name of the variable.
        name: &'a str,
        ///The name of the converter.
        converter: &'a str,
        ///The raw argument string for the converter, if any.
        args: Option<&'a str>,
    },
}

///Parse a rule template into a lazy sequence of segments.
///
///```
///use urlmap::parser::{parse_rule, Segment};
///
///let segments: Result<Vec<_>, _> = parse_rule("/page/<int:id>").collect();
///assert_eq!(segments.unwrap(), vec![
///    Segment::Static("/page/"),
///    Segment::Variable { name: "id", converter: "int", args: None },
///]);
///```
pub fn parse_rule(rule: &str) -> RuleParser {
    RuleParser {
        rule: rule,
        position: 0,
        used_names: HashSet::new(),
        pending: None,
        failed: false,
    }
}

///An iterator over the segments of a rule template.
pub struct RuleParser<'a> {
    rule: &'a str,
    position: usize,
    used_names: HashSet<&'a str>,
    pending: Option<Segment<'a>>,
    failed: bool,
}

impl<'a> RuleParser<'a> {
    fn malformed(&mut self) -> Option<Result<Segment<'a>, RuleError>> {
        self.failed = true;
        Some(Err(RuleError::MalformedRule(self.rule.to_owned())))
    }

    //Parses `converter(args):name>` or `name>`, starting after the `<`.
    fn parse_variable(&self, start: usize) -> Option<(Segment<'a>, usize)> {
        let bytes = self.rule.as_bytes();
        let first_end = scan_identifier(bytes, start)?;
        let first = &self.rule[start..first_end];

        match bytes.get(first_end) {
            Some(&b'>') => Some((Segment::Variable {
                name: first,
                converter: "default",
                args: None,
            }, first_end + 1)),
            Some(&b'(') => {
                let args_end = self.rule[first_end..].find(')').map(|i| first_end + i)?;
                if bytes.get(args_end + 1) != Some(&b':') {
                    return None;
                }

                let name_end = scan_identifier(bytes, args_end + 2)?;
                if bytes.get(name_end) != Some(&b'>') {
                    return None;
                }

                Some((Segment::Variable {
                    name: &self.rule[args_end + 2..name_end],
                    converter: first,
                    args: Some(&self.rule[first_end + 1..args_end]),
                }, name_end + 1))
            },
            Some(&b':') => {
                let name_end = scan_identifier(bytes, first_end + 1)?;
                if bytes.get(name_end) != Some(&b'>') {
                    return None;
                }

                Some((Segment::Variable {
                    name: &self.rule[first_end + 1..name_end],
                    converter: first,
                    args: None,
                }, name_end + 1))
            },
            _ => None
        }
    }
}

impl<'a> Iterator for RuleParser<'a> {
    type Item = Result<Segment<'a>, RuleError>;

    fn next(&mut self) -> Option<Result<Segment<'a>, RuleError>> {
        if self.failed {
            return None;
        }

        if let Some(segment) = self.pending.take() {
            return Some(Ok(segment));
        }

        if self.position >= self.rule.len() {
            return None;
        }

        let rest = &self.rule[self.position..];
        let static_end = rest.find('<').map(|i| self.position + i).unwrap_or_else(|| self.rule.len());
        let static_part = &self.rule[self.position..static_end];

        if static_part.contains('>') {
            return self.malformed();
        }

        if static_end == self.rule.len() {
            self.position = static_end;
            return Some(Ok(Segment::Static(static_part)));
        }

        let (variable, end) = match self.parse_variable(static_end + 1) {
            Some(result) => result,
            None => return self.malformed(),
        };

        if let Segment::Variable { name, .. } = variable {
            if !self.used_names.insert(name) {
                self.failed = true;
                return Some(Err(RuleError::DuplicateVariable(name.to_owned())));
            }
        }

        self.position = end;

        if static_part.is_empty() {
            Some(Ok(variable))
        } else {
            self.pending = Some(variable);
            Some(Ok(Segment::Static(static_part)))
        }
    }
}

fn scan_identifier(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start) {
        Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {},
        _ => return None,
    }

    let length = bytes[start..].iter().take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_').count();
    Some(start + length)
}

///The expected type of a converter option.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgKind {
    ///A signed integer.
    Int,
    ///A floating point number.
    Float,
    ///A boolean, written as `true`, `yes`, `on` or `1` (or their opposites).
    Bool,
    ///Any text.
    Str,
}

///A coerced converter option.
#[derive(Clone, PartialEq, Debug)]
pub enum ArgValue {
    ///An integer.
    Int(i64),
    ///A floating point number.
    Float(f64),
    ///A boolean.
    Bool(bool),
    ///Text.
    Str(String),
}

///The declaration of a converter option.
///
///A `default` of `None` means that the option is unset unless it's given.
#[derive(Clone, Debug)]
pub struct ArgSpec {
    ///The option name.
    pub name: &'static str,
    ///The expected type.
    pub kind: ArgKind,
    ///The value to use when the option is left out.
    pub default: Option<ArgValue>,
}

impl ArgSpec {
    ///Declare an option without default value.
    pub fn new(name: &'static str, kind: ArgKind) -> ArgSpec {
        ArgSpec {
            name: name,
            kind: kind,
            default: None,
        }
    }

    ///Declare an option with a default value.
    pub fn with_default(name: &'static str, kind: ArgKind, default: ArgValue) -> ArgSpec {
        ArgSpec {
            name: name,
            kind: kind,
            default: Some(default),
        }
    }
}

///The parsed arguments of a converter.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    ///Arguments without a `key=`, in the order they were written.
    pub positional: Vec<String>,
    options: HashMap<&'static str, ArgValue>,
}

impl Arguments {
    ///Get an integer option, if it's set.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(&ArgValue::Int(i)) => Some(i),
            _ => None,
        }
    }

    ///Get a floating point option, if it's set.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.options.get(name) {
            Some(&ArgValue::Float(f)) => Some(f),
            Some(&ArgValue::Int(i)) => Some(i as f64),
            _ => None,
        }
    }

    ///Get a boolean option. Unset booleans are `false`.
    pub fn flag(&self, name: &str) -> bool {
        match self.options.get(name) {
            Some(&ArgValue::Bool(b)) => b,
            _ => false,
        }
    }

    ///Get a text option, if it's set.
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(&ArgValue::Str(ref s)) => Some(s),
            _ => None,
        }
    }
}

///Parse a converter argument string, like `minlength=2,maxlength=6`,
///against a set of declared options.
///
///Unknown options and values that can't be coerced are rejected.
///Positional items (without `=`) are collected in order.
///
///```
///use urlmap::parser::{parse_arguments, ArgSpec, ArgKind};
///
///let declared = [
///    ArgSpec::new("min", ArgKind::Int),
///    ArgSpec::new("signed", ArgKind::Bool),
///];
///
///let arguments = parse_arguments(Some("min=3, signed=Yes"), &declared).unwrap();
///assert_eq!(arguments.int("min"), Some(3));
///assert!(arguments.flag("signed"));
///
///assert!(parse_arguments(Some("max=3"), &declared).is_err());
///```
pub fn parse_arguments(source: Option<&str>, declared: &[ArgSpec]) -> Result<Arguments, RuleError> {
    let mut arguments = Arguments::default();

    for spec in declared {
        if let Some(ref default) = spec.default {
            arguments.options.insert(spec.name, default.clone());
        }
    }

    let source = match source {
        Some(source) => source,
        None => return Ok(arguments),
    };

    for item in split_arguments(source)? {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        match find_unquoted(item, '=') {
            Some(index) => {
                let key = item[..index].trim();
                let raw = unquote(item[index + 1..].trim());
                let spec = declared.iter().find(|spec| spec.name == key).ok_or_else(|| {
                    RuleError::InvalidArgument(format!("unknown option `{}`", key))
                })?;
                arguments.options.insert(spec.name, coerce(spec, raw)?);
            },
            None => arguments.positional.push(unquote(item).to_owned()),
        }
    }

    Ok(arguments)
}

fn coerce(spec: &ArgSpec, raw: &str) -> Result<ArgValue, RuleError> {
    let invalid = || RuleError::InvalidArgument(format!("`{}` is not a valid value for `{}`", raw, spec.name));

    match spec.kind {
        ArgKind::Int => raw.parse().map(ArgValue::Int).map_err(|_| invalid()),
        ArgKind::Float => raw.parse().map(ArgValue::Float).map_err(|_| invalid()),
        ArgKind::Bool => match &*raw.to_ascii_lowercase() {
            "true" | "yes" | "on" | "1" => Ok(ArgValue::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(ArgValue::Bool(false)),
            _ => Err(invalid()),
        },
        ArgKind::Str => Ok(ArgValue::Str(raw.to_owned())),
    }
}

//Splits on commas that are outside quotes.
fn split_arguments(source: &str) -> Result<Vec<&str>, RuleError> {
    let mut items = vec![];
    let mut quote = None;
    let mut start = 0;

    for (index, c) in source.char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            (None, ',') => {
                items.push(&source[start..index]);
                start = index + 1;
            },
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(RuleError::InvalidArgument(format!("unbalanced quotes in `{}`", source)));
    }

    items.push(&source[start..]);
    Ok(items)
}

fn find_unquoted(item: &str, needle: char) -> Option<usize> {
    let mut quote = None;
    for (index, c) in item.char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            (None, c) if c == needle => return Some(index),
            _ => {}
        }
    }

    None
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::{parse_rule, parse_arguments, Segment, ArgSpec, ArgKind, ArgValue};
    use crate::error::RuleError;

    macro_rules! parse {
        ($rule: expr) => (
            parse_rule($rule).collect::<Result<Vec<_>, _>>()
        );
    }

    macro_rules! var {
        ($converter: expr, $name: expr) => (
            Segment::Variable { name: $name, converter: $converter, args: None }
        );
        ($converter: expr, $args: expr, $name: expr) => (
            Segment::Variable { name: $name, converter: $converter, args: Some($args) }
        );
    }

    #[test]
    fn static_rule() {
        assert_eq!(parse!("/about/us"), Ok(vec![Segment::Static("/about/us")]));
        assert_eq!(parse!(""), Ok(vec![]));
    }

    #[test]
    fn variables() {
        assert_eq!(parse!("/browse/<int:id>/<int:page>"), Ok(vec![
            Segment::Static("/browse/"),
            var!("int", "id"),
            Segment::Static("/"),
            var!("int", "page"),
        ]));

        assert_eq!(parse!("/<name>"), Ok(vec![
            Segment::Static("/"),
            var!("default", "name"),
        ]));

        assert_eq!(parse!("/<string(minlength=2, maxlength=6):name>.html"), Ok(vec![
            Segment::Static("/"),
            var!("string", "minlength=2, maxlength=6", "name"),
            Segment::Static(".html"),
        ]));

        assert_eq!(parse!("<a><b>"), Ok(vec![
            var!("default", "a"),
            var!("default", "b"),
        ]));
    }

    #[test]
    fn duplicate_names() {
        assert_eq!(parse!("/<a>/<int:a>"), Err(RuleError::DuplicateVariable("a".into())));
    }

    #[test]
    fn malformed_rules() {
        for &rule in &["/<a", "/a>", "/<>", "/<1a>", "/<int:>", "/<int(x=1)name>", "/<int(x=1:name>", "/<a b>"] {
            assert_eq!(parse!(rule), Err(RuleError::MalformedRule(rule.into())), "{}", rule);
        }
    }

    #[test]
    fn stops_after_error() {
        let mut parser = parse_rule("/<a>/<a>/c");
        assert_eq!(parser.next(), Some(Ok(Segment::Static("/"))));
        assert_eq!(parser.next(), Some(Ok(var!("default", "a"))));
        assert_eq!(parser.next(), Some(Err(RuleError::DuplicateVariable("a".into()))));
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn arguments() {
        let declared = [
            ArgSpec::with_default("minlength", ArgKind::Int, ArgValue::Int(1)),
            ArgSpec::new("maxlength", ArgKind::Int),
            ArgSpec::new("ratio", ArgKind::Float),
            ArgSpec::new("allow_slash", ArgKind::Bool),
            ArgSpec::new("label", ArgKind::Str),
        ];

        let defaults = parse_arguments(None, &declared).unwrap();
        assert_eq!(defaults.int("minlength"), Some(1));
        assert_eq!(defaults.int("maxlength"), None);
        assert!(!defaults.flag("allow_slash"));

        let parsed = parse_arguments(Some("maxlength=6, ratio=0.5,allow_slash=ON, label='a,b'"), &declared).unwrap();
        assert_eq!(parsed.int("minlength"), Some(1));
        assert_eq!(parsed.int("maxlength"), Some(6));
        assert_eq!(parsed.float("ratio"), Some(0.5));
        assert!(parsed.flag("allow_slash"));
        assert_eq!(parsed.string("label"), Some("a,b"));
    }

    #[test]
    fn boolean_arguments() {
        let declared = [ArgSpec::new("flag", ArgKind::Bool)];
        for &truthy in &["true", "Yes", "on", "1"] {
            assert!(parse_arguments(Some(&format!("flag={}", truthy)), &declared).unwrap().flag("flag"));
        }
        for &falsy in &["false", "NO", "off", "0"] {
            assert!(!parse_arguments(Some(&format!("flag={}", falsy)), &declared).unwrap().flag("flag"));
        }
        assert!(parse_arguments(Some("flag=maybe"), &declared).is_err());
    }

    #[test]
    fn positional_arguments() {
        let parsed = parse_arguments(Some("about, 'help', \"x,y\""), &[]).unwrap();
        assert_eq!(parsed.positional, vec!["about", "help", "x,y"]);
    }

    #[test]
    fn rejected_arguments() {
        let declared = [ArgSpec::new("min", ArgKind::Int)];
        assert!(parse_arguments(Some("max=2"), &declared).is_err());
        assert!(parse_arguments(Some("min=two"), &declared).is_err());
        assert!(parse_arguments(Some("min='2"), &declared).is_err());
    }
}
