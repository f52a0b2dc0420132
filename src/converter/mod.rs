//!Value converters for rule variables.
//!
//!A converter decides what a variable may look like in a URL, by providing a
//!regex fragment, and how it's turned into a typed `Value` and back again.
//!
//!Converters are created from a `Converters` registry that is given to the
//!`Map` when it's constructed. The default registry has the following
//!converters:
//!
//!| Name                | Type                 | Example                          |
//!|---------------------|----------------------|----------------------------------|
//!| `default`, `string` | `UnicodeConverter`   | `<string(minlength=2):name>`     |
//!| `path`              | `PathConverter`      | `<path:file>`                    |
//!| `any`               | `AnyConverter`       | `<any(about, help):page>`        |
//!| `int`               | `IntegerConverter`   | `<int(fixed_digits=4):year>`     |
//!| `float`             | `FloatConverter`     | `<float(signed=true):offset>`    |
//!| `uuid`              | `UuidConverter`      | `<uuid:id>`                      |
//!
//!Custom converters are added with `Converters::register` or
//!`Converters::register_type`:
//!
//!```
//!use urlmap::{Map, MapConfig, Rule, Method, Value};
//!use urlmap::converter::{Converter, Converters, ValidationError};
//!
//!struct Lowercase;
//!
//!impl Converter for Lowercase {
//!    fn regex(&self) -> &str {
//!        "[a-z]+"
//!    }
//!
//!    fn to_value(&self, raw: &str) -> Result<Value, ValidationError> {
//!        Ok(raw.into())
//!    }
//!
//!    fn to_url(&self, value: &Value) -> Result<String, ValidationError> {
//!        value.as_str().map(str::to_lowercase).ok_or(ValidationError)
//!    }
//!}
//!
//!let mut converters = Converters::default();
//!converters.register("lower", |_args: Option<&str>| Ok(Box::new(Lowercase) as Box<dyn Converter>));
//!
//!let mut map = Map::new(MapConfig::default(), converters).unwrap();
//!map.add(Rule::new("/tag/<lower:tag>", "tag")).unwrap();
//!
//!let adapter = map.bind("example.com");
//!assert!(adapter.match_path("/tag/rust", &Method::GET).is_ok());
//!assert!(adapter.match_path("/tag/Rust", &Method::GET).is_err());
//!```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::RuleError;
use crate::value::Value;

pub use self::string::{UnicodeConverter, PathConverter, AnyConverter, UuidConverter};
pub use self::number::{IntegerConverter, FloatConverter};

mod string;
mod number;

///A converter rejected a value.
///
///This is a recoverable condition. While matching, it makes the current rule
///count as not matching, and while building, it makes the URL map try the
///next rule for the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the value was rejected by the converter")]
pub struct ValidationError;

///A value codec for one rule variable.
pub trait Converter: Send + Sync {
    ///The regex fragment that the variable has to match. It may not contain
    ///anchors.
    fn regex(&self) -> &str;

    ///Convert a matched part of the URL into a value.
    fn to_value(&self, raw: &str) -> Result<Value, ValidationError>;

    ///Convert a value into a, possibly escaped, part of a URL.
    fn to_url(&self, value: &Value) -> Result<String, ValidationError>;
}

///Create a converter from the arguments in a rule template.
pub trait FromArguments: Sized {
    ///Parse the raw argument string (the `...` in `<name(...):variable>`)
    ///and create a converter.
    fn from_arguments(args: Option<&str>) -> Result<Self, RuleError>;
}

///A function that creates a converter from its raw arguments.
pub type ConverterFactory = dyn Fn(Option<&str>) -> Result<Box<dyn Converter>, RuleError> + Send + Sync;

///A registry of named converter factories.
///
///The registry is cheap to clone, since the factories are shared.
#[derive(Clone)]
pub struct Converters {
    factories: HashMap<String, Arc<ConverterFactory>>,
}

impl Converters {
    ///Create a registry without any converters.
    pub fn empty() -> Converters {
        Converters {
            factories: HashMap::new(),
        }
    }

    ///Add a converter factory, replacing any existing one with the same
    ///name.
    pub fn register<S, F>(&mut self, name: S, factory: F) where
        S: Into<String>,
        F: Fn(Option<&str>) -> Result<Box<dyn Converter>, RuleError> + Send + Sync + 'static
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    ///Add a converter type that can be created from template arguments.
    pub fn register_type<C, S>(&mut self, name: S) where
        C: Converter + FromArguments + 'static,
        S: Into<String>
    {
        self.register(name, |args: Option<&str>| {
            C::from_arguments(args).map(|converter| Box::new(converter) as Box<dyn Converter>)
        });
    }

    ///Returns true if a converter with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    ///Create a converter instance.
    pub fn create(&self, name: &str, args: Option<&str>) -> Result<Box<dyn Converter>, RuleError> {
        match self.factories.get(name) {
            Some(factory) => factory(args),
            None => Err(RuleError::UnknownConverter(name.to_owned())),
        }
    }
}

impl Default for Converters {
    fn default() -> Converters {
        let mut converters = Converters::empty();
        converters.register_type::<UnicodeConverter, _>("default");
        converters.register_type::<UnicodeConverter, _>("string");
        converters.register_type::<PathConverter, _>("path");
        converters.register_type::<AnyConverter, _>("any");
        converters.register_type::<IntegerConverter, _>("int");
        converters.register_type::<FloatConverter, _>("float");
        converters.register_type::<UuidConverter, _>("uuid");
        converters
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("Converters").field("names", &names).finish()
    }
}
