//!Typed route values.

use std::borrow::Borrow;
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Deref, DerefMut};

///A single converted route value.
///
///Converters produce these when a URL is matched and consume them when a
///URL is built.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    ///A text value.
    Str(String),
    ///An integer value.
    Int(i64),
    ///A floating point value.
    Float(f64),
}

impl Value {
    ///Get the value as a string slice, if it's a text value.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }

    ///Get the value as an integer, if it's an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    ///Get the value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Int(i) => Some(i as f64),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Str(ref s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

macro_rules! int_value {
    ($($ty: ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Value {
                    Value::Int(i as i64)
                }
            }
        )*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Value {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

///An extended `BTreeMap` of route values.
///
///Some of the methods from `BTreeMap` have been wrapped to provide a more
///ergonomic API, where anything that can be converted into a `String` or a
///`Value` can be inserted directly. The keys are kept in order, so anything
///generated from the values, like query strings, comes out the same way
///every time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values(BTreeMap<String, Value>);

impl Values {
    ///Create an empty `Values`.
    pub fn new() -> Values {
        Values(BTreeMap::new())
    }

    ///Get a value.
    pub fn get<K: ?Sized>(&self, key: &K) -> Option<&Value> where
        String: Borrow<K>,
        K: Ord
    {
        self.0.get(key)
    }

    ///Get a text value. Returns `None` if it's missing or not text.
    pub fn get_str<K: ?Sized>(&self, key: &K) -> Option<&str> where
        String: Borrow<K>,
        K: Ord
    {
        self.0.get(key).and_then(Value::as_str)
    }

    ///Get an integer value. Returns `None` if it's missing or not an integer.
    pub fn get_int<K: ?Sized>(&self, key: &K) -> Option<i64> where
        String: Borrow<K>,
        K: Ord
    {
        self.0.get(key).and_then(Value::as_int)
    }

    ///Returns true if a value with the given key exists.
    pub fn contains_key<K: ?Sized>(&self, key: &K) -> bool where
        String: Borrow<K>,
        K: Ord
    {
        self.0.contains_key(key)
    }

    ///Insert a value.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value> where
        K: Into<String>, V: Into<Value>
    {
        self.0.insert(key.into(), value.into())
    }

    ///Remove a value and return it.
    pub fn remove<K: ?Sized>(&mut self, key: &K) -> Option<Value> where
        String: Borrow<K>,
        K: Ord
    {
        self.0.remove(key)
    }

    ///Gets the given key's corresponding entry in the map for in-place
    ///manipulation.
    pub fn entry<K: Into<String>>(&mut self, key: K) -> Entry<String, Value> {
        self.0.entry(key.into())
    }

    ///Insert every value from `other` that isn't already present.
    pub fn merge_missing(&mut self, other: &Values) {
        for (key, value) in &other.0 {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    ///Insert every value from `other`, overwriting existing values.
    pub fn update(&mut self, other: &Values) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

impl Deref for Values {
    type Target = BTreeMap<String, Value>;

    fn deref(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

impl DerefMut for Values {
    fn deref_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.0
    }
}

impl AsRef<BTreeMap<String, Value>> for Values {
    fn as_ref(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

impl From<Values> for BTreeMap<String, Value> {
    fn from(values: Values) -> BTreeMap<String, Value> {
        values.0
    }
}

impl From<BTreeMap<String, Value>> for Values {
    fn from(map: BTreeMap<String, Value>) -> Values {
        Values(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iterable: T) -> Values {
        Values(iterable.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Values {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<'a> IntoIterator for &'a Values {
    type IntoIter = <&'a BTreeMap<String, Value> as IntoIterator>::IntoIter;
    type Item = (&'a String, &'a Value);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Values {
    type IntoIter = <BTreeMap<String, Value> as IntoIterator>::IntoIter;
    type Item = (String, Value);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::{Value, Values};

    #[test]
    fn typed_access() {
        let mut values = Values::new();
        values.insert("id", 42);
        values.insert("name", "page");
        values.insert("ratio", 0.5);

        assert_eq!(values.get_int("id"), Some(42));
        assert_eq!(values.get_str("id"), None);
        assert_eq!(values.get_str("name"), Some("page"));
        assert_eq!(values.get("ratio").and_then(Value::as_float), Some(0.5));
        assert_eq!(values.get("id").and_then(Value::as_float), Some(42.0));
        assert!(!values.contains_key("missing"));
    }

    #[test]
    fn merging() {
        let mut values: Values = vec![("page", 2)].into_iter().collect();
        let defaults: Values = vec![("page", 1), ("lang", 7)].into_iter().collect();

        values.merge_missing(&defaults);
        assert_eq!(values.get_int("page"), Some(2));
        assert_eq!(values.get_int("lang"), Some(7));

        values.update(&defaults);
        assert_eq!(values.get_int("page"), Some(1));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from("a b").to_string(), "a b");
        assert_eq!(Value::from(12u8).to_string(), "12");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
    }
}
