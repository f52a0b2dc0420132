//!Some helpful macros.

///The `rules!` macro generates a list of rule factories from a tree of
///paths and endpoints.
///
///Nested blocks become `Submount`s, so the path of each nested rule is
///appended to the path of its block. This can be useful to lower the risk of
///typing errors, among other things.
///
///```
///#[macro_use]
///extern crate urlmap;
///use urlmap::{Map, Method};
///
///# fn main() {
///let map = Map::with_rules(rules! {
///    "/" => "index",
///    "/about" => "about",
///    "/user/<name>" => "user",
///    "/api" => {
///        "/users" => "api_users",
///        "/users/<int:id>" => "api_user"
///    }
///}).unwrap();
///
///let adapter = map.bind("example.com");
///let (endpoint, values) = adapter.match_path("/api/users/7", &Method::GET).unwrap();
///assert_eq!(endpoint, "api_user");
///assert_eq!(values.get_int("id"), Some(7));
///# }
///```
#[macro_export]
macro_rules! rules {
    ($($rules:tt)+) => {
        {
            let mut rules: Vec<Box<dyn $crate::RuleFactory>> = Vec::new();
            $crate::__rules_internal!(rules, $($rules)+);
            rules
        }
    }
}

//Internal stuff. Only meant to be used through `rules!`.
#[doc(hidden)]
#[macro_export]
macro_rules! __rules_internal {
    ($rules:ident, $prefix:expr => {$($nested:tt)+}, $($next:tt)*) => {
        {
            $rules.push(Box::new($crate::Submount::new($prefix, $crate::rules!($($nested)+))));
            $crate::__rules_internal!($rules, $($next)*);
        }
    };
    ($rules:ident, $prefix:expr => {$($nested:tt)+}) => {
        {
            $rules.push(Box::new($crate::Submount::new($prefix, $crate::rules!($($nested)+))));
        }
    };
    ($rules:ident, $path:expr => $endpoint:expr, $($next:tt)*) => {
        {
            $rules.push(Box::new($crate::Rule::new($path, $endpoint)));
            $crate::__rules_internal!($rules, $($next)*);
        }
    };
    ($rules:ident, $path:expr => $endpoint:expr) => {
        {
            $rules.push(Box::new($crate::Rule::new($path, $endpoint)));
        }
    };
    ($rules:ident,) => {};
}

///Create a `Values` map from `key => value` pairs.
///
///Anything that converts into a `Value` can be used as value.
///
///```
///#[macro_use]
///extern crate urlmap;
///
///# fn main() {
///let values = values! {
///    "id" => 42,
///    "name" => "front page"
///};
///
///assert_eq!(values.get_int("id"), Some(42));
///assert_eq!(values.get_str("name"), Some("front page"));
///# }
///```
#[macro_export]
macro_rules! values {
    () => ($crate::Values::new());
    ($($key:expr => $value:expr),+ $(,)*) => {
        {
            let mut values = $crate::Values::new();
            $(values.insert($key, $value);)+
            values
        }
    };
}
