//!A declarative URL map that matches request paths to endpoints, and builds
//!URLs back from endpoints and values.
//!
//!Rules are written as templates, where variables are written as
//!`<converter(arguments):name>`, or just `<name>` for text. Each rule
//!belongs to an endpoint, which is just a name that the application can
//!use to find the code that should handle the request.
//!
//!```
//!use urlmap::{Map, Rule, Submount, Method, RoutingError};
//!
//!let map = Map::with_rules(vec![
//!    Box::new(Rule::new("/", "index")) as Box<dyn urlmap::RuleFactory>,
//!    Box::new(Rule::new("/downloads/<int:id>", "download")),
//!    Box::new(Submount::new("/docs", vec![
//!        Rule::new("/", "docs_index"),
//!        Rule::new("/<path:page>", "docs_page"),
//!    ])),
//!]).unwrap();
//!
//!//An adapter is created for each request.
//!let adapter = map.bind("example.com");
//!
//!let (endpoint, values) = adapter.match_path("/downloads/42", &Method::GET).unwrap();
//!assert_eq!(endpoint, "download");
//!assert_eq!(values.get_int("id"), Some(42));
//!
//!//Branch URLs are redirected to their canonical form.
//!assert_eq!(
//!    adapter.match_path("/docs", &Method::GET),
//!    Err(RoutingError::RequestRedirect { new_url: "http://example.com/docs/".into() })
//!);
//!
//!//URLs are built from the same rules.
//!let url = adapter.build("docs_page", &urlmap::values!{ "page" => "intro/setup.html" }, false).unwrap();
//!assert_eq!(url, "/docs/intro/setup.html");
//!```
//!
//!More specific rules, with more variables and defaults, are always tried
//!before less specific rules. See [`Map`][map] for the details.
//!
//![map]: map/struct.Map.html

#![doc(html_root_url = "https://docs.rs/urlmap/0.1.0/")]

#![cfg_attr(feature = "strict", deny(missing_docs))]
#![cfg_attr(feature = "strict", deny(warnings))]

#[macro_use]
extern crate log;

pub use hyper::Method;
pub use hyper::StatusCode;

pub use self::adapter::MapAdapter;
pub use self::converter::{Converter, Converters};
pub use self::error::{RuleError, RoutingError};
pub use self::factory::{RuleFactory, Subdomain, Submount, EndpointPrefix};
pub use self::map::{Map, MapConfig};
pub use self::rule::{Rule, BoundRule};
pub use self::value::{Value, Values};

#[macro_use]
#[doc(hidden)]
pub mod macros;

mod utils;

pub mod adapter;
pub mod converter;
pub mod error;
pub mod factory;
pub mod map;
pub mod parser;
pub mod rule;
pub mod value;
