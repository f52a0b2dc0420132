//!The rule collection and its configuration.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::MapAdapter;
use crate::converter::Converters;
use crate::error::RuleError;
use crate::factory::RuleFactory;
use crate::rule::BoundRule;
use crate::utils::strip_port;

///Map wide settings.
///
///```
///use urlmap::{Map, MapConfig, Rule};
///use urlmap::converter::Converters;
///
///let config = MapConfig {
///    strict_slashes: false,
///    ..MapConfig::default()
///};
///
///let mut map = Map::new(config, Converters::default()).unwrap();
///map.add(Rule::new("/about/", "about")).unwrap();
///```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapConfig {
    ///The subdomain for rules without one. Default is `""`.
    pub default_subdomain: String,

    ///The URL charset. Only UTF-8 is supported. Default is `"utf-8"`.
    pub charset: String,

    ///Redirect requests for branch URLs, like `/foo/`, to the URL with a
    ///slash if it's missing. Rules may override this. Default is `true`.
    pub strict_slashes: bool,

    ///Redirect to the canonical URL when a matched rule has an alternative
    ///rule with defaults for the same values. Default is `true`.
    pub redirect_defaults: bool,
}

impl Default for MapConfig {
    fn default() -> MapConfig {
        MapConfig {
            default_subdomain: String::new(),
            charset: "utf-8".to_owned(),
            strict_slashes: true,
            redirect_defaults: true,
        }
    }
}

///A collection of bound rules.
///
///Rules are kept in order of descending complexity as they are added, so
///more specific rules are tried before less specific ones. Rules with the
///same complexity keep their insertion order. Alias rules are used last
///when URLs are built for their endpoint.
///
///A map is immutable once it's shared, and can be used from many threads
///at once. Requests are matched through a `MapAdapter`, which is created
///with `bind` or `bind_to_host`.
#[derive(Debug)]
pub struct Map {
    config: MapConfig,
    converters: Converters,
    rules: Vec<Arc<BoundRule>>,
    rules_by_endpoint: HashMap<String, Vec<Arc<BoundRule>>>,
}

impl Map {
    ///Create an empty map.
    pub fn new(config: MapConfig, converters: Converters) -> Result<Map, RuleError> {
        let charset = config.charset.to_ascii_lowercase();
        if charset != "utf-8" && charset != "utf8" {
            return Err(RuleError::UnsupportedCharset(config.charset));
        }

        Ok(Map {
            config: config,
            converters: converters,
            rules: vec![],
            rules_by_endpoint: HashMap::new(),
        })
    }

    ///Create a map with the default configuration and converters, and add
    ///rules to it.
    pub fn with_rules<F: RuleFactory>(rules: F) -> Result<Map, RuleError> {
        let mut map = Map::new(MapConfig::default(), Converters::default())?;
        map.add(rules)?;
        Ok(map)
    }

    ///Bind and add every rule from a factory.
    ///
    ///Nothing is added if any of the rules fails to bind.
    pub fn add<F: RuleFactory>(&mut self, factory: F) -> Result<(), RuleError> {
        let mut bound = vec![];
        for rule in factory.get_rules() {
            let rule = BoundRule::bind(rule, &self.config, &self.converters)?;
            debug!("bound rule {} ({}) to endpoint {}", rule.rule(), rule.subdomain(), rule.endpoint());
            bound.push(Arc::new(rule));
        }

        for rule in bound {
            let endpoint_rules = self.rules_by_endpoint.entry(rule.endpoint().to_owned()).or_insert_with(Vec::new);
            let key = build_order(&rule);
            let index = endpoint_rules.partition_point(|other| build_order(other) <= key);
            endpoint_rules.insert(index, rule.clone());

            let complexity = rule.complexity();
            let index = self.rules.partition_point(|other| other.complexity() >= complexity);
            self.rules.insert(index, rule);
        }

        Ok(())
    }

    ///Iterate over all rules in match order, or over the rules for one
    ///endpoint in build order.
    pub fn iter_rules<'m>(&'m self, endpoint: Option<&str>) -> Box<dyn Iterator<Item = &'m BoundRule> + 'm> {
        match endpoint {
            Some(endpoint) => match self.rules_by_endpoint.get(endpoint) {
                Some(rules) => Box::new(rules.iter().map(|rule| &**rule)),
                None => Box::new(::std::iter::empty::<&BoundRule>()),
            },
            None => Box::new(self.rules.iter().map(|rule| &**rule)),
        }
    }

    ///Check if an endpoint expects any of the given arguments.
    pub fn is_endpoint_expecting<'a, I: IntoIterator<Item = &'a str>>(&self, endpoint: &str, arguments: I) -> bool {
        let rules = match self.rules_by_endpoint.get(endpoint) {
            Some(rules) => rules,
            None => return false,
        };

        arguments.into_iter().any(|argument| rules.iter().any(|rule| rule.arguments().contains(argument)))
    }

    ///The map configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    ///The converter registry.
    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    pub(crate) fn rules(&self) -> &[Arc<BoundRule>] {
        &self.rules
    }

    pub(crate) fn rules_for(&self, endpoint: &str) -> Option<&[Arc<BoundRule>]> {
        self.rules_by_endpoint.get(endpoint).map(|rules| &rules[..])
    }

    ///Create an adapter for a server name, like `example.com`. The
    ///subdomain is set to the default subdomain.
    pub fn bind<S: Into<String>>(&self, server_name: S) -> MapAdapter {
        let server_name = server_name.into().to_lowercase();
        debug!("binding map to {}", server_name);
        MapAdapter::new(self, server_name).subdomain(self.config.default_subdomain.clone())
    }

    ///Create an adapter for a server name and derive the subdomain from the
    ///requested host, typically the `Host` header. Ports are ignored.
    ///
    ///The subdomain becomes `<invalid>` if the host doesn't belong to the
    ///server name, so nothing with a subdomain will match.
    ///
    ///```
    ///use urlmap::{Map, Rule, Method};
    ///
    ///let map = Map::with_rules(Rule::new("/", "index").subdomain("api")).unwrap();
    ///let adapter = map.bind_to_host("example.com", "API.example.com:8080");
    ///assert_eq!(adapter.get_subdomain(), "api");
    ///assert!(adapter.match_path("/", &Method::GET).is_ok());
    ///```
    pub fn bind_to_host<S: Into<String>>(&self, server_name: S, host: &str) -> MapAdapter {
        let server_name = server_name.into().to_lowercase();
        let host = host.to_lowercase();
        let host = strip_port(&host);
        let bare_name = strip_port(&server_name);

        let subdomain = if host == bare_name {
            String::new()
        } else {
            match host.strip_suffix(bare_name).and_then(|prefix| prefix.strip_suffix('.')) {
                Some(subdomain) if !subdomain.is_empty() => subdomain.to_owned(),
                _ => "<invalid>".to_owned(),
            }
        };

        debug!("binding map to {} with subdomain '{}'", server_name, subdomain);
        MapAdapter::new(self, server_name).subdomain(subdomain)
    }
}

//Aliases are built last, and otherwise by descending complexity.
fn build_order(rule: &BoundRule) -> (bool, Reverse<usize>) {
    (rule.is_alias(), Reverse(rule.complexity()))
}
