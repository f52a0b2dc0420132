//!URL rules, both as declared and as compiled by a `Map`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::ptr;

use regex::Regex;

use crate::converter::{Converter, Converters, ValidationError};
use crate::error::RuleError;
use crate::map::MapConfig;
use crate::parser::{parse_rule, Segment};
use crate::utils::encode_query;
use crate::value::Values;
use crate::Method;

///A declared URL rule.
///
///A rule is just a description until it's added to a `Map`, which compiles
///it into a `BoundRule`. Everything that isn't set explicitly is taken from
///the map's configuration when that happens.
///
///```
///use urlmap::{Rule, Method};
///
///let rule = Rule::new("/users/<int:id>/", "user")
///    .methods(vec![Method::GET, Method::POST])
///    .subdomain("www");
///
///assert_eq!(rule.template(), "/users/<int:id>/");
///assert_eq!(rule.endpoint(), "user");
///```
#[derive(Clone, Debug)]
pub struct Rule {
    pub(crate) template: String,
    pub(crate) endpoint: String,
    pub(crate) defaults: Option<Values>,
    pub(crate) subdomain: Option<String>,
    pub(crate) methods: Option<Vec<Method>>,
    pub(crate) strict_slashes: Option<bool>,
    pub(crate) build_only: bool,
    pub(crate) alias: bool,
}

impl Rule {
    ///Create a rule for a template and an endpoint.
    pub fn new<T: Into<String>, E: Into<String>>(template: T, endpoint: E) -> Rule {
        Rule {
            template: template.into(),
            endpoint: endpoint.into(),
            defaults: None,
            subdomain: None,
            methods: None,
            strict_slashes: None,
            build_only: false,
            alias: false,
        }
    }

    ///Set default values. They are added to the matched values and have to
    ///be equal to the supplied values when a URL is built.
    pub fn defaults(mut self, defaults: Values) -> Rule {
        self.defaults = Some(defaults);
        self
    }

    ///Set the subdomain. The map's default subdomain is used otherwise.
    pub fn subdomain<S: Into<String>>(mut self, subdomain: S) -> Rule {
        self.subdomain = Some(subdomain.into());
        self
    }

    ///Only accept these methods. `HEAD` is added automatically if `GET` is
    ///in the list. All methods are accepted if this isn't set.
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Rule {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    ///Override the map's strict slashes setting for this rule.
    pub fn strict_slashes(mut self, strict_slashes: bool) -> Rule {
        self.strict_slashes = Some(strict_slashes);
        self
    }

    ///A build only rule is never matched, but can still be used to build
    ///URLs. This is useful for URLs that are served by something else.
    pub fn build_only(mut self, build_only: bool) -> Rule {
        self.build_only = build_only;
        self
    }

    ///An alias is an alternative URL for its endpoint. A request that
    ///matches it is redirected to the URL of the best non-alias rule for
    ///the same values, if the map redirects to canonical URLs. Aliases are
    ///only used for building when nothing else can build the values.
    pub fn alias(mut self, alias: bool) -> Rule {
        self.alias = alias;
        self
    }

    ///The rule template.
    pub fn template(&self) -> &str {
        &self.template
    }

    ///The endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

//A compiled part of the template, used for building.
#[derive(Clone, Debug, PartialEq)]
enum Part {
    Static(String),
    Variable(String),
}

//The outcome of matching a single rule.
pub(crate) enum RuleMatch {
    Matched(Values),
    MissingSlash,
    NoMatch,
}

///A rule that has been compiled and bound to a `Map`.
///
///It can only be created by a map and is owned by it, so a rule can never be
///bound twice.
pub struct BoundRule {
    rule: String,
    endpoint: String,
    subdomain: String,
    defaults: Option<Values>,
    methods: Option<HashSet<Method>>,
    strict_slashes: bool,
    build_only: bool,
    alias: bool,
    is_leaf: bool,
    arguments: BTreeSet<String>,
    trace: Vec<Part>,
    converters: HashMap<String, Box<dyn Converter>>,
    regex: Regex,
    suffix_group: Option<usize>,
}

impl BoundRule {
    pub(crate) fn bind(rule: Rule, config: &MapConfig, converters: &Converters) -> Result<BoundRule, RuleError> {
        let Rule {
            template,
            endpoint,
            defaults,
            subdomain,
            methods,
            strict_slashes,
            build_only,
            alias,
        } = rule;

        if !template.starts_with('/') {
            return Err(RuleError::MissingLeadingSlash(template));
        }

        let subdomain = subdomain.unwrap_or_else(|| config.default_subdomain.clone());
        if subdomain.contains('|') || subdomain.contains('/') {
            return Err(RuleError::MalformedRule(format!("{}|{}", subdomain, template)));
        }

        let strict_slashes = strict_slashes.unwrap_or(config.strict_slashes);
        let is_leaf = !template.ends_with('/');
        let path = if is_leaf { &template[..] } else { template.trim_end_matches('/') };
        let combined = format!("{}|{}", subdomain, path);

        let defaults = defaults.filter(|defaults| !defaults.is_empty());
        let mut arguments: BTreeSet<String> = defaults.iter().flat_map(|defaults| defaults.keys().cloned()).collect();
        let mut trace = vec![];
        let mut bound_converters = HashMap::new();
        let mut pattern = String::from("^");

        for segment in parse_rule(&combined) {
            match segment? {
                Segment::Static(text) => {
                    pattern.push_str(&regex::escape(text));
                    trace.push(Part::Static(text.to_owned()));
                },
                Segment::Variable { name, converter, args } => {
                    let converter = converters.create(converter, args)?;
                    pattern.push_str(&format!("(?P<{}>{})", name, converter.regex()));
                    bound_converters.insert(name.to_owned(), converter);
                    trace.push(Part::Variable(name.to_owned()));
                    arguments.insert(name.to_owned());
                },
            }
        }

        if !is_leaf {
            trace.push(Part::Static("/".to_owned()));
        }

        let has_suffix = !is_leaf || !strict_slashes;
        if has_suffix {
            pattern.push_str("(/?)");
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| RuleError::InvalidPattern {
            rule: template.clone(),
            message: e.to_string(),
        })?;

        let suffix_group = if has_suffix { Some(regex.captures_len() - 1) } else { None };

        let methods = methods.map(|methods| {
            let mut methods: HashSet<Method> = methods.into_iter().collect();
            if methods.contains(&Method::GET) {
                methods.insert(Method::HEAD);
            }
            methods
        });

        Ok(BoundRule {
            rule: template,
            endpoint: endpoint,
            subdomain: subdomain,
            defaults: defaults,
            methods: methods,
            strict_slashes: strict_slashes,
            build_only: build_only,
            alias: alias,
            is_leaf: is_leaf,
            arguments: arguments,
            trace: trace,
            converters: bound_converters,
            regex: regex,
            suffix_group: suffix_group,
        })
    }

    ///Try to match a `subdomain|/path` key.
    pub(crate) fn match_key(&self, key: &str) -> RuleMatch {
        if self.build_only {
            return RuleMatch::NoMatch;
        }

        let captures = match self.regex.captures(key) {
            Some(captures) => captures,
            None => return RuleMatch::NoMatch,
        };

        let mut values = Values::new();
        for (name, converter) in &self.converters {
            let raw = match captures.name(name) {
                Some(raw) => raw.as_str(),
                None => return RuleMatch::NoMatch,
            };

            match converter.to_value(raw) {
                Ok(value) => { values.insert(name.clone(), value); },
                Err(ValidationError) => return RuleMatch::NoMatch,
            }
        }

        let has_slash = self.suffix_group
            .and_then(|group| captures.get(group))
            .map_or(false, |suffix| !suffix.as_str().is_empty());

        if !self.is_leaf && self.strict_slashes && !has_slash {
            return RuleMatch::MissingSlash;
        }

        if let Some(ref defaults) = self.defaults {
            values.update(defaults);
        }

        RuleMatch::Matched(values)
    }

    ///Build the subdomain and the path, including an eventual query string,
    ///from a set of values.
    ///
    ///Values that aren't used by the rule become query arguments.
    pub fn build(&self, values: &Values) -> Result<(String, String), ValidationError> {
        let mut merged = values.clone();
        if let Some(ref defaults) = self.defaults {
            merged.merge_missing(defaults);
        }

        let mut url = String::new();
        for part in &self.trace {
            match *part {
                Part::Static(ref text) => url.push_str(text),
                Part::Variable(ref name) => {
                    let value = merged.get(name).ok_or(ValidationError)?;
                    let converter = self.converters.get(name).ok_or(ValidationError)?;
                    url.push_str(&converter.to_url(value)?);
                },
            }
        }

        let split = url.find('|').ok_or(ValidationError)?;
        let mut path = url.split_off(split + 1);
        url.pop();

        let query = encode_query(values.iter()
            .filter(|&(key, _)| !self.arguments.contains(key))
            .map(|(key, value)| (&key[..], value.to_string())));

        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }

        Ok((url, path))
    }

    ///Check if the rule can be used to build a URL from the values, and
    ///for the method, if any.
    ///
    ///Every argument without a default has to be supplied, and supplied
    ///values for arguments with defaults have to be equal to the defaults.
    pub fn suitable_for(&self, values: &Values, method: Option<&Method>) -> bool {
        if let (Some(method), Some(methods)) = (method, self.methods.as_ref()) {
            if !methods.contains(method) {
                return false;
            }
        }

        let defaults = self.defaults.as_ref();
        let has_required = self.arguments.iter().all(|argument| {
            values.contains_key(argument) || defaults.map_or(false, |defaults| defaults.contains_key(argument))
        });

        if !has_required {
            return false;
        }

        defaults.map_or(true, |defaults| defaults.iter().all(|(key, default)| {
            values.get(key).map_or(true, |value| value == default)
        }))
    }

    ///Check if this rule has defaults for another rule with the same
    ///endpoint and arguments. The other rule is then an alternative form of
    ///this one.
    pub fn provides_defaults_for(&self, other: &BoundRule) -> bool {
        !self.build_only
            && self.defaults.is_some()
            && !ptr::eq(self, other)
            && self.endpoint == other.endpoint
            && self.arguments == other.arguments
    }

    ///Returns true if the method is accepted by this rule.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.as_ref().map_or(true, |methods| methods.contains(method))
    }

    ///The specificity of the rule. Rules with a higher complexity are tried
    ///first.
    pub fn complexity(&self) -> usize {
        self.arguments.len() + self.defaults.as_ref().map_or(0, |defaults| defaults.len())
    }

    ///The original rule template.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    ///The endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    ///The subdomain template.
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    ///The default values, if any.
    pub fn defaults(&self) -> Option<&Values> {
        self.defaults.as_ref()
    }

    ///The accepted methods, sorted by name, or `None` if all methods are
    ///accepted.
    pub fn methods(&self) -> Option<Vec<Method>> {
        self.methods.as_ref().map(|methods| {
            let mut methods: Vec<_> = methods.iter().cloned().collect();
            methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            methods
        })
    }

    ///The names of the variables and the defaults.
    pub fn arguments(&self) -> &BTreeSet<String> {
        &self.arguments
    }

    ///Returns true if the template doesn't end with a slash.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    ///Returns true if a missing trailing slash causes a redirect.
    pub fn strict_slashes(&self) -> bool {
        self.strict_slashes
    }

    ///Returns true if the rule is only used for building URLs.
    pub fn is_build_only(&self) -> bool {
        self.build_only
    }

    ///Returns true if the rule is an alias for other rules.
    pub fn is_alias(&self) -> bool {
        self.alias
    }
}

impl fmt::Debug for BoundRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BoundRule")
            .field("rule", &self.rule)
            .field("endpoint", &self.endpoint)
            .field("subdomain", &self.subdomain)
            .field("methods", &self.methods())
            .field("defaults", &self.defaults)
            .field("alias", &self.alias)
            .field("complexity", &self.complexity())
            .finish()
    }
}
