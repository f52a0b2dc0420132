//!Rule factories for grouping rules.
//!
//!Anything that produces rules is a `RuleFactory`, including `Rule` itself.
//!The factories in this module wrap other factories and change the rules
//!they produce:
//!
//!```
//!use urlmap::{Map, Rule, Subdomain, Submount, EndpointPrefix, Method};
//!
//!let map = Map::with_rules(Subdomain::new("<user>", vec![
//!    Submount::new("/blog", vec![
//!        EndpointPrefix::new("blog_", vec![
//!            Rule::new("/", "index"),
//!            Rule::new("/<int:year>/", "archive"),
//!        ])
//!    ])
//!])).unwrap();
//!
//!let adapter = map.bind("example.com").subdomain("jane");
//!let (endpoint, values) = adapter.match_path("/blog/2016/", &Method::GET).unwrap();
//!assert_eq!(endpoint, "blog_archive");
//!assert_eq!(values.get_str("user"), Some("jane"));
//!```

use crate::rule::Rule;

///Something that produces rules for a `Map`.
pub trait RuleFactory {
    ///Produce the rules. Each call returns fresh copies.
    fn get_rules(&self) -> Vec<Rule>;
}

impl RuleFactory for Rule {
    fn get_rules(&self) -> Vec<Rule> {
        vec![self.clone()]
    }
}

impl<F: RuleFactory + ?Sized> RuleFactory for Box<F> {
    fn get_rules(&self) -> Vec<Rule> {
        (**self).get_rules()
    }
}

impl<'a, F: RuleFactory + ?Sized> RuleFactory for &'a F {
    fn get_rules(&self) -> Vec<Rule> {
        (**self).get_rules()
    }
}

impl<F: RuleFactory> RuleFactory for [F] {
    fn get_rules(&self) -> Vec<Rule> {
        self.iter().flat_map(|factory| factory.get_rules()).collect()
    }
}

impl<F: RuleFactory> RuleFactory for Vec<F> {
    fn get_rules(&self) -> Vec<Rule> {
        self[..].get_rules()
    }
}

fn collect<I, F>(rules: I) -> Vec<Box<dyn RuleFactory>> where
    I: IntoIterator<Item = F>,
    F: RuleFactory + 'static
{
    rules.into_iter().map(|factory| Box::new(factory) as Box<dyn RuleFactory>).collect()
}

///Set the subdomain of a group of rules.
///
///The subdomain may contain variables, just like a path.
pub struct Subdomain {
    subdomain: String,
    rules: Vec<Box<dyn RuleFactory>>,
}

impl Subdomain {
    ///Create a subdomain group.
    pub fn new<S, I, F>(subdomain: S, rules: I) -> Subdomain where
        S: Into<String>,
        I: IntoIterator<Item = F>,
        F: RuleFactory + 'static
    {
        Subdomain {
            subdomain: subdomain.into(),
            rules: collect(rules),
        }
    }

    ///Add one more factory to the group.
    pub fn with<F: RuleFactory + 'static>(mut self, factory: F) -> Subdomain {
        self.rules.push(Box::new(factory));
        self
    }
}

impl RuleFactory for Subdomain {
    fn get_rules(&self) -> Vec<Rule> {
        let mut rules = self.rules.get_rules();
        for rule in &mut rules {
            rule.subdomain = Some(self.subdomain.clone());
        }
        rules
    }
}

///Prefix the paths of a group of rules.
///
///A trailing slash in the prefix is ignored, so `/blog` and `/blog/` are the
///same prefix.
pub struct Submount {
    path: String,
    rules: Vec<Box<dyn RuleFactory>>,
}

impl Submount {
    ///Create a path prefix group.
    pub fn new<P, I, F>(path: P, rules: I) -> Submount where
        P: Into<String>,
        I: IntoIterator<Item = F>,
        F: RuleFactory + 'static
    {
        let mut path = path.into();
        while path.ends_with('/') {
            path.pop();
        }

        Submount {
            path: path,
            rules: collect(rules),
        }
    }

    ///Add one more factory to the group.
    pub fn with<F: RuleFactory + 'static>(mut self, factory: F) -> Submount {
        self.rules.push(Box::new(factory));
        self
    }
}

impl RuleFactory for Submount {
    fn get_rules(&self) -> Vec<Rule> {
        let mut rules = self.rules.get_rules();
        for rule in &mut rules {
            rule.template = format!("{}{}", self.path, rule.template);
        }
        rules
    }
}

///Prefix the endpoints of a group of rules.
pub struct EndpointPrefix {
    prefix: String,
    rules: Vec<Box<dyn RuleFactory>>,
}

impl EndpointPrefix {
    ///Create an endpoint prefix group.
    pub fn new<P, I, F>(prefix: P, rules: I) -> EndpointPrefix where
        P: Into<String>,
        I: IntoIterator<Item = F>,
        F: RuleFactory + 'static
    {
        EndpointPrefix {
            prefix: prefix.into(),
            rules: collect(rules),
        }
    }

    ///Add one more factory to the group.
    pub fn with<F: RuleFactory + 'static>(mut self, factory: F) -> EndpointPrefix {
        self.rules.push(Box::new(factory));
        self
    }
}

impl RuleFactory for EndpointPrefix {
    fn get_rules(&self) -> Vec<Rule> {
        let mut rules = self.rules.get_rules();
        for rule in &mut rules {
            rule.endpoint = format!("{}{}", self.prefix, rule.endpoint);
        }
        rules
    }
}

#[cfg(test)]
mod test {
    use super::{RuleFactory, Subdomain, Submount, EndpointPrefix};
    use crate::rule::Rule;

    fn describe<F: RuleFactory>(factory: F) -> Vec<(String, String, Option<String>)> {
        factory.get_rules().into_iter().map(|rule| (rule.template, rule.endpoint, rule.subdomain)).collect()
    }

    #[test]
    fn single_rule() {
        assert_eq!(describe(Rule::new("/", "index")), vec![("/".into(), "index".into(), None)]);
    }

    #[test]
    fn submount() {
        let factory = Submount::new("/blog/", vec![Rule::new("/", "index"), Rule::new("/<int:id>", "post")]);
        assert_eq!(describe(factory), vec![
            ("/blog/".into(), "index".into(), None),
            ("/blog/<int:id>".into(), "post".into(), None),
        ]);
    }

    #[test]
    fn nesting() {
        let factory = Subdomain::new("<user>", vec![
            Submount::new("/blog", vec![
                EndpointPrefix::new("blog_", vec![Rule::new("/", "index")])
            ])
        ]).with(Rule::new("/about", "about"));

        assert_eq!(describe(factory), vec![
            ("/blog/".into(), "blog_index".into(), Some("<user>".into())),
            ("/about".into(), "about".into(), Some("<user>".into())),
        ]);
    }

    #[test]
    fn outer_subdomain_wins() {
        let factory = Subdomain::new("www", vec![Rule::new("/", "index").subdomain("api")]);
        assert_eq!(describe(factory)[0].2, Some("www".into()));
    }

    #[test]
    fn fresh_copies() {
        let factory = EndpointPrefix::new("x_", vec![Rule::new("/", "index")]);
        assert_eq!(describe(&factory), describe(&factory));
    }

    #[test]
    fn mixed_factories() {
        let factories: Vec<Box<dyn RuleFactory>> = vec![
            Box::new(Rule::new("/", "index")),
            Box::new(Submount::new("/a", vec![Rule::new("/b", "b")])),
        ];

        assert_eq!(describe(factories).len(), 2);
    }
}
