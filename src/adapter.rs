//!Request scoped matching and URL building.

use crate::converter::ValidationError;
use crate::error::RoutingError;
use crate::map::Map;
use crate::rule::{BoundRule, RuleMatch};
use crate::utils::{normalize_script_name, quote_path};
use crate::value::Values;
use crate::Method;

///A `Map` bound to a server name, a subdomain and a script name.
///
///An adapter is cheap to create and is meant to be used for a single
///request. It's created with `Map::bind` or `Map::bind_to_host`, and
///configured with its chainable setters:
///
///```
///use urlmap::{Map, Rule, Method, RoutingError};
///
///let map = Map::with_rules(vec![
///    Rule::new("/", "index"),
///    Rule::new("/docs/", "docs"),
///]).unwrap();
///
///let adapter = map.bind("example.com").script_name("/app").url_scheme("https");
///
///assert_eq!(adapter.build("docs", &Default::default(), false).unwrap(), "/app/docs/");
///assert_eq!(adapter.build("index", &Default::default(), true).unwrap(), "https://example.com/app/");
///
///match adapter.match_path("/docs", &Method::GET) {
///    Err(RoutingError::RequestRedirect { new_url }) => assert_eq!(new_url, "https://example.com/app/docs/"),
///    other => panic!("unexpected result: {:?}", other),
///}
///```
#[derive(Clone, Debug)]
pub struct MapAdapter<'m> {
    map: &'m Map,
    server_name: String,
    script_name: String,
    subdomain: String,
    url_scheme: String,
    query_args: Option<String>,
}

impl<'m> MapAdapter<'m> {
    pub(crate) fn new(map: &'m Map, server_name: String) -> MapAdapter<'m> {
        MapAdapter {
            map: map,
            server_name: server_name,
            script_name: "/".to_owned(),
            subdomain: String::new(),
            url_scheme: "http".to_owned(),
            query_args: None,
        }
    }

    ///Set the path prefix where the application is mounted. Built URLs
    ///start with it.
    pub fn script_name(mut self, script_name: &str) -> MapAdapter<'m> {
        self.script_name = normalize_script_name(script_name);
        self
    }

    ///Set the subdomain of the request.
    pub fn subdomain<S: Into<String>>(mut self, subdomain: S) -> MapAdapter<'m> {
        self.subdomain = subdomain.into();
        self
    }

    ///Set the URL scheme for absolute URLs. Default is `http`.
    pub fn url_scheme<S: Into<String>>(mut self, url_scheme: S) -> MapAdapter<'m> {
        self.url_scheme = url_scheme.into();
        self
    }

    ///Set the query string of the request, without `?`. It's kept when the
    ///request is redirected.
    pub fn query_args<S: Into<String>>(mut self, query_args: S) -> MapAdapter<'m> {
        let query_args = query_args.into();
        self.query_args = if query_args.is_empty() { None } else { Some(query_args) };
        self
    }

    ///The server name.
    pub fn get_server_name(&self) -> &str {
        &self.server_name
    }

    ///The normalized script name. It always starts and ends with `/`.
    pub fn get_script_name(&self) -> &str {
        &self.script_name
    }

    ///The subdomain of the request.
    pub fn get_subdomain(&self) -> &str {
        &self.subdomain
    }

    ///The URL scheme.
    pub fn get_url_scheme(&self) -> &str {
        &self.url_scheme
    }

    ///Find the endpoint for a path and a method.
    ///
    ///The rules are tried in order of descending complexity and the first
    ///rule that matches, and accepts the method, wins. The result is its
    ///endpoint and the converted values, including any defaults. The
    ///request should be redirected instead if a branch URL is missing its
    ///trailing slash, if the matched rule is an alias, or if there is a
    ///canonical URL with defaults for the same values.
    pub fn match_path(&self, path_info: &str, method: &Method) -> Result<(&'m str, Values), RoutingError> {
        let map = self.map;
        let path = path_info.trim_start_matches('/');
        let key = format!("{}|/{}", self.subdomain, path);
        let mut valid_methods: Vec<Method> = vec![];

        for rule in map.rules() {
            trace!("trying rule {} for {}", rule.rule(), key);

            let values = match rule.match_key(&key) {
                RuleMatch::NoMatch => continue,
                _ if !rule.allows(method) => {
                    for method in rule.methods().unwrap_or_default() {
                        if !valid_methods.contains(&method) {
                            valid_methods.push(method);
                        }
                    }
                    continue;
                },
                RuleMatch::MissingSlash => {
                    let new_url = self.with_query_args(self.absolute_url(&self.subdomain, &format!("{}/", quote_path(path))));
                    debug!("redirecting {} to {} with a trailing slash", path_info, new_url);
                    return Err(RoutingError::RequestRedirect { new_url: new_url });
                },
                RuleMatch::Matched(values) => values,
            };

            if map.config().redirect_defaults {
                if rule.is_alias() {
                    if let Some(new_url) = self.alias_redirect(rule, &values, method) {
                        debug!("redirecting alias {} to {}", path_info, new_url);
                        return Err(RoutingError::RequestRedirect { new_url: new_url });
                    }
                }

                if let Some(new_url) = self.defaults_redirect(rule, &values, method) {
                    debug!("redirecting {} to its canonical url {}", path_info, new_url);
                    return Err(RoutingError::RequestRedirect { new_url: new_url });
                }
            }

            return Ok((rule.endpoint(), values));
        }

        if valid_methods.is_empty() {
            Err(RoutingError::NotFound)
        } else {
            valid_methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            Err(RoutingError::MethodNotAllowed { valid_methods: valid_methods })
        }
    }

    ///Returns true if the path would match, or be redirected.
    pub fn test(&self, path_info: &str, method: &Method) -> bool {
        match self.match_path(path_info, method) {
            Ok(_) | Err(RoutingError::RequestRedirect { .. }) => true,
            Err(_) => false,
        }
    }

    ///The methods that are explicitly allowed for a path, sorted by name.
    ///Rules without a method restriction don't contribute to the list.
    pub fn allowed_methods(&self, path_info: &str) -> Vec<Method> {
        let key = format!("{}|/{}", self.subdomain, path_info.trim_start_matches('/'));
        let mut allowed: Vec<Method> = vec![];

        for rule in self.map.rules() {
            if let RuleMatch::Matched(_) = rule.match_key(&key) {
                for method in rule.methods().unwrap_or_default() {
                    if !allowed.contains(&method) {
                        allowed.push(method);
                    }
                }
            }
        }

        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }

    ///Build a URL for an endpoint.
    ///
    ///The rules for the endpoint are tried in order of descending
    ///complexity, and the first one that is suitable for the values and
    ///accepts them wins. Values that aren't used by the rule are added as
    ///query arguments.
    ///
    ///The URL is relative to the server, and starts with the script name,
    ///unless the rule belongs to another subdomain or `force_external` is
    ///set.
    pub fn build(&self, endpoint: &str, values: &Values, force_external: bool) -> Result<String, RoutingError> {
        self.build_with(endpoint, values, None, force_external)
    }

    ///Like `build`, but only rules that accept `method` are considered.
    pub fn build_for_method(&self, endpoint: &str, values: &Values, method: &Method, force_external: bool) -> Result<String, RoutingError> {
        self.build_with(endpoint, values, Some(method), force_external)
    }

    fn build_with(&self, endpoint: &str, values: &Values, method: Option<&Method>, force_external: bool) -> Result<String, RoutingError> {
        let (subdomain, path) = self.build_parts(endpoint, values, method, false).ok_or(RoutingError::NotFound)?;

        if force_external || subdomain != self.subdomain {
            Ok(self.absolute_url(&subdomain, &path))
        } else {
            Ok(format!("{}{}", self.script_name, path.trim_start_matches('/')))
        }
    }

    //Aliases come last for each endpoint, so they are only used when
    //nothing else can build the values.
    fn build_parts(&self, endpoint: &str, values: &Values, method: Option<&Method>, skip_aliases: bool) -> Option<(String, String)> {
        let rules = self.map.rules_for(endpoint)?;

        for rule in rules {
            if (skip_aliases && rule.is_alias()) || !rule.suitable_for(values, method) {
                continue;
            }

            match rule.build(values) {
                Ok((subdomain, path)) => {
                    trace!("built {} from rule {}", path, rule.rule());
                    return Some((subdomain, path));
                },
                Err(ValidationError) => trace!("rule {} rejected the values", rule.rule()),
            }
        }

        None
    }

    fn alias_redirect(&self, matched: &BoundRule, values: &Values, method: &Method) -> Option<String> {
        self.build_parts(matched.endpoint(), values, Some(method), true)
            .map(|(subdomain, path)| self.with_query_args(self.absolute_url(&subdomain, &path)))
    }

    fn defaults_redirect(&self, matched: &BoundRule, values: &Values, method: &Method) -> Option<String> {
        let rules = self.map.rules_for(matched.endpoint())?;

        for rule in rules {
            if rule.is_alias() || !rule.provides_defaults_for(matched) || !rule.suitable_for(values, Some(method)) {
                continue;
            }

            let mut values = values.clone();
            if let Some(defaults) = rule.defaults() {
                values.update(defaults);
            }

            if let Ok((subdomain, path)) = rule.build(&values) {
                return Some(self.with_query_args(self.absolute_url(&subdomain, &path)));
            }
        }

        None
    }

    fn absolute_url(&self, subdomain: &str, path: &str) -> String {
        let script_name = self.script_name.trim_end_matches('/');
        let path = path.trim_start_matches('/');

        if subdomain.is_empty() {
            format!("{}://{}{}/{}", self.url_scheme, self.server_name, script_name, path)
        } else {
            format!("{}://{}.{}{}/{}", self.url_scheme, subdomain, self.server_name, script_name, path)
        }
    }

    fn with_query_args(&self, mut url: String) -> String {
        if let Some(ref query_args) = self.query_args {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(query_args);
        }
        url
    }
}

#[cfg(test)]
mod test {
    use crate::error::RoutingError;
    use crate::map::{Map, MapConfig};
    use crate::converter::Converters;
    use crate::factory::Subdomain;
    use crate::rule::Rule;
    use crate::value::Values;
    use crate::Method;

    macro_rules! assert_match {
        ($adapter: ident, $path: expr => $endpoint: expr, {$($name: expr => $value: expr),*}) => (
            assert_eq!($adapter.match_path($path, &Method::GET), Ok(($endpoint, values!{$($name => $value),*})))
        );
    }

    macro_rules! assert_redirect {
        ($adapter: ident, $path: expr => $url: expr) => (
            assert_redirect!($adapter, $path => $url, Method::GET)
        );
        ($adapter: ident, $path: expr => $url: expr, $method: expr) => (
            assert_eq!(
                $adapter.match_path($path, &$method),
                Err(RoutingError::RequestRedirect { new_url: $url.to_owned() })
            )
        );
    }

    #[test]
    fn matching() {
        let map = Map::with_rules(vec![
            Rule::new("/", "index"),
            Rule::new("/about", "about"),
            Rule::new("/user/<int:id>", "user"),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_match!(adapter, "/" => "index", {});
        assert_match!(adapter, "/about" => "about", {});
        assert_match!(adapter, "about" => "about", {});
        assert_match!(adapter, "/user/3" => "user", {"id" => 3});
        assert_eq!(adapter.match_path("/user/x", &Method::GET), Err(RoutingError::NotFound));
        assert_eq!(adapter.match_path("/about/", &Method::GET), Err(RoutingError::NotFound));
    }

    #[test]
    fn slash_redirects() {
        let map = Map::with_rules(vec![
            Rule::new("/docs/", "docs"),
            Rule::new("/files/<name>/", "file"),
        ]).unwrap();
        let adapter = map.bind("example.com").script_name("app").query_args("a=1");

        assert_redirect!(adapter, "/docs" => "http://example.com/app/docs/?a=1");
        assert_redirect!(adapter, "/files/a b" => "http://example.com/app/files/a%20b/?a=1");
        assert_match!(adapter, "/docs/" => "docs", {});
        assert!(adapter.test("/docs", &Method::GET));
        assert!(!adapter.test("/nothing", &Method::GET));
    }

    #[test]
    fn relaxed_slashes() {
        let config = MapConfig {
            strict_slashes: false,
            ..MapConfig::default()
        };
        let mut map = Map::new(config, Converters::default()).unwrap();
        map.add(Rule::new("/docs/", "docs")).unwrap();
        let adapter = map.bind("example.com");

        assert_match!(adapter, "/docs" => "docs", {});
        assert_match!(adapter, "/docs/" => "docs", {});
    }

    #[test]
    fn methods() {
        let map = Map::with_rules(vec![
            Rule::new("/item", "read").methods(vec![Method::GET]),
            Rule::new("/item", "write").methods(vec![Method::POST, Method::PUT]),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_eq!(adapter.match_path("/item", &Method::HEAD).map(|(endpoint, _)| endpoint), Ok("read"));
        assert_eq!(adapter.match_path("/item", &Method::PUT).map(|(endpoint, _)| endpoint), Ok("write"));

        let error = adapter.match_path("/item", &Method::DELETE).unwrap_err();
        assert_eq!(error, RoutingError::MethodNotAllowed {
            valid_methods: vec![Method::GET, Method::HEAD, Method::POST, Method::PUT]
        });
        assert_eq!(error.status().as_u16(), 405);
        assert_eq!(adapter.match_path("/other", &Method::DELETE), Err(RoutingError::NotFound));

        assert_eq!(adapter.allowed_methods("/item"), vec![Method::GET, Method::HEAD, Method::POST, Method::PUT]);
        assert_eq!(adapter.allowed_methods("/other"), Vec::<Method>::new());

        let map = Map::with_rules(vec![
            Rule::new("/foo/", "post_foo").methods(vec![Method::POST]),
            Rule::new("/foo", "get_foo").methods(vec![Method::GET]),
        ]).unwrap();
        let adapter = map.bind("example.com");

        let url = adapter.build_for_method("get_foo", &Values::new(), &Method::GET, false).unwrap();
        assert_eq!(url, "/foo");
        assert_eq!(adapter.match_path(&url, &Method::GET).map(|(endpoint, _)| endpoint), Ok("get_foo"));
        assert_redirect!(adapter, "/foo" => "http://example.com/foo/", Method::POST);
        assert_eq!(
            adapter.match_path("/foo/", &Method::GET),
            Err(RoutingError::MethodNotAllowed { valid_methods: vec![Method::POST] })
        );
    }

    #[test]
    fn alias_redirects() {
        let map = Map::with_rules(vec![
            Rule::new("/", "index"),
            Rule::new("/index.html", "index").alias(true),
            Rule::new("/users/", "users").defaults(values!{"page" => 1}),
            Rule::new("/users/index.html", "users").defaults(values!{"page" => 1}).alias(true),
            Rule::new("/users/page/<int:page>", "users"),
            Rule::new("/users/page-<int:page>.html", "users").alias(true),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_redirect!(adapter, "/index.html" => "http://example.com/");
        assert_redirect!(adapter, "/users/index.html" => "http://example.com/users/");
        assert_redirect!(adapter, "/users/page-2.html" => "http://example.com/users/page/2");
        assert_redirect!(adapter, "/users/page-1.html" => "http://example.com/users/");

        let with_query = map.bind("example.com").query_args("foo=bar");
        assert_redirect!(with_query, "/users/page-1.html" => "http://example.com/users/?foo=bar");

        assert_eq!(adapter.build("index", &Values::new(), false), Ok("/".into()));
        assert_eq!(adapter.build("users", &values!{"page" => 1}, false), Ok("/users/".into()));
        assert_eq!(adapter.build("users", &values!{"page" => 2}, false), Ok("/users/page/2".into()));
    }

    #[test]
    fn aliases_without_redirects() {
        let config = MapConfig {
            redirect_defaults: false,
            ..MapConfig::default()
        };
        let mut map = Map::new(config, Converters::default()).unwrap();
        map.add(vec![Rule::new("/", "index"), Rule::new("/index.html", "index").alias(true)]).unwrap();
        let adapter = map.bind("example.com");

        assert_match!(adapter, "/index.html" => "index", {});
        assert_eq!(adapter.build("index", &Values::new(), false), Ok("/".into()));
    }

    #[test]
    fn only_aliases() {
        let map = Map::with_rules(Rule::new("/old", "old").alias(true)).unwrap();
        let adapter = map.bind("example.com");

        assert_match!(adapter, "/old" => "old", {});
        assert_eq!(adapter.build("old", &Values::new(), false), Ok("/old".into()));
    }

    #[test]
    fn defaults_redirect() {
        let map = Map::with_rules(vec![
            Rule::new("/page", "page").defaults(values!{"number" => 1}),
            Rule::new("/page/<int:number>", "page"),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_redirect!(adapter, "/page/1" => "http://example.com/page");
        assert_match!(adapter, "/page/2" => "page", {"number" => 2});
        assert_match!(adapter, "/page" => "page", {"number" => 1});

        assert_eq!(adapter.build("page", &values!{"number" => 1}, false), Ok("/page".into()));
        assert_eq!(adapter.build("page", &values!{"number" => 5}, false), Ok("/page/5".into()));
        assert_eq!(adapter.build("page", &Values::new(), false), Ok("/page".into()));
    }

    #[test]
    fn defaults_redirect_disabled() {
        let config = MapConfig {
            redirect_defaults: false,
            ..MapConfig::default()
        };
        let mut map = Map::new(config, Converters::default()).unwrap();
        map.add(vec![
            Rule::new("/page", "page").defaults(values!{"number" => 1}),
            Rule::new("/page/<int:number>", "page"),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_match!(adapter, "/page/1" => "page", {"number" => 1});
    }

    #[test]
    fn building() {
        let map = Map::with_rules(vec![
            Rule::new("/", "index"),
            Rule::new("/user/<int(fixed_digits=3):id>", "user"),
            Rule::new("/", "api_index").subdomain("api"),
        ]).unwrap();
        let adapter = map.bind("example.com").script_name("/app/");

        assert_eq!(adapter.build("index", &Values::new(), false), Ok("/app/".into()));
        assert_eq!(adapter.build("user", &values!{"id" => 7}, false), Ok("/app/user/007".into()));
        assert_eq!(adapter.build("user", &values!{"id" => 7, "tab" => "posts"}, false), Ok("/app/user/007?tab=posts".into()));
        assert_eq!(adapter.build("user", &values!{"id" => 7}, true), Ok("http://example.com/app/user/007".into()));
        assert_eq!(adapter.build("api_index", &Values::new(), false), Ok("http://api.example.com/app/".into()));
        assert_eq!(adapter.build("user", &values!{"id" => 1234}, false), Err(RoutingError::NotFound));
        assert_eq!(adapter.build("user", &Values::new(), false), Err(RoutingError::NotFound));
        assert_eq!(adapter.build("missing", &Values::new(), false), Err(RoutingError::NotFound));
    }

    #[test]
    fn building_for_methods() {
        let map = Map::with_rules(vec![
            Rule::new("/read", "item").methods(vec![Method::GET]),
            Rule::new("/write", "item").methods(vec![Method::POST]),
        ]).unwrap();
        let adapter = map.bind("example.com");

        assert_eq!(adapter.build("item", &Values::new(), false), Ok("/read".into()));
        assert_eq!(adapter.build_for_method("item", &Values::new(), &Method::POST, false), Ok("/write".into()));
        assert_eq!(adapter.build_for_method("item", &Values::new(), &Method::DELETE, false), Err(RoutingError::NotFound));
    }

    #[test]
    fn subdomains() {
        let map = Map::with_rules(Subdomain::new("<user>", vec![Rule::new("/", "profile")])).unwrap();
        let adapter = map.bind("example.com").subdomain("jane").url_scheme("https");

        assert_match!(adapter, "/" => "profile", {"user" => "jane"});
        assert_eq!(adapter.build("profile", &values!{"user" => "jane"}, false), Ok("/".into()));
        assert_eq!(adapter.build("profile", &values!{"user" => "john"}, false), Ok("https://john.example.com/".into()));
    }

    #[test]
    fn build_only_rules() {
        let map = Map::with_rules(Rule::new("/static/<path:file>", "static").build_only(true)).unwrap();
        let adapter = map.bind("example.com");

        assert_eq!(adapter.match_path("/static/a.css", &Method::GET), Err(RoutingError::NotFound));
        assert_eq!(adapter.build("static", &values!{"file" => "css/a.css"}, false), Ok("/static/css/a.css".into()));
    }
}
