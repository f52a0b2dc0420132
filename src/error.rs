//!Errors produced while binding rules and while routing.

use thiserror::Error;

use crate::{Method, StatusCode};

///A rule could not be bound to a map.
///
///These errors are programmer errors. They are returned while the map is
///being built and should never occur while requests are handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    ///The rule refers to a converter that isn't in the registry.
    #[error("the converter `{0}` is not registered")]
    UnknownConverter(String),

    ///The same variable name appears twice in one rule.
    #[error("variable name `{0}` used twice")]
    DuplicateVariable(String),

    ///The rule template could not be parsed.
    #[error("malformed url rule `{0}`")]
    MalformedRule(String),

    ///Rule templates must start with a `/`.
    #[error("url rule `{0}` does not start with a leading slash")]
    MissingLeadingSlash(String),

    ///A converter rejected its arguments.
    #[error("invalid converter argument: {0}")]
    InvalidArgument(String),

    ///The compiled pattern was rejected by the regex engine.
    #[error("rule `{rule}` compiled to an invalid pattern: {message}")]
    InvalidPattern {
        ///The rule template.
        rule: String,
        ///The message from the regex engine.
        message: String,
    },

    ///Only UTF-8 is supported as URL charset.
    #[error("unsupported charset `{0}`")]
    UnsupportedCharset(String),
}

///The outcome of a match or build that didn't produce a result.
///
///Both redirects and missing routes are regular control flow for the
///caller, which is expected to turn them into HTTP responses. `status`
///gives the matching status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    ///The request should be redirected to `new_url`. This happens when a
    ///trailing slash is missing or when the URL isn't in its canonical
    ///form.
    #[error("redirect to {new_url}")]
    RequestRedirect {
        ///The absolute URL to redirect to.
        new_url: String,
    },

    ///No rule matched, or no rule could build the requested URL.
    #[error("no matching url rule")]
    NotFound,

    ///The path matched at least one rule, but none of them accepted the
    ///request method.
    #[error("method not allowed, valid methods: {}", join_methods(.valid_methods))]
    MethodNotAllowed {
        ///The methods that would have been accepted.
        valid_methods: Vec<Method>,
    },
}

impl RoutingError {
    ///The HTTP status code that corresponds to this outcome.
    pub fn status(&self) -> StatusCode {
        match *self {
            RoutingError::RequestRedirect { .. } => StatusCode::MOVED_PERMANENTLY,
            RoutingError::NotFound => StatusCode::NOT_FOUND,
            RoutingError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    ///Get the redirect target, if this is a redirect.
    pub fn redirect_url(&self) -> Option<&str> {
        match *self {
            RoutingError::RequestRedirect { ref new_url } => Some(new_url),
            _ => None,
        }
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods.iter().map(|method| method.as_str()).collect::<Vec<_>>().join(", ")
}
