use std::{borrow::Cow, marker::PhantomData};

use serde::Serialize;
use serde_json::Value;

use crate::{GraphQLRequest, QueryError};

/// A GraphQL document paired with the types of its result and variables.
///
/// Code generators can declare documents as constants:
///
/// ```
/// use leptos_graphql::TypedDocument;
///
/// #[derive(Debug, Clone, serde::Deserialize)]
/// pub struct CountryQuery {
///     pub country: Option<Country>,
/// }
///
/// #[derive(Debug, Clone, serde::Deserialize)]
/// pub struct Country {
///     pub name: String,
/// }
///
/// #[derive(Debug, Clone, PartialEq, serde::Serialize)]
/// pub struct CountryQueryVariables {
///     pub code: String,
/// }
///
/// pub const COUNTRY_QUERY_DOCUMENT: TypedDocument<CountryQuery, CountryQueryVariables> =
///     TypedDocument::new("query CountryQuery($code: ID!) { country(code: $code) { name } }");
/// ```
pub struct TypedDocument<R, V = ()> {
    source: Cow<'static, str>,
    _types: PhantomData<fn() -> (R, V)>,
}

impl<R, V> TypedDocument<R, V> {
    /// Creates a document from static text.
    pub const fn new(source: &'static str) -> Self {
        Self {
            source: Cow::Borrowed(source),
            _types: PhantomData,
        }
    }

    /// Creates a document from owned text.
    pub fn from_string(source: String) -> Self {
        Self {
            source: Cow::Owned(source),
            _types: PhantomData,
        }
    }

    /// The document text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Name of the first named operation in the document.
    pub fn operation_name(&self) -> Option<&str> {
        operation_name(&self.source)
    }

    /// Builds the request body for a variables snapshot.
    pub(crate) fn request(&self, variables: Option<Value>) -> GraphQLRequest {
        GraphQLRequest {
            query: self.source.to_string(),
            variables,
            operation_name: self.operation_name().map(str::to_string),
        }
    }
}

impl<R, V> Clone for TypedDocument<R, V> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            _types: PhantomData,
        }
    }
}

impl<R, V> std::fmt::Debug for TypedDocument<R, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedDocument")
            .field("source", &self.source)
            .finish()
    }
}

/// An untyped query string.
///
/// Result and variables types must be named by the caller when it is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gql(Cow<'static, str>);

/// Marks a string as a GraphQL document.
pub fn gql(source: impl Into<Cow<'static, str>>) -> Gql {
    Gql(source.into())
}

impl Gql {
    /// Attaches result and variables types.
    pub fn typed<R, V>(self) -> TypedDocument<R, V> {
        TypedDocument {
            source: self.0,
            _types: PhantomData,
        }
    }
}

/// Anything that can be queried: a [`TypedDocument`], a [`Gql`] or a plain string.
pub trait IntoDocument<R, V> {
    /// Converts into a typed document.
    fn into_document(self) -> TypedDocument<R, V>;
}

impl<R, V> IntoDocument<R, V> for TypedDocument<R, V> {
    fn into_document(self) -> TypedDocument<R, V> {
        self
    }
}

impl<R, V> IntoDocument<R, V> for &TypedDocument<R, V> {
    fn into_document(self) -> TypedDocument<R, V> {
        self.clone()
    }
}

impl<R, V> IntoDocument<R, V> for Gql {
    fn into_document(self) -> TypedDocument<R, V> {
        self.typed()
    }
}

impl<R, V> IntoDocument<R, V> for &'static str {
    fn into_document(self) -> TypedDocument<R, V> {
        TypedDocument::new(self)
    }
}

impl<R, V> IntoDocument<R, V> for String {
    fn into_document(self) -> TypedDocument<R, V> {
        TypedDocument::from_string(self)
    }
}

/// Variables serialized at one point in time.
///
/// Two snapshots are equal when they serialize to the same JSON, so an unchanged
/// variables producer never triggers a new request.
#[derive(Debug, Clone, PartialEq)]
pub struct VariablesSnapshot(Result<Option<Value>, QueryError>);

impl VariablesSnapshot {
    /// Serializes the variables. JSON `null` (e.g. `()`) means "no variables".
    pub fn capture<V: Serialize>(variables: &V) -> Self {
        let value = serde_json::to_value(variables)
            .map(|value| (!value.is_null()).then_some(value))
            .map_err(|e| QueryError::Variables(e.to_string()));
        Self(value)
    }

    /// A snapshot without variables.
    pub fn empty() -> Self {
        Self(Ok(None))
    }

    pub(crate) fn value(&self) -> Result<Option<Value>, QueryError> {
        self.0.clone()
    }
}

const OPERATION_KEYWORDS: [&str; 3] = ["query", "mutation", "subscription"];

/// Finds the name of the first named operation.
/// Anonymous operations and the `{ ... }` shorthand have no name.
pub(crate) fn operation_name(source: &str) -> Option<&str> {
    let mut tokens = Tokens::new(source);
    while let Some(token) = tokens.next() {
        if OPERATION_KEYWORDS.contains(&token) {
            return tokens.next().filter(|name| is_name(name));
        }
        if token == "fragment" {
            // Skip "name on Type".
            tokens.next();
            tokens.next();
            tokens.next();
        }
        if token == "{" {
            tokens.skip_block();
        }
    }
    None
}

fn is_name(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Splits a document into names and single punctuators, dropping comments,
/// strings, whitespace and commas.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Self { rest: source }
    }

    fn skip_block(&mut self) {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some("{") => depth += 1,
                Some("}") => depth -= 1,
                Some(_) => {}
                None => return,
            }
        }
    }

    fn skip_ignored(&mut self) {
        loop {
            let trimmed = self.rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if let Some(comment) = trimmed.strip_prefix('#') {
                self.rest = comment.find('\n').map_or("", |end| &comment[end..]);
            } else {
                self.rest = trimmed;
                return;
            }
        }
    }

    fn skip_string(&mut self) {
        if let Some(block) = self.rest.strip_prefix("\"\"\"") {
            self.rest = block.find("\"\"\"").map_or("", |end| &block[end + 3..]);
            return;
        }
        let body = &self.rest[1..];
        let mut escaped = false;
        for (index, c) in body.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    self.rest = &body[index + 1..];
                    return;
                }
                _ => escaped = false,
            }
        }
        self.rest = "";
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            self.skip_ignored();
            let c = self.rest.chars().next()?;
            if c == '"' {
                self.skip_string();
                continue;
            }
            let len = if c == '_' || c.is_ascii_alphanumeric() {
                self.rest
                    .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                    .unwrap_or(self.rest.len())
            } else {
                c.len_utf8()
            };
            let (token, rest) = self.rest.split_at(len);
            self.rest = rest;
            return Some(token);
        }
    }
}
