//! Endpoint newtype
//!
//! A thin wrapper around a [`Url`] marking the GraphQL endpoint the server
//! targets by default. Tool calls may still name any other endpoint.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use url::Url;

/// A GraphQL endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Default for Endpoint {
    fn default() -> Self {
        Self(defaults::endpoint())
    }
}

impl From<Url> for Endpoint {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl FromStr for Endpoint {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s).map(Self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for Endpoint {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod defaults {
    use url::Url;

    pub(super) fn endpoint() -> Url {
        // Covered by `default_endpoint_parses_correctly`
        #[allow(clippy::unwrap_used)]
        Url::parse("http://localhost:4000/graphql").unwrap()
    }

}

#[cfg(test)]
mod test {
    use super::Endpoint;

    #[test]
    fn it_keeps_the_path() {
        let endpoint: Endpoint = "https://api.example.com/v1/graphql".parse().unwrap();
        assert_eq!(endpoint.path(), "/v1/graphql");
        assert_eq!(endpoint.to_string(), "https://api.example.com/v1/graphql");
    }

    #[test]
    fn it_rejects_relative_urls() {
        assert!("/graphql".parse::<Endpoint>().is_err());
    }

    #[test]
    fn it_converts_from_a_url() {
        let url = url::Url::parse("http://example.com/graphql").unwrap();
        assert_eq!(Endpoint::from(url).host_str(), Some("example.com"));
    }
}
