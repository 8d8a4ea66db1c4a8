//! URI Templates (RFC 6570) over string-valued variables.
//!
//! Parsing and expansion are done by `iri_string`; this module pins the
//! variable model to the `host`/`path`/`fragment` strings of an image name
//! and reports failures as [`TemplateError`].

use std::collections::HashMap;
use std::fmt;

use iri_string::spec::UriSpec;
use iri_string::template::simple_context::SimpleContext;
use iri_string::template::{UriTemplateStr, UriTemplateString};
use thiserror::Error;

/// Errors raised while parsing or expanding a URI Template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("malformed template {template:?}: {source}")]
    Malformed {
        template: String,
        #[source]
        source: iri_string::template::Error,
    },

    #[error("cannot expand template {template:?}: {source}")]
    Expansion {
        template: String,
        #[source]
        source: iri_string::template::Error,
    },
}

/// A parsed URI Template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    inner: UriTemplateString,
}

impl UriTemplate {
    /// Parse a template string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let inner = UriTemplateStr::new(source).map_err(|e| TemplateError::Malformed {
            template: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            inner: inner.to_owned(),
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Expand the template. Variables missing from `variables` are undefined
    /// and contribute nothing.
    pub fn expand(&self, variables: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        let mut context = SimpleContext::new();
        for (name, value) in variables {
            context.insert(*name, *value);
        }

        let expanded = self
            .inner
            .expand::<UriSpec, _>(&context)
            .map_err(|e| TemplateError::Expansion {
                template: self.as_str().to_string(),
                source: e,
            })?;
        Ok(expanded.to_string())
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
