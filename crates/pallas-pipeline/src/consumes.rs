//! Restricting an action to request bodies of given media types.
//!
//! [`ConsumesConstraint`] takes part in candidate selection: among actions
//! sharing an id, the one whose media types cover the request's
//! `Content-Type` runs. When none does, the first candidate still runs and
//! its [`ConsumesFilter`] answers 415.

use crate::descriptor::ActionConstraint;
use crate::error::PipelineError;
use crate::filters::{ResourceExecutedContext, ResourceExecutingContext, ResourceFilter};
use crate::invoker::ResourceNext;
use crate::results::UnsupportedMediaTypeResult;
use pallas_binding::RequestContext;
use pallas_core::BoxFuture;
use std::sync::Arc;

/// An ordered set of accepted media types.
///
/// Entries may use wildcards (`*/*`, `text/*`, `application/*+json`). A
/// parameter on an entry (`charset=utf-8`) must also appear on the request.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeSet {
    media_types: Vec<mime::Mime>,
}

impl MediaTypeSet {
    /// Parses `content_types`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty list or a value that is
    /// not a media type.
    pub fn parse<I, S>(content_types: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let media_types = content_types
            .into_iter()
            .map(|content_type| {
                let content_type = content_type.as_ref();
                content_type.parse::<mime::Mime>().map_err(|e| {
                    PipelineError::configuration(format!(
                        "The media type '{content_type}' is not valid: {e}."
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if media_types.is_empty() {
            return Err(PipelineError::configuration(
                "At least one media type is required to restrict consumed content.",
            ));
        }
        Ok(Self { media_types })
    }

    /// The accepted media types.
    #[must_use]
    pub fn media_types(&self) -> &[mime::Mime] {
        &self.media_types
    }

    /// Returns `true` if `content_type` falls under one of the entries.
    /// Unparseable values are never accepted.
    #[must_use]
    pub fn accepts(&self, content_type: &str) -> bool {
        content_type
            .parse::<mime::Mime>()
            .is_ok_and(|requested| self.media_types.iter().any(|m| is_subset(&requested, m)))
    }
}

fn is_subset(requested: &mime::Mime, supported: &mime::Mime) -> bool {
    let type_matches = supported.type_() == mime::STAR || supported.type_() == requested.type_();
    let subtype_matches = if supported.subtype() == mime::STAR {
        supported
            .suffix()
            .map_or(true, |suffix| requested.suffix() == Some(suffix))
    } else {
        supported.subtype() == requested.subtype()
    };

    type_matches
        && subtype_matches
        && supported.params().all(|(name, value)| {
            requested
                .get_param(name)
                .is_some_and(|actual| actual.as_str().eq_ignore_ascii_case(value.as_str()))
        })
}

/// Accepts requests whose `Content-Type` is one of a set of media types.
///
/// Requests without a `Content-Type` are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumesConstraint {
    media_types: MediaTypeSet,
}

impl ConsumesConstraint {
    /// Accepts `content_types`.
    ///
    /// # Errors
    ///
    /// See [`MediaTypeSet::parse`].
    pub fn new<I, S>(content_types: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            media_types: MediaTypeSet::parse(content_types)?,
        })
    }

    /// The accepted media types.
    #[must_use]
    pub fn media_types(&self) -> &MediaTypeSet {
        &self.media_types
    }

    /// The filter answering 415 for the same media types.
    #[must_use]
    pub fn filter(&self) -> ConsumesFilter {
        ConsumesFilter {
            media_types: self.media_types.clone(),
        }
    }
}

impl ActionConstraint for ConsumesConstraint {
    fn accept(&self, request: &RequestContext) -> bool {
        request
            .content_type()
            .map_or(true, |content_type| self.media_types.accepts(content_type))
    }

    fn accept_as_fallback(&self, _request: &RequestContext) -> bool {
        true
    }
}

/// Short-circuits with 415 when the request's `Content-Type` is not one of
/// the accepted media types.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumesFilter {
    media_types: MediaTypeSet,
}

impl ConsumesFilter {
    /// Answers 415 for anything but `content_types`.
    ///
    /// # Errors
    ///
    /// See [`MediaTypeSet::parse`].
    pub fn new<I, S>(content_types: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            media_types: MediaTypeSet::parse(content_types)?,
        })
    }
}

impl ResourceFilter for ConsumesFilter {
    fn on_resource_execution<'a>(
        &'a self,
        context: &'a mut ResourceExecutingContext<'_>,
        next: ResourceNext<'a>,
    ) -> BoxFuture<'a, Result<ResourceExecutedContext, PipelineError>> {
        Box::pin(async move {
            let rejected = context
                .request()
                .content_type()
                .filter(|content_type| !self.media_types.accepts(content_type))
                .map(ToString::to_string);
            if let Some(content_type) = rejected {
                tracing::debug!(%content_type, "content type not consumed by action");
                return Ok(context.short_circuit(UnsupportedMediaTypeResult));
            }
            Ok(next.run(context).await)
        })
    }
}

/// The constraint and filter restricting an action to `content_types`.
///
/// # Errors
///
/// See [`MediaTypeSet::parse`].
pub fn consumes<I, S>(
    content_types: I,
) -> Result<(Arc<dyn ActionConstraint>, ConsumesFilter), PipelineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let constraint = ConsumesConstraint::new(content_types)?;
    let filter = constraint.filter();
    Ok((Arc::new(constraint), filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: Option<&str>) -> RequestContext {
        let builder = RequestContext::builder().method(http::Method::POST);
        match content_type {
            Some(content_type) => builder.header("content-type", content_type).build(),
            None => builder.build(),
        }
    }

    #[test]
    fn test_media_type_matching() {
        let set = MediaTypeSet::parse(["application/json", "text/*", "application/*+json"]).unwrap();

        assert!(set.accepts("application/json"));
        assert!(set.accepts("application/json; charset=utf-8"));
        assert!(set.accepts("TEXT/Plain"));
        assert!(set.accepts("application/problem+json"));
        assert!(!set.accepts("application/xml"));
        assert!(!set.accepts("image/png"));
        assert!(!set.accepts("not a media type"));
    }

    #[test]
    fn test_parameters_must_match() {
        let set = MediaTypeSet::parse(["text/plain; charset=utf-8"]).unwrap();
        assert!(set.accepts("text/plain; charset=UTF-8"));
        assert!(!set.accepts("text/plain"));
        assert!(!set.accepts("text/plain; charset=latin1"));
    }

    #[test]
    fn test_invalid_configuration() {
        let err = MediaTypeSet::parse(["json"]).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { .. }));
        assert!(err.to_string().contains("'json'"));

        let empty: [&str; 0] = [];
        assert!(MediaTypeSet::parse(empty).is_err());
    }

    #[test]
    fn test_constraint() {
        let constraint = ConsumesConstraint::new(["application/json"]).unwrap();

        assert!(constraint.accept(&request(Some("application/json"))));
        assert!(constraint.accept(&request(None)));
        assert!(!constraint.accept(&request(Some("text/plain"))));
        assert!(constraint.accept_as_fallback(&request(Some("text/plain"))));
    }
}
