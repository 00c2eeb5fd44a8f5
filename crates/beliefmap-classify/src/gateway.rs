//! The classifier seam.
//!
//! The engine never judges beliefs itself. It hands a [`ClassifyRequest`] to
//! whatever [`ClassifierGateway`] the session was built with. Remote
//! classifiers that return free text can go through [`TextGateway`], which
//! validates the request, dispatches it, and parses the reply.

use crate::contract::{parse_response, ClassifyRequest, ClassifyResponse, Suggestion, SuggestionContext};
use crate::error::GatewayError;

/// Assigns a verdict to a candidate belief.
pub trait ClassifierGateway {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Judge `request.new_belief` against its core and ancestor chain.
    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError>;
}

impl<G: ClassifierGateway + ?Sized> ClassifierGateway for &G {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
        (**self).classify(request)
    }
}

impl<G: ClassifierGateway + ?Sized> ClassifierGateway for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
        (**self).classify(request)
    }
}

/// Proposes a next belief to explore.
pub trait SuggestionSource {
    fn suggest(&self, context: &SuggestionContext) -> Result<Suggestion, GatewayError>;
}

/// Adapts a text-in, text-out transport into a [`ClassifierGateway`].
///
/// The transport receives the request as JSON and returns the classifier's raw
/// output, which may wrap the verdict object in prose.
pub struct TextGateway<F> {
    name: String,
    transport: F,
}

impl<F> TextGateway<F>
where
    F: Fn(&str) -> Result<String, GatewayError>,
{
    pub fn new(name: impl Into<String>, transport: F) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }
}

impl<F> ClassifierGateway for TextGateway<F>
where
    F: Fn(&str) -> Result<String, GatewayError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
        request.validate()?;
        let body = request.to_json()?;
        let raw = (self.transport)(&body)?;
        parse_response(&raw)
    }
}
