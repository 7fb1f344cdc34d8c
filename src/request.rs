use derive_builder::Builder;

use crate::catalog::VoiceCatalog;
use crate::error::{TtsError, Violations};

pub const DEFAULT_VOICE: &str = "af_sarah";
pub const DEFAULT_SPEED: f32 = 1.0;
pub const DEFAULT_LANG: &str = "en-us";

/// One validated text-to-speech request.
///
/// Only obtainable through [`SynthesisRequestBuilder::build`], which checks
/// every field against the voice catalog before handing out a value. There are
/// no setters; a request is never modified after construction.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(private, name = "draft"))]
pub struct SynthesisRequest {
    #[builder(setter(into), default)]
    text: String,
    #[builder(setter(into), default = "DEFAULT_VOICE.to_string()")]
    voice: String,
    #[builder(default = "DEFAULT_SPEED")]
    speed: f32,
    #[builder(setter(into), default = "DEFAULT_LANG.to_string()")]
    language: String,
}

impl SynthesisRequest {
    pub fn builder() -> SynthesisRequestBuilder {
        SynthesisRequestBuilder::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl SynthesisRequestBuilder {
    /// Validate and build, rejecting empty text.
    pub fn build(&self, catalog: &dyn VoiceCatalog) -> Result<SynthesisRequest, TtsError> {
        self.build_with(catalog, false)
    }

    /// Validate and build. All violated fields are reported together.
    pub fn build_with(
        &self,
        catalog: &dyn VoiceCatalog,
        allow_empty_text: bool,
    ) -> Result<SynthesisRequest, TtsError> {
        let request = self.draft().map_err(|e| {
            let mut violations = Violations::default();
            violations.push("request", e.to_string());
            TtsError::InvalidRequest(violations)
        })?;

        let violations = request.violations(catalog, allow_empty_text);
        if violations.is_empty() {
            Ok(request)
        } else {
            Err(TtsError::InvalidRequest(violations))
        }
    }
}

impl SynthesisRequest {
    fn violations(&self, catalog: &dyn VoiceCatalog, allow_empty_text: bool) -> Violations {
        let mut violations = Violations::default();

        if !allow_empty_text && self.text.trim().is_empty() {
            violations.push("text", "must not be empty");
        }
        if !catalog.contains(&self.voice) {
            violations.push(
                "voice",
                format!("'{}' is not in the voice catalog", self.voice),
            );
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            violations.push("speed", format!("must be positive (got {})", self.speed));
        }
        if self.language.trim().is_empty() {
            violations.push("language", "must not be empty");
        }

        violations
    }
}
