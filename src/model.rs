use crate::error::{Result, WebOsError};
use serde_json::Value;
use std::fmt;

/// An application installed on the TV
///
/// Wraps the raw JSON entry returned by the application manager; fields vary
/// by firmware, so everything beyond the stable accessors goes through
/// [`Application::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Application(Value);

impl Application {
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    /// Application id, e.g. `com.webos.app.home`
    pub fn id(&self) -> Option<&str> {
        self.0
            .get("id")
            .or_else(|| self.0.get("appId"))
            .and_then(Value::as_str)
    }

    /// Human-readable title
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// Arbitrary field access into the raw entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The raw JSON entry
    pub fn raw(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.title().or_else(|| self.id()).unwrap_or("Unknown App");
        write!(f, "<Application '{}'>", name)
    }
}

/// An external input (HDMI, component, ...) reported by the TV
///
/// Every valid entry carries a `label`; construction rejects entries
/// without one.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSource(Value);

impl InputSource {
    pub fn new(data: Value) -> Result<Self> {
        if data.get("label").and_then(Value::as_str).is_none() {
            return Err(WebOsError::ValidationFailed(
                "input source has no 'label'".to_string(),
            ));
        }
        Ok(Self(data))
    }

    /// Input id, e.g. `HDMI_1`
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Display label, e.g. `HDMI 1`
    pub fn label(&self) -> &str {
        self.0.get("label").and_then(Value::as_str).unwrap_or_default()
    }

    /// App id the TV switches to for this input
    pub fn app_id(&self) -> Option<&str> {
        self.0.get("appId").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<InputSource '{}'>", self.label())
    }
}

/// An audio output route (TV speaker, soundbar, ...)
///
/// The TV usually reports these as a bare name string; richer object
/// shapes are kept verbatim rather than picked apart.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOutputSource(Value);

impl AudioOutputSource {
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    /// Construct from a bare output name
    pub fn named(name: impl Into<String>) -> Self {
        Self(Value::String(name.into()))
    }

    /// The output name, when the data is a bare name
    pub fn name(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for AudioOutputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<AudioOutputSource '{}'>", name),
            None => write!(f, "<AudioOutputSource '{}'>", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn application_accessors() {
        let app = Application::new(json!({
            "id": "netflix",
            "title": "Netflix",
            "version": "2.1.0"
        }));
        assert_eq!(app.id(), Some("netflix"));
        assert_eq!(app.title(), Some("Netflix"));
        assert_eq!(app.get("version"), Some(&json!("2.1.0")));
        assert_eq!(app.get("nonexistent"), None);
        assert_eq!(app.to_string(), "<Application 'Netflix'>");
    }

    #[test]
    fn application_falls_back_to_app_id() {
        let app = Application::new(json!({"appId": "com.webos.app.settings"}));
        assert_eq!(app.id(), Some("com.webos.app.settings"));
        assert_eq!(app.to_string(), "<Application 'com.webos.app.settings'>");

        let empty = Application::new(json!({}));
        assert_eq!(empty.to_string(), "<Application 'Unknown App'>");
    }

    #[test]
    fn input_source_accessors() {
        let source = InputSource::new(json!({
            "id": "HDMI_2",
            "label": "HDMI 2",
            "port": 2,
            "appId": "com.webos.app.hdmi2"
        }))
        .unwrap();
        assert_eq!(source.id(), Some("HDMI_2"));
        assert_eq!(source.label(), "HDMI 2");
        assert_eq!(source.app_id(), Some("com.webos.app.hdmi2"));
        assert_eq!(source.to_string(), "<InputSource 'HDMI 2'>");
    }

    #[test]
    fn input_source_requires_label() {
        let err = InputSource::new(json!({"id": "HDMI_1"})).unwrap_err();
        assert!(matches!(err, crate::error::WebOsError::ValidationFailed(_)));
    }

    #[test]
    fn audio_output_source_both_shapes() {
        let bare = AudioOutputSource::named("tv_speaker");
        assert_eq!(bare.name(), Some("tv_speaker"));
        assert_eq!(bare.to_string(), "<AudioOutputSource 'tv_speaker'>");

        // Object-shaped data is shown verbatim, never field-extracted
        let object = AudioOutputSource::new(json!({"soundOutput": "external_speaker"}));
        assert_eq!(object.name(), None);
        assert_eq!(
            object.to_string(),
            format!(
                "<AudioOutputSource '{}'>",
                json!({"soundOutput": "external_speaker"})
            )
        );
    }
}
