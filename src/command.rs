use crate::error::{Result, WebOsError};
use crate::model::{Application, AudioOutputSource, InputSource};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Value produced by a command after its return transform
///
/// Most commands surface the raw response payload; a few wrap it into a
/// model type before handing it to the caller or a subscription callback.
#[derive(Debug, Clone)]
pub enum CommandValue {
    Payload(Value),
    Application(Application),
    Applications(Vec<Application>),
    Sources(Vec<InputSource>),
    AudioOutput(AudioOutputSource),
}

impl CommandValue {
    pub fn into_payload(self) -> Option<Value> {
        match self {
            CommandValue::Payload(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_application(self) -> Option<Application> {
        match self {
            CommandValue::Application(app) => Some(app),
            _ => None,
        }
    }

    pub fn into_applications(self) -> Option<Vec<Application>> {
        match self {
            CommandValue::Applications(apps) => Some(apps),
            _ => None,
        }
    }

    pub fn into_sources(self) -> Option<Vec<InputSource>> {
        match self {
            CommandValue::Sources(sources) => Some(sources),
            _ => None,
        }
    }

    pub fn into_audio_output(self) -> Option<AudioOutputSource> {
        match self {
            CommandValue::AudioOutput(output) => Some(output),
            _ => None,
        }
    }
}

/// Response validator: checks the payload before it is surfaced
pub(crate) type Validator = fn(&Value) -> Result<()>;

/// Return transform: maps a validated payload into a [`CommandValue`]
pub(crate) type Transform = fn(Value) -> Result<CommandValue>;

/// Per-argument check run during binding, before any wire traffic
pub(crate) type ArgCheck = fn(&Value) -> Result<()>;

/// Literal values usable in `const` command tables
#[derive(Debug, Clone, Copy)]
pub(crate) enum Lit {
    Null,
    Int(i64),
}

impl Lit {
    fn to_value(self) -> Value {
        match self {
            Lit::Null => Value::Null,
            Lit::Int(n) => Value::from(n),
        }
    }
}

/// One field of an outbound command payload
#[derive(Debug, Clone, Copy)]
pub(crate) enum Field {
    /// Fixed value, e.g. `"replace": 0`
    Literal(&'static str, Lit),
    /// Filled from a positional argument
    Arg {
        key: &'static str,
        index: usize,
        check: Option<ArgCheck>,
    },
    /// Filled from a named argument, with an optional default
    Named {
        key: &'static str,
        name: &'static str,
        default: Option<Lit>,
        check: Option<ArgCheck>,
    },
}

/// How a command builds its payload from call-site arguments
#[derive(Debug, Clone, Copy)]
pub(crate) enum PayloadSpec {
    /// No payload at all
    None,
    /// Object assembled field by field
    Fields(&'static [Field]),
    /// The positional argument at this index is the entire payload
    Arg(usize),
}

/// A single entry in a control's command table
pub(crate) struct Command {
    pub name: &'static str,
    pub uri: &'static str,
    pub payload: PayloadSpec,
    pub validate: Validator,
    pub transform: Option<Transform>,
    pub subscribable: bool,
}

/// Call-site arguments handed to [`bind`]
#[derive(Debug, Default)]
pub(crate) struct Args {
    positional: Vec<Value>,
    named: HashMap<&'static str, Value>,
}

impl Args {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            ..Self::default()
        }
    }

    /// Attach a named argument; `None` leaves it to the field's default
    pub fn named(mut self, name: &'static str, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.named.insert(name, value);
        }
        self
    }
}

/// Bind call-site arguments to a command's payload
///
/// Validators reject bad input here, before anything touches the socket.
pub(crate) fn bind(command: &Command, args: &Args) -> Result<Option<Value>> {
    match command.payload {
        PayloadSpec::None => Ok(None),
        PayloadSpec::Arg(index) => {
            let value = args.positional.get(index).cloned().ok_or_else(|| {
                WebOsError::InvalidArgument(format!(
                    "{}: missing argument {}",
                    command.name, index
                ))
            })?;
            Ok(Some(value))
        }
        PayloadSpec::Fields(fields) => {
            let mut object = Map::new();
            for field in fields {
                match *field {
                    Field::Literal(key, lit) => {
                        object.insert(key.to_string(), lit.to_value());
                    }
                    Field::Arg { key, index, check } => {
                        let value = args.positional.get(index).cloned().ok_or_else(|| {
                            WebOsError::InvalidArgument(format!(
                                "{}: missing argument {}",
                                command.name, index
                            ))
                        })?;
                        if let Some(check) = check {
                            check(&value)?;
                        }
                        object.insert(key.to_string(), value);
                    }
                    Field::Named {
                        key,
                        name,
                        default,
                        check,
                    } => {
                        let value = match args.named.get(name) {
                            Some(value) => {
                                if let Some(check) = check {
                                    check(value)?;
                                }
                                value.clone()
                            }
                            None => match default {
                                Some(lit) => lit.to_value(),
                                None => {
                                    return Err(WebOsError::InvalidArgument(format!(
                                        "{}: missing argument '{}'",
                                        command.name, name
                                    )))
                                }
                            },
                        };
                        object.insert(key.to_string(), value);
                    }
                }
            }
            Ok(Some(Value::Object(object)))
        }
    }
}

/// Bind arguments for a `subscribe` frame: the command payload plus
/// `"subscribe": true`
pub(crate) fn bind_subscribe(command: &Command, args: &Args) -> Result<Value> {
    let mut object = match bind(command, args)? {
        None => Map::new(),
        Some(Value::Object(object)) => object,
        Some(_) => {
            return Err(WebOsError::InvalidArgument(format!(
                "{}: subscription payload must be an object",
                command.name
            )))
        }
    };
    object.insert("subscribe".to_string(), Value::Bool(true));
    Ok(Value::Object(object))
}

/// Default response validator: `returnValue` must be truthy
pub(crate) fn validate_return(payload: &Value) -> Result<()> {
    if payload.get("returnValue").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    Err(WebOsError::CommandFailed {
        code: payload.get("errorCode").and_then(Value::as_i64),
        message: payload
            .get("errorText")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error.")
            .to_string(),
    })
}

/// Mute responses additionally require a boolean `mute` field
pub(crate) fn validate_mute(payload: &Value) -> Result<()> {
    validate_return(payload)?;
    if payload.get("mute").map(Value::is_boolean) == Some(true) {
        Ok(())
    } else {
        Err(WebOsError::ValidationFailed(
            "mute is not a boolean".to_string(),
        ))
    }
}

pub(crate) fn check_volume_range(value: &Value) -> Result<()> {
    match value.as_i64() {
        Some(volume) if (0..=100).contains(&volume) => Ok(()),
        _ => Err(WebOsError::InvalidArgument(
            "volume must be between 0 and 100".to_string(),
        )),
    }
}

fn wrap_list<T>(payload: Value, key: &str, wrap: fn(Value) -> Result<T>) -> Result<Vec<T>> {
    match payload.get(key).and_then(Value::as_array) {
        Some(items) => items.iter().cloned().map(wrap).collect(),
        None => Err(WebOsError::ValidationFailed(format!(
            "response has no '{}' list",
            key
        ))),
    }
}

pub(crate) fn transform_apps(payload: Value) -> Result<CommandValue> {
    wrap_list(payload, "apps", |entry| Ok(Application::new(entry)))
        .map(CommandValue::Applications)
}

pub(crate) fn transform_launch_points(payload: Value) -> Result<CommandValue> {
    wrap_list(payload, "launchPoints", |entry| Ok(Application::new(entry)))
        .map(CommandValue::Applications)
}

pub(crate) fn transform_foreground_app(payload: Value) -> Result<CommandValue> {
    Ok(CommandValue::Application(Application::new(payload)))
}

pub(crate) fn transform_sources(payload: Value) -> Result<CommandValue> {
    wrap_list(payload, "devices", InputSource::new).map(CommandValue::Sources)
}

pub(crate) fn transform_sound_output(mut payload: Value) -> Result<CommandValue> {
    match payload.get_mut("soundOutput") {
        Some(output) => Ok(CommandValue::AudioOutput(AudioOutputSource::new(output.take()))),
        None => Err(WebOsError::ValidationFailed(
            "response has no 'soundOutput'".to_string(),
        )),
    }
}

pub(crate) fn transform_channel_list(mut payload: Value) -> Result<CommandValue> {
    match payload.get_mut("channelList") {
        Some(list) => Ok(CommandValue::Payload(list.take())),
        None => Err(WebOsError::ValidationFailed(
            "response has no 'channelList'".to_string(),
        )),
    }
}
