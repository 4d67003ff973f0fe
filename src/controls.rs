use crate::command::{
    self, Args, Command, CommandValue, Field, Lit, PayloadSpec,
};
use crate::connection::Connection;
use crate::error::{Result, WebOsError};
use crate::model::{Application, AudioOutputSource, InputSource};
use crate::pointer::PointerSocket;
use crate::subscription::{handler, SubscriptionEntry, SubscriptionHandler};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

fn find_command(table: &'static [Command], name: &str) -> Result<&'static Command> {
    table
        .iter()
        .find(|command| command.name == name)
        .ok_or_else(|| WebOsError::InvalidArgument(format!("unknown command '{}'", name)))
}

/// Shared plumbing behind every control object
///
/// Holds the borrowed connection, the control's command table, and the
/// per-control `command name -> subscription id` map.
struct CommandSurface {
    connection: Arc<Connection>,
    table: &'static [Command],
    active: Mutex<HashMap<&'static str, String>>,
}

impl CommandSurface {
    fn new(connection: Arc<Connection>, table: &'static [Command]) -> Self {
        Self {
            connection,
            table,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Bind arguments, send, validate, transform
    async fn exec(&self, name: &'static str, args: Args) -> Result<CommandValue> {
        let command = find_command(self.table, name)?;
        let payload = command::bind(command, &args)?;
        let response = self.connection.send_request(command.uri, payload).await?;
        (command.validate)(&response)?;
        match command.transform {
            Some(transform) => transform(response),
            None => Ok(CommandValue::Payload(response)),
        }
    }

    /// `exec` for commands whose result is the raw payload
    async fn exec_payload(&self, name: &'static str, args: Args) -> Result<Value> {
        match self.exec(name, args).await? {
            CommandValue::Payload(value) => Ok(value),
            _ => Err(WebOsError::InvalidResponse(format!(
                "{}: unexpected transformed value",
                name
            ))),
        }
    }

    async fn subscribe(
        &self,
        name: &'static str,
        args: Args,
        handler: SubscriptionHandler,
    ) -> Result<()> {
        let command = find_command(self.table, name)?;
        if !command.subscribable {
            return Err(WebOsError::NotSubscribable(name.to_string()));
        }

        // The map stays locked across the send, so two concurrent
        // subscribes for the same name cannot both pass the guard
        let mut active = self.active.lock().await;
        if let Some(id) = active.get(name) {
            if self.connection.has_subscription(id).await {
                return Err(WebOsError::AlreadySubscribed(name.to_string()));
            }
            // Left over from a closed connection; a fresh subscribe is fine
            active.remove(name);
        }

        let payload = command::bind_subscribe(command, &args)?;
        let subscription_id = Uuid::new_v4().to_string();
        let entry = SubscriptionEntry {
            uri: command.uri.to_string(),
            validate: command.validate,
            transform: command.transform,
            handler,
        };

        self.connection
            .subscribe(subscription_id.clone(), entry, payload)
            .await?;
        active.insert(name, subscription_id);
        Ok(())
    }

    async fn unsubscribe(&self, name: &'static str) -> Result<()> {
        let mut active = self.active.lock().await;
        let id = active
            .get(name)
            .cloned()
            .ok_or_else(|| WebOsError::NotSubscribed(name.to_string()))?;

        let result = self.connection.unsubscribe(&id).await;
        active.remove(name);
        match result {
            // The registry was already emptied by a disconnect
            Err(WebOsError::NotSubscribed(_)) => Err(WebOsError::NotSubscribed(name.to_string())),
            other => other,
        }
    }
}

const MEDIA_COMMANDS: &[Command] = &[
    Command {
        name: "volume_up",
        uri: "ssap://audio/volumeUp",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "volume_down",
        uri: "ssap://audio/volumeDown",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "get_volume",
        uri: "ssap://audio/getVolume",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: true,
    },
    Command {
        name: "set_volume",
        uri: "ssap://audio/setVolume",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "volume",
            index: 0,
            check: Some(command::check_volume_range),
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "set_mute",
        uri: "ssap://audio/setMute",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "mute",
            index: 0,
            check: None,
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "get_mute",
        uri: "ssap://audio/getMute",
        payload: PayloadSpec::None,
        validate: command::validate_mute,
        transform: None,
        subscribable: true,
    },
    Command {
        name: "play",
        uri: "ssap://media.controls/play",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "pause",
        uri: "ssap://media.controls/pause",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "stop",
        uri: "ssap://media.controls/stop",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "rewind",
        uri: "ssap://media.controls/rewind",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "fast_forward",
        uri: "ssap://media.controls/fastForward",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "get_audio_output",
        uri: "ssap://audio/getSoundOutput",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_sound_output),
        subscribable: true,
    },
    Command {
        name: "set_audio_output",
        uri: "ssap://audio/changeSoundOutput",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "output",
            index: 0,
            check: None,
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// Volume, mute, playback transport, and audio routing
pub struct MediaControl {
    surface: CommandSurface,
}

impl MediaControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, MEDIA_COMMANDS),
        }
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.surface.exec("volume_up", Args::none()).await.map(|_| ())
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.surface
            .exec("volume_down", Args::none())
            .await
            .map(|_| ())
    }

    /// Current volume and mute state, e.g. `{"volume": 15, "muted": false}`
    pub async fn get_volume(&self) -> Result<Value> {
        self.surface.exec_payload("get_volume", Args::none()).await
    }

    /// Set the volume; values outside 0..=100 are rejected before sending
    pub async fn set_volume(&self, volume: i32) -> Result<()> {
        self.surface
            .exec("set_volume", Args::positional(vec![json!(volume)]))
            .await
            .map(|_| ())
    }

    pub async fn set_mute(&self, mute: bool) -> Result<()> {
        self.surface
            .exec("set_mute", Args::positional(vec![json!(mute)]))
            .await
            .map(|_| ())
    }

    pub async fn get_mute(&self) -> Result<bool> {
        let payload = self.surface.exec_payload("get_mute", Args::none()).await?;
        // The validator guarantees the field is a boolean
        Ok(payload.get("mute").and_then(Value::as_bool).unwrap_or(false))
    }

    pub async fn get_audio_output(&self) -> Result<AudioOutputSource> {
        self.surface
            .exec("get_audio_output", Args::none())
            .await?
            .into_audio_output()
            .ok_or_else(|| WebOsError::InvalidResponse("expected audio output".to_string()))
    }

    pub async fn set_audio_output(&self, output: &str) -> Result<()> {
        self.surface
            .exec("set_audio_output", Args::positional(vec![json!(output)]))
            .await
            .map(|_| ())
    }

    /// Output routes webOS knows about; not a wire call
    pub fn list_audio_output_sources(&self) -> Vec<AudioOutputSource> {
        [
            "tv_speaker",
            "external_speaker",
            "soundbar",
            "bt_soundbar",
            "tv_external_speaker",
        ]
        .into_iter()
        .map(AudioOutputSource::named)
        .collect()
    }

    pub async fn subscribe_get_volume<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("get_volume", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_get_volume(&self) -> Result<()> {
        self.surface.unsubscribe("get_volume").await
    }

    pub async fn subscribe_get_mute<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("get_mute", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_get_mute(&self) -> Result<()> {
        self.surface.unsubscribe("get_mute").await
    }

    pub async fn subscribe_get_audio_output<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("get_audio_output", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_get_audio_output(&self) -> Result<()> {
        self.surface.unsubscribe("get_audio_output").await
    }
}

const SYSTEM_COMMANDS: &[Command] = &[
    Command {
        name: "power_off",
        uri: "ssap://system/turnOff",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "turn_on",
        uri: "ssap://system/turnOn",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "info",
        uri: "ssap://system/getSystemInfo",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "notify",
        uri: "ssap://system.notifications/createToast",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "message",
            index: 0,
            check: None,
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "power_state",
        uri: "ssap://com.webos.service.power/power/getPowerState",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: true,
    },
    Command {
        name: "launcher_close",
        uri: "ssap://com.webos.app.home/close",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "launcher_ready",
        uri: "ssap://com.webos.app.home/ready",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// Power, system info, and notifications
pub struct SystemControl {
    surface: CommandSurface,
}

impl SystemControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, SYSTEM_COMMANDS),
        }
    }

    pub async fn power_off(&self) -> Result<()> {
        self.surface.exec("power_off", Args::none()).await.map(|_| ())
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.surface.exec("turn_on", Args::none()).await.map(|_| ())
    }

    /// Model name, firmware version, and friends
    pub async fn info(&self) -> Result<Value> {
        self.surface.exec_payload("info", Args::none()).await
    }

    /// Show a toast notification on the TV
    pub async fn notify(&self, message: &str) -> Result<()> {
        self.surface
            .exec("notify", Args::positional(vec![json!(message)]))
            .await
            .map(|_| ())
    }

    pub async fn power_state(&self) -> Result<Value> {
        self.surface.exec_payload("power_state", Args::none()).await
    }

    pub async fn launcher_close(&self) -> Result<()> {
        self.surface
            .exec("launcher_close", Args::none())
            .await
            .map(|_| ())
    }

    pub async fn launcher_ready(&self) -> Result<()> {
        self.surface
            .exec("launcher_ready", Args::none())
            .await
            .map(|_| ())
    }

    pub async fn subscribe_power_state<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("power_state", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_power_state(&self) -> Result<()> {
        self.surface.unsubscribe("power_state").await
    }
}

const APPLICATION_COMMANDS: &[Command] = &[
    Command {
        name: "list_apps",
        uri: "ssap://com.webos.applicationManager/listApps",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_apps),
        subscribable: false,
    },
    Command {
        name: "list_launch_points",
        uri: "ssap://com.webos.applicationManager/listLaunchPoints",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_launch_points),
        subscribable: false,
    },
    Command {
        name: "get_foreground_app",
        uri: "ssap://com.webos.applicationManager/getForegroundAppInfo",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_foreground_app),
        subscribable: true,
    },
    Command {
        name: "get_app_status",
        uri: "ssap://system.launcher/getAppState",
        payload: PayloadSpec::Arg(0),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "launch",
        uri: "ssap://system.launcher/launch",
        payload: PayloadSpec::Arg(0),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "launch_app",
        uri: "ssap://system.launcher/launch",
        payload: PayloadSpec::Fields(&[
            Field::Arg {
                key: "id",
                index: 0,
                check: None,
            },
            Field::Named {
                key: "contentId",
                name: "content_id",
                default: Some(Lit::Null),
                check: None,
            },
        ]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "close",
        uri: "ssap://system.launcher/close",
        payload: PayloadSpec::Arg(0),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "close_app",
        uri: "ssap://system.launcher/close",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "id",
            index: 0,
            check: None,
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// Application listing, launching, and closing
pub struct ApplicationControl {
    surface: CommandSurface,
}

impl ApplicationControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, APPLICATION_COMMANDS),
        }
    }

    pub async fn list_apps(&self) -> Result<Vec<Application>> {
        self.surface
            .exec("list_apps", Args::none())
            .await?
            .into_applications()
            .ok_or_else(|| WebOsError::InvalidResponse("expected application list".to_string()))
    }

    pub async fn list_launch_points(&self) -> Result<Vec<Application>> {
        self.surface
            .exec("list_launch_points", Args::none())
            .await?
            .into_applications()
            .ok_or_else(|| WebOsError::InvalidResponse("expected launch point list".to_string()))
    }

    pub async fn get_foreground_app(&self) -> Result<Application> {
        self.surface
            .exec("get_foreground_app", Args::none())
            .await?
            .into_application()
            .ok_or_else(|| WebOsError::InvalidResponse("expected application".to_string()))
    }

    pub async fn get_app_status(&self, query: Value) -> Result<Value> {
        self.surface
            .exec_payload("get_app_status", Args::positional(vec![query]))
            .await
    }

    /// Launch with a raw launcher payload
    pub async fn launch(&self, payload: Value) -> Result<Value> {
        self.surface
            .exec_payload("launch", Args::positional(vec![payload]))
            .await
    }

    /// Launch an app by id, optionally deep-linking into content
    pub async fn launch_app(&self, id: &str, content_id: Option<&str>) -> Result<Value> {
        self.surface
            .exec_payload(
                "launch_app",
                Args::positional(vec![json!(id)])
                    .named("content_id", content_id.map(|c| json!(c))),
            )
            .await
    }

    pub async fn close(&self, payload: Value) -> Result<()> {
        self.surface
            .exec("close", Args::positional(vec![payload]))
            .await
            .map(|_| ())
    }

    pub async fn close_app(&self, id: &str) -> Result<()> {
        self.surface
            .exec("close_app", Args::positional(vec![json!(id)]))
            .await
            .map(|_| ())
    }

    pub async fn subscribe_get_foreground_app<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("get_foreground_app", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_get_foreground_app(&self) -> Result<()> {
        self.surface.unsubscribe("get_foreground_app").await
    }
}

const TV_COMMANDS: &[Command] = &[
    Command {
        name: "channel_up",
        uri: "ssap://tv/channelUp",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "channel_down",
        uri: "ssap://tv/channelDown",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "get_channels",
        uri: "ssap://tv/getChannelList",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_channel_list),
        subscribable: false,
    },
    Command {
        name: "get_current_channel",
        uri: "ssap://tv/getCurrentChannel",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: true,
    },
    Command {
        name: "get_channel_info",
        uri: "ssap://tv/getChannelProgramInfo",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "set_channel",
        uri: "ssap://tv/openChannel",
        payload: PayloadSpec::Arg(0),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// Broadcast channel handling
pub struct TvControl {
    surface: CommandSurface,
}

impl TvControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, TV_COMMANDS),
        }
    }

    pub async fn channel_up(&self) -> Result<()> {
        self.surface
            .exec("channel_up", Args::none())
            .await
            .map(|_| ())
    }

    pub async fn channel_down(&self) -> Result<()> {
        self.surface
            .exec("channel_down", Args::none())
            .await
            .map(|_| ())
    }

    pub async fn get_channels(&self) -> Result<Value> {
        self.surface.exec_payload("get_channels", Args::none()).await
    }

    pub async fn get_current_channel(&self) -> Result<Value> {
        self.surface
            .exec_payload("get_current_channel", Args::none())
            .await
    }

    pub async fn get_channel_info(&self) -> Result<Value> {
        self.surface
            .exec_payload("get_channel_info", Args::none())
            .await
    }

    /// Tune by raw channel descriptor, e.g. `{"channelId": "..."}`
    pub async fn set_channel(&self, channel: Value) -> Result<()> {
        self.surface
            .exec("set_channel", Args::positional(vec![channel]))
            .await
            .map(|_| ())
    }

    pub async fn subscribe_get_current_channel<F, Fut>(&self, callback: F) -> Result<()>
    where
        F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.surface
            .subscribe("get_current_channel", Args::none(), handler(callback))
            .await
    }

    pub async fn unsubscribe_get_current_channel(&self) -> Result<()> {
        self.surface.unsubscribe("get_current_channel").await
    }
}

const SOURCE_COMMANDS: &[Command] = &[
    Command {
        name: "list_sources",
        uri: "ssap://tv/getExternalInputList",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: Some(command::transform_sources),
        subscribable: false,
    },
    Command {
        name: "set_source",
        uri: "ssap://tv/switchInput",
        payload: PayloadSpec::Arg(0),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// External input selection
pub struct SourceControl {
    surface: CommandSurface,
}

impl SourceControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, SOURCE_COMMANDS),
        }
    }

    pub async fn list_sources(&self) -> Result<Vec<InputSource>> {
        self.surface
            .exec("list_sources", Args::none())
            .await?
            .into_sources()
            .ok_or_else(|| WebOsError::InvalidResponse("expected input source list".to_string()))
    }

    /// Switch to an input, e.g. `{"inputId": "HDMI_1"}`
    pub async fn set_source(&self, input: Value) -> Result<()> {
        self.surface
            .exec("set_source", Args::positional(vec![input]))
            .await
            .map(|_| ())
    }
}

const INPUT_COMMANDS: &[Command] = &[
    Command {
        name: "insert_text",
        uri: "ssap://com.webos.service.ime/insertText",
        payload: PayloadSpec::Fields(&[
            Field::Arg {
                key: "text",
                index: 0,
                check: None,
            },
            Field::Literal("replace", Lit::Int(0)),
        ]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "delete_characters",
        uri: "ssap://com.webos.service.ime/deleteCharacters",
        payload: PayloadSpec::Fields(&[Field::Arg {
            key: "count",
            index: 0,
            check: None,
        }]),
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "send_enter",
        uri: "ssap://com.webos.service.ime/sendEnterKey",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
    Command {
        name: "get_pointer_socket",
        uri: "ssap://com.webos.service.networkinput/getPointerInputSocket",
        payload: PayloadSpec::None,
        validate: command::validate_return,
        transform: None,
        subscribable: false,
    },
];

/// On-screen keyboard input plus the low-latency pointer socket
pub struct InputControl {
    surface: CommandSurface,
}

impl InputControl {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self {
            surface: CommandSurface::new(connection, INPUT_COMMANDS),
        }
    }

    pub async fn insert_text(&self, text: &str) -> Result<()> {
        self.surface
            .exec("insert_text", Args::positional(vec![json!(text)]))
            .await
            .map(|_| ())
    }

    pub async fn delete_characters(&self, count: i64) -> Result<()> {
        self.surface
            .exec("delete_characters", Args::positional(vec![json!(count)]))
            .await
            .map(|_| ())
    }

    pub async fn send_enter(&self) -> Result<()> {
        self.surface
            .exec("send_enter", Args::none())
            .await
            .map(|_| ())
    }

    /// Open the secondary pointer/button socket
    ///
    /// Asks the TV for its input socket URL and connects there with the same
    /// TLS options as the main connection.
    pub async fn pointer(&self) -> Result<PointerSocket> {
        let payload = self
            .surface
            .exec_payload("get_pointer_socket", Args::none())
            .await?;
        let url = payload
            .get("socketPath")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebOsError::InvalidResponse("no socketPath in pointer response".to_string())
            })?;
        PointerSocket::connect(url, self.surface.connection.tls_connector()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribable_names(table: &'static [Command]) -> Vec<&'static str> {
        table
            .iter()
            .filter(|c| c.subscribable)
            .map(|c| c.name)
            .collect()
    }

    #[test]
    fn media_table_marks_subscribable_commands() {
        assert_eq!(
            subscribable_names(MEDIA_COMMANDS),
            vec!["get_volume", "get_mute", "get_audio_output"]
        );
        let set_volume = find_command(MEDIA_COMMANDS, "set_volume").unwrap();
        assert_eq!(set_volume.uri, "ssap://audio/setVolume");
        assert!(!set_volume.subscribable);
    }

    #[test]
    fn tables_resolve_expected_uris() {
        assert_eq!(
            find_command(SYSTEM_COMMANDS, "power_state").unwrap().uri,
            "ssap://com.webos.service.power/power/getPowerState"
        );
        assert_eq!(
            find_command(APPLICATION_COMMANDS, "list_launch_points")
                .unwrap()
                .uri,
            "ssap://com.webos.applicationManager/listLaunchPoints"
        );
        assert_eq!(
            find_command(TV_COMMANDS, "set_channel").unwrap().uri,
            "ssap://tv/openChannel"
        );
        assert_eq!(
            find_command(SOURCE_COMMANDS, "list_sources").unwrap().uri,
            "ssap://tv/getExternalInputList"
        );
        assert_eq!(
            find_command(INPUT_COMMANDS, "get_pointer_socket").unwrap().uri,
            "ssap://com.webos.service.networkinput/getPointerInputSocket"
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(
            find_command(MEDIA_COMMANDS, "does_not_exist"),
            Err(WebOsError::InvalidArgument(_))
        ));
    }
}
