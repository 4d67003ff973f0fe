use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Message types carried in the `type` field of an SSAP envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Register,
    Request,
    Subscribe,
    Unsubscribe,
    Response,
    Registered,
    Error,
    /// Anything the TV sends that this library does not model
    #[serde(other)]
    Unknown,
}

/// One SSAP frame, outbound or inbound
///
/// Outbound frames always carry an `id`; inbound frames are matched back to
/// pending requests and subscriptions by that same `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Build an outbound frame
    pub fn outbound(id: String, kind: MessageKind, uri: Option<&str>, payload: Option<Value>) -> Self {
        Self {
            id: Some(id),
            kind,
            uri: uri.map(|u| u.to_string()),
            payload,
            error: None,
        }
    }

    /// The TV's error text, falling back to a generic message
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Unknown communication error".to_string())
    }
}

// The registration signature is static data the TV expects verbatim; it is
// not derived from anything.
const SIGNATURE: &str = concat!(
    "eyJhbGdvcml0aG0iOiJSU0EtU0hBMjU2Iiwia2V5SWQiOiJ0ZXN0LXNpZ25pbm",
    "ctY2VydCIsInNpZ25hdHVyZVZlcnNpb24iOjF9.hrVRgjCwXVvE2OOSpDZ58hR",
    "+59aFNwYDyjQgKk3auukd7pcegmE2CzPCa0bJ0ZsRAcKkCTJrWo5iDzNhMBWRy",
    "aMOv5zWSrthlf7G128qvIlpMT0YNY+n/FaOHE73uLrS/g7swl3/qH/BGFG2Hu4",
    "RlL48eb3lLKqTt2xKHdCs6Cd4RMfJPYnzgvI4BNrFUKsjkcu+WD4OO2A27Pq1n",
    "50cMchmcaXadJhGrOqH5YmHdOCj5NSHzJYrsW0HPlpuAx/ECMeIZYDh6RMqaFM",
    "2DXzdKX9NmmyqzJ3o/0lkk/N97gfVRLW5hA29yeAwaCViZNCP8iC9aO0q9fQoj",
    "oa7NQnAtw==",
);

/// Build the pairing payload sent with a `register` frame
///
/// The manifest declares the requesting application and the permissions it
/// wants; the TV shows the pairing prompt against it. A `client_key` from a
/// previous pairing is forwarded so the TV can skip the prompt.
pub fn registration_payload(client_key: Option<&str>) -> Value {
    let mut payload = json!({
        "forcePairing": false,
        "pairingType": "PROMPT",
        "manifest": {
            "appVersion": "1.1",
            "manifestVersion": 1,
            "permissions": [
                "LAUNCH",
                "LAUNCH_WEBAPP",
                "APP_TO_APP",
                "CLOSE",
                "TEST_OPEN",
                "TEST_PROTECTED",
                "CONTROL_AUDIO",
                "CONTROL_DISPLAY",
                "CONTROL_INPUT_JOYSTICK",
                "CONTROL_INPUT_MEDIA_RECORDING",
                "CONTROL_INPUT_MEDIA_PLAYBACK",
                "CONTROL_INPUT_TV",
                "CONTROL_POWER",
                "READ_APP_STATUS",
                "READ_CURRENT_CHANNEL",
                "READ_INPUT_DEVICE_LIST",
                "READ_NETWORK_STATE",
                "READ_RUNNING_APPS",
                "READ_TV_CHANNEL_LIST",
                "WRITE_NOTIFICATION_TOAST",
                "READ_POWER_STATE",
                "READ_COUNTRY_INFO",
                "READ_SETTINGS",
                "CONTROL_TV_SCREEN",
                "CONTROL_TV_STANBY",
                "CONTROL_FAVORITE_GROUP",
                "CONTROL_USER_INFO",
                "CHECK_BLUETOOTH_DEVICE",
                "CONTROL_BLUETOOTH",
                "CONTROL_TIMER_INFO",
                "STB_INTERNAL_CONNECTION",
                "CONTROL_RECORDING",
                "READ_RECORDING_STATE",
                "WRITE_RECORDING_LIST",
                "READ_RECORDING_LIST",
                "READ_RECORDING_SCHEDULE",
                "WRITE_RECORDING_SCHEDULE",
                "READ_STORAGE_DEVICE_LIST",
                "READ_TV_PROGRAM_INFO",
                "CONTROL_BOX_CHANNEL",
                "READ_TV_ACR_AUTH_TOKEN",
                "READ_TV_CONTENT_STATE",
                "READ_TV_CURRENT_TIME",
                "ADD_LAUNCHER_CHANNEL",
                "SET_CHANNEL_SKIP",
                "RELEASE_CHANNEL_SKIP",
                "CONTROL_CHANNEL_BLOCK",
                "DELETE_SELECT_CHANNEL",
                "CONTROL_CHANNEL_GROUP",
                "SCAN_TV_CHANNELS",
                "CONTROL_TV_POWER",
                "CONTROL_WOL"
            ],
            "signatures": [
                {
                    "signature": SIGNATURE,
                    "signatureVersion": 1
                }
            ],
            "signed": {
                "appId": "com.lge.test",
                "created": "20140509",
                "localizedAppNames": {
                    "": "LG Remote App",
                    "ko-KR": "리모컨 앱",
                    "zxx-XX": "ЛГ Rэмotэ AПП"
                },
                "localizedVendorNames": {
                    "": "LG Electronics"
                },
                "permissions": [
                    "TEST_SECURE",
                    "CONTROL_INPUT_TEXT",
                    "CONTROL_MOUSE_AND_KEYBOARD",
                    "READ_INSTALLED_APPS",
                    "READ_LGE_SDX",
                    "READ_NOTIFICATIONS",
                    "SEARCH",
                    "WRITE_SETTINGS",
                    "WRITE_NOTIFICATION_ALERT",
                    "CONTROL_POWER",
                    "READ_CURRENT_CHANNEL",
                    "READ_RUNNING_APPS",
                    "READ_UPDATE_INFO",
                    "UPDATE_FROM_REMOTE_APP",
                    "READ_LGE_TV_INPUT_EVENTS",
                    "READ_TV_CURRENT_TIME"
                ],
                "serial": "2f930e2d2cfe083771f68e4fe7bb07",
                "vendorId": "com.lge"
            }
        }
    });

    if let Some(key) = client_key {
        payload["client-key"] = Value::String(key.to_string());
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_request_serializes_expected_fields() {
        let env = Envelope::outbound(
            "1".to_string(),
            MessageKind::Request,
            Some("ssap://audio/setVolume"),
            Some(json!({"volume": 42})),
        );

        let text = serde_json::to_string(&env).unwrap();
        let round: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(round["id"], "1");
        assert_eq!(round["type"], "request");
        assert_eq!(round["uri"], "ssap://audio/setVolume");
        assert_eq!(round["payload"]["volume"], 42);
        assert!(round.get("error").is_none());
    }

    #[test]
    fn register_frame_omits_uri() {
        let env = Envelope::outbound(
            "1".to_string(),
            MessageKind::Register,
            None,
            Some(registration_payload(None)),
        );
        let round: Value = serde_json::from_str(&serde_json::to_string(&env).unwrap()).unwrap();
        assert_eq!(round["type"], "register");
        assert!(round.get("uri").is_none());
    }

    #[test]
    fn inbound_unknown_type_parses() {
        let env: Envelope =
            serde_json::from_str(r#"{"id":"9","type":"hello","payload":{}}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Unknown);
        assert_eq!(env.id.as_deref(), Some("9"));
    }

    #[test]
    fn registration_payload_forwards_stored_key() {
        let fresh = registration_payload(None);
        assert!(fresh.get("client-key").is_none());
        assert_eq!(fresh["pairingType"], "PROMPT");

        let reused = registration_payload(Some("abc123"));
        assert_eq!(reused["client-key"], "abc123");
        assert_eq!(reused["manifest"]["signed"]["appId"], "com.lge.test");
    }
}
