use crate::remote::RemoteError;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

///
/// Envelope
///
/// Response wrapper shared by every open-API endpoint:
/// `{"code": 0, "msg": "success", "data": {...}}`. Failures carry a non-zero
/// `code`, an `error` object, or both.
///

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,

    #[serde(default)]
    msg: String,

    #[serde(default)]
    data: JsonValue,

    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Unwrap an envelope into its `data` payload.
///
/// Returns `Ok(None)` for a successful response without data.
pub fn decode_envelope<T: DeserializeOwned>(body: JsonValue) -> Result<Option<T>, RemoteError> {
    decode_envelope_with_msg(body).map(|(_, data)| data)
}

/// Like `decode_envelope`, but also returns the envelope's `msg`, which some
/// endpoints fill even on a success code.
pub fn decode_envelope_with_msg<T: DeserializeOwned>(
    body: JsonValue,
) -> Result<(String, Option<T>), RemoteError> {
    let envelope: Envelope =
        serde_json::from_value(body).map_err(|err| RemoteError::Decode {
            message: err.to_string(),
        })?;

    if let Some(error) = envelope.error {
        let message = error
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback_message(&envelope.msg));

        return Err(RemoteError::Envelope {
            code: (envelope.code != 0).then_some(envelope.code),
            message,
        });
    }

    if envelope.code != 0 {
        return Err(RemoteError::Envelope {
            code: Some(envelope.code),
            message: fallback_message(&envelope.msg),
        });
    }

    if envelope.data.is_null() {
        return Ok((envelope.msg, None));
    }

    serde_json::from_value(envelope.data)
        .map(|data| (envelope.msg, Some(data)))
        .map_err(|err| RemoteError::Decode {
            message: err.to_string(),
        })
}

fn fallback_message(msg: &str) -> String {
    if msg.is_empty() {
        "remote request failed".to_string()
    } else {
        msg.to_string()
    }
}
