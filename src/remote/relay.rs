//! Translation of the web control board's relay requests (`POST <route>` with
//! a `{ "data": ... }` JSON body) into OSC messages for the audio engine.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::general::endpoint::{validate, Endpoint};
use crate::general::spatial::AMBISONIC_PREFIX;
use crate::remote::message::MessageEnvelope;
use crate::remote::osc_sender::{OscRelay, SendOutcome, STOP_ALL_ADDRESS};

pub const WEB_HELLO: &str = "Hello from control board (web)!";

#[derive(Debug, Deserialize)]
struct RelayBody {
    #[serde(default)]
    data: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RelayAction {
    /// Point the relay at a new destination, then greet it.
    Configure(Endpoint),
    Send(MessageEnvelope),
    Ignore,
}

pub fn translate(route: &str, body: &str) -> Result<RelayAction> {
    let body: RelayBody = serde_json::from_str(body)
        .map_err(|e| BridgeError::relay_body(route, e.to_string()))?;
    let data = &body.data;

    let action = match route.trim_start_matches('/') {
        "ipSC" => {
            let ip = data
                .get(0)
                .and_then(Value::as_str)
                .ok_or_else(|| BridgeError::relay_body(route, "expected [ip, port]"))?;
            let port = match data.get(1) {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => return Err(BridgeError::relay_body(route, "expected [ip, port]")),
            };
            RelayAction::Configure(validate(&format!("{}:{}", ip, port))?)
        }
        "freeSC" => RelayAction::Send(MessageEnvelope::new(STOP_ALL_ADDRESS)),
        "slider" => {
            let v = int_at(route, data.get(0))?;
            RelayAction::Send(MessageEnvelope::new("/x").int(v))
        }
        "midi" => {
            let note = int_at(route, Some(data))?;
            RelayAction::Send(MessageEnvelope::new("/midi").int(note))
        }
        "ambisonic" => ambisonic(route, data)?,
        _ => return Err(BridgeError::UnknownRoute(route.to_string())),
    };
    debug!("relay {} -> {:?}", route, action);
    Ok(action)
}

/// `[id]` means the element left the zone, `[id, distance, azimuth]` carries
/// its polar position. The address uses the last character of the element id.
fn ambisonic(route: &str, data: &Value) -> Result<RelayAction> {
    let items = data
        .as_array()
        .ok_or_else(|| BridgeError::relay_body(route, "expected an array"))?;
    let Some(first) = items.first() else {
        return Ok(RelayAction::Ignore);
    };

    let id = match first {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(BridgeError::relay_body(route, "element id must be a string")),
    };
    let suffix = id
        .chars()
        .last()
        .ok_or_else(|| BridgeError::relay_body(route, "empty element id"))?;
    let envelope = MessageEnvelope::new(format!("{}{}", AMBISONIC_PREFIX, suffix));

    match items.len() {
        1 => Ok(RelayAction::Send(envelope)),
        3 => {
            let distance = float_at(route, items.get(1))?;
            let azimuth = float_at(route, items.get(2))?;
            Ok(RelayAction::Send(envelope.vec2(distance, azimuth)))
        }
        // Anything else is forwarded bare, like an exit.
        _ => Ok(RelayAction::Send(envelope)),
    }
}

fn int_at(route: &str, value: Option<&Value>) -> Result<i32> {
    value
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| BridgeError::relay_body(route, "expected an integer"))
}

fn float_at(route: &str, value: Option<&Value>) -> Result<f32> {
    value
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .ok_or_else(|| BridgeError::relay_body(route, "expected a number"))
}

/// Apply a translated action to the audio relay. `None` when the action had
/// nothing to send.
pub fn forward(
    relay: &mut OscRelay,
    action: &RelayAction,
    hello: &str,
) -> Result<Option<SendOutcome>> {
    match action {
        RelayAction::Configure(endpoint) => {
            relay.set_endpoint(*endpoint)?;
            relay.send_hello(hello).map(Some)
        }
        RelayAction::Send(envelope) => relay.send(envelope).map(Some),
        RelayAction::Ignore => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::message::OscArg;

    fn envelope(action: RelayAction) -> MessageEnvelope {
        match action {
            RelayAction::Send(env) => env,
            other => panic!("expected send, got {:?}", other),
        }
    }

    #[test]
    fn test_ip_route_configures_endpoint() {
        let action = translate("/ipSC", r#"{"data": ["127.0.0.1", 57120]}"#).unwrap();
        assert_eq!(
            action,
            RelayAction::Configure(validate("127.0.0.1:57120").unwrap())
        );
        let action = translate("/ipSC", r#"{"data": ["127.0.0.1", "57120"]}"#).unwrap();
        assert!(matches!(action, RelayAction::Configure(_)));
    }

    #[test]
    fn test_ip_route_rejects_bad_endpoint() {
        let err = translate("/ipSC", r#"{"data": ["300.0.0.1", 57120]}"#).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_free_route_is_bare_stop_all() {
        let env = envelope(translate("/freeSC", "{}").unwrap());
        assert_eq!(env.address, "/stopAll");
        assert!(env.args.is_empty());
    }

    #[test]
    fn test_slider_and_midi_are_ints() {
        let env = envelope(translate("/slider", r#"{"data": [42]}"#).unwrap());
        assert_eq!(env.address, "/x");
        assert_eq!(env.args, vec![OscArg::Int(42)]);

        let env = envelope(translate("/midi", r#"{"data": 60}"#).unwrap());
        assert_eq!(env.address, "/midi");
        assert_eq!(env.args, vec![OscArg::Int(60)]);
    }

    #[test]
    fn test_ambisonic_inside_and_exit() {
        let env = envelope(
            translate("/ambisonic", r#"{"data": ["sound2", 0.25, -1.5]}"#).unwrap(),
        );
        assert_eq!(env.address, "/ambisonic2");
        assert_eq!(env.args, vec![OscArg::Float(0.25), OscArg::Float(-1.5)]);

        let env = envelope(translate("/ambisonic", r#"{"data": ["sound1"]}"#).unwrap());
        assert_eq!(env.address, "/ambisonic1");
        assert!(env.args.is_empty());

        assert_eq!(
            translate("/ambisonic", r#"{"data": []}"#).unwrap(),
            RelayAction::Ignore
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            translate("/nope", "{}"),
            Err(BridgeError::UnknownRoute(_))
        ));
        assert!(matches!(
            translate("/midi", r#"{"data": "c4"}"#),
            Err(BridgeError::InvalidRelayBody { .. })
        ));
        assert!(matches!(
            translate("/midi", "not json"),
            Err(BridgeError::InvalidRelayBody { .. })
        ));
    }

    #[test]
    fn test_forward_unconfigured_is_noop() {
        let mut relay = OscRelay::new(crate::remote::osc_sender::Peer::Audio);
        let action = translate("/midi", r#"{"data": 55}"#).unwrap();
        assert_eq!(
            forward(&mut relay, &action, WEB_HELLO).unwrap(),
            Some(SendOutcome::Unconfigured)
        );
    }

    #[test]
    fn test_forward_ignore_sends_nothing() {
        let mut relay = OscRelay::new(crate::remote::osc_sender::Peer::Audio);
        let action = translate("/ambisonic", r#"{"data": []}"#).unwrap();
        assert_eq!(forward(&mut relay, &action, WEB_HELLO).unwrap(), None);
    }
}
