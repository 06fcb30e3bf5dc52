//! JSON-RPC IPC worker for input injection.
//!
//! Reads line-delimited JSON requests from stdin, dispatches to a
//! `hwinput_core` sequencer, writes JSON responses to stdout.  Requests are
//! handled one at a time, so a client that funnels all injection through one
//! worker never interleaves two sequences.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::Parser;
use hwinput_core::{
    InjectionError, InputPlatform, MouseButton, Pacing, ScreenPoint, Sequencer, WheelDirection,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "hwinput-worker", about = "hwinput IPC worker process")]
struct Args {
    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize)]
struct Request {
    id: u64,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Serialize)]
struct Response {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChordParams {
    chord: String,
}

#[derive(Deserialize)]
struct KeysParams {
    keys: String,
}

#[derive(Deserialize)]
struct TypeParams {
    text: String,
    /// Pause every N characters; absent or 0 means never.
    #[serde(default)]
    every: usize,
    #[serde(default = "default_type_pause_ms")]
    pause_ms: u64,
}

fn default_type_pause_ms() -> u64 {
    10
}

#[derive(Deserialize)]
struct ClickParams {
    #[serde(flatten)]
    point: ScreenPoint,
    #[serde(default)]
    button: Option<MouseButton>,
    #[serde(default)]
    double: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Deserialize)]
struct ScrollParams {
    #[serde(flatten)]
    point: ScreenPoint,
    direction: ScrollDirection,
    #[serde(default = "default_notches")]
    notches: u32,
}

fn default_notches() -> u32 {
    1
}

#[derive(Deserialize)]
struct DragParams {
    from: ScreenPoint,
    to: ScreenPoint,
}

#[derive(Deserialize)]
struct KeyParams {
    key: String,
}

fn params<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, String> {
    T::deserialize(value).map_err(|e| format!("invalid params: {e}"))
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn err(e: InjectionError) -> String {
    e.to_string()
}

/// Run one request.  A `pacing` object in `params` overrides the worker's
/// pacing for this request only.
fn dispatch<P: InputPlatform>(
    seq: &mut Sequencer<P>,
    method: &str,
    value: &serde_json::Value,
) -> Result<serde_json::Value, String> {
    let saved = seq.pacing();
    if let Some(pacing) = value.get("pacing") {
        seq.set_pacing(params(pacing)?);
    }
    let result = dispatch_method(seq, method, value);
    seq.set_pacing(saved);
    result
}

fn dispatch_method<P: InputPlatform>(
    seq: &Sequencer<P>,
    method: &str,
    value: &serde_json::Value,
) -> Result<serde_json::Value, String> {
    match method {
        "ping" => Ok(serde_json::Value::String("pong".to_owned())),
        "send_chord" => {
            let p: ChordParams = params(value)?;
            seq.send_chord(&p.chord).map_err(err)?;
            Ok(serde_json::Value::Null)
        }
        "send_keys" => {
            let p: KeysParams = params(value)?;
            to_json(seq.send_keys(&p.keys).map_err(err)?)
        }
        "type_string" => {
            let p: TypeParams = params(value)?;
            if p.every == 0 {
                seq.type_string(&p.text).map_err(err)?;
            } else {
                seq.type_string_paced(&p.text, p.every, Duration::from_millis(p.pause_ms))
                    .map_err(err)?;
            }
            to_json(p.text.chars().count())
        }
        "move_to" => {
            let point: ScreenPoint = params(value)?;
            seq.move_to(point).map_err(err)?;
            Ok(serde_json::Value::Null)
        }
        "click" => {
            let p: ClickParams = params(value)?;
            match (p.button, p.double) {
                (Some(button), _) => seq.click_button(p.point, button),
                (None, true) => seq.double_click(p.point),
                (None, false) => seq.click(p.point),
            }
            .map_err(err)?;
            Ok(serde_json::Value::Null)
        }
        "scroll" => {
            let p: ScrollParams = params(value)?;
            let horizontal = i32::try_from(p.notches).unwrap_or(i32::MAX);
            match p.direction {
                ScrollDirection::Up => seq.scroll(p.point, WheelDirection::Forward, p.notches),
                ScrollDirection::Down => seq.scroll(p.point, WheelDirection::Backward, p.notches),
                ScrollDirection::Left => seq.scroll_horizontal(p.point, -horizontal),
                ScrollDirection::Right => seq.scroll_horizontal(p.point, horizontal),
            }
            .map_err(err)?;
            Ok(serde_json::Value::Null)
        }
        "drag" => {
            let p: DragParams = params(value)?;
            to_json(seq.drag(p.from, p.to).map_err(err)?)
        }
        "key_state" => {
            let p: KeyParams = params(value)?;
            to_json(seq.is_key_down(&p.key).map_err(err)?)
        }
        "release_modifiers" => to_json(seq.release_held_modifiers().map_err(err)?),
        _ => Err(format!("unknown method: {method}")),
    }
}

fn respond(stdout: &mut io::Stdout, resp: &Response) {
    if let Ok(json) = serde_json::to_string(resp) {
        let _ = writeln!(stdout, "{json}");
    } else {
        // Serialization failed -- send minimal error response.
        let _ = writeln!(
            stdout,
            r#"{{"id":{},"error":"response serialization failed"}}"#,
            resp.id
        );
    }
    let _ = stdout.flush();
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let mut seq = hwinput_core::native_sequencer(Pacing::default());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    log::info!("hwinput-worker: ready");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("hwinput-worker: stdin read error: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<Request>(&line) {
            Ok(req) => match dispatch(&mut seq, &req.method, &req.params) {
                Ok(result) => Response {
                    id: req.id,
                    result: Some(result),
                    error: None,
                },
                Err(error) => {
                    log::debug!("request {} ({}) failed: {error}", req.id, req.method);
                    Response {
                        id: req.id,
                        result: None,
                        error: Some(error),
                    }
                }
            },
            // Parse error -- use id=0 since we can't extract it.
            Err(e) => Response {
                id: 0,
                result: None,
                error: Some(format!("invalid JSON: {e}")),
            },
        };
        respond(&mut stdout, &resp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwinput_core::platform::fake::FakePlatform;
    use hwinput_core::record::MouseFlags;
    use serde_json::json;

    fn worker() -> Sequencer<FakePlatform> {
        Sequencer::with_pacing(FakePlatform::new(), Pacing::immediate())
    }

    #[test]
    fn test_ping() {
        let mut seq = worker();
        assert_eq!(dispatch(&mut seq, "ping", &json!(null)), Ok(json!("pong")));
    }

    #[test]
    fn test_unknown_method() {
        let mut seq = worker();
        let err = dispatch(&mut seq, "format_disk", &json!({})).unwrap_err();
        assert!(err.contains("unknown method"));
    }

    #[test]
    fn test_send_chord() {
        let mut seq = worker();
        dispatch(&mut seq, "send_chord", &json!({"chord": "ctrl+c"})).unwrap();
        assert_eq!(seq.platform().keyboard_records().len(), 4);
    }

    #[test]
    fn test_bad_chord_reports_parse_error() {
        let mut seq = worker();
        let err = dispatch(&mut seq, "send_chord", &json!({"chord": "ctrl+?!x"})).unwrap_err();
        assert!(err.contains("?!x"), "{err}");
        assert_eq!(seq.platform().submission_attempts(), 0);
    }

    #[test]
    fn test_send_keys_returns_record_count() {
        let mut seq = worker();
        let out = dispatch(&mut seq, "send_keys", &json!({"keys": "+{TAB}"})).unwrap();
        assert_eq!(out, json!(4));
        assert_eq!(seq.platform().keyboard_records().len(), 4);
    }

    #[test]
    fn test_send_keys_unclosed_brace() {
        let mut seq = worker();
        let err = dispatch(&mut seq, "send_keys", &json!({"keys": "{ENTER"})).unwrap_err();
        assert!(err.contains("unclosed"), "{err}");
        assert_eq!(seq.platform().submission_attempts(), 0);
    }

    #[test]
    fn test_missing_params_rejected() {
        let mut seq = worker();
        let err = dispatch(&mut seq, "click", &json!({"x": 1})).unwrap_err();
        assert!(err.starts_with("invalid params"));
    }

    #[test]
    fn test_type_string_paced() {
        let mut seq = worker();
        let out = dispatch(
            &mut seq,
            "type_string",
            &json!({"text": "abcdef", "every": 2, "pause_ms": 3}),
        )
        .unwrap();
        assert_eq!(out, json!(6));
        assert_eq!(seq.platform().pauses(), vec![Duration::from_millis(3); 2]);
    }

    #[test]
    fn test_click_with_button() {
        let mut seq = worker();
        dispatch(&mut seq, "click", &json!({"x": 3, "y": 4, "button": "right"})).unwrap();
        let mice = seq.platform().mouse_records();
        assert!(mice[1].flags.contains(MouseFlags::RIGHT_DOWN));
    }

    #[test]
    fn test_drag_returns_steps() {
        let mut seq = worker();
        let out = dispatch(
            &mut seq,
            "drag",
            &json!({"from": {"x": 0, "y": 0}, "to": {"x": 4, "y": 2}}),
        )
        .unwrap();
        assert_eq!(out, json!(4));
    }

    #[test]
    fn test_request_pacing_is_temporary() {
        let mut seq = worker();
        dispatch(
            &mut seq,
            "send_chord",
            &json!({"chord": "a", "pacing": {"key_delay_ms": 7}}),
        )
        .unwrap();
        assert_eq!(seq.platform().pauses(), vec![Duration::from_millis(7); 2]);
        assert_eq!(seq.pacing(), Pacing::immediate());
    }

    #[test]
    fn test_key_state_and_release() {
        let mut seq = worker();
        seq.platform().set_key_state(hwinput_core::keys::vk::LSHIFT, i16::MIN);
        assert_eq!(
            dispatch(&mut seq, "key_state", &json!({"key": "shift"})),
            Ok(json!(true))
        );
        assert_eq!(
            dispatch(&mut seq, "release_modifiers", &json!({})),
            Ok(json!(1))
        );
    }
}
