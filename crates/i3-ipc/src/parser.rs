//! Decoding of i3 JSON payloads into typed values
//!
//! Two entry points: [`parse_reply`] for replies to requests and
//! [`parse_event`] for events. Both apply the same field rules:
//!
//! - Optional fields are `None` when the key is missing or `null`.
//! - Required fields that are missing or have the wrong JSON type are
//!   `I3Error::BadMessage`.
//! - Fields with a closed set of values yield `I3Error::Unsupported` naming
//!   the field and the literal when i3 sends something new.
//! - Negative numbers in otherwise unsigned fields mean "unset". For border
//!   widths zero means "unset" as well.

use serde_json::{Map, Value};

use crate::error::I3Error;
use crate::events::{Event, EventCategory};
use crate::message::MessageType;
use crate::types::{
    BarColors, BarConfig, BindingEvent, BindingInfo, FullscreenMode, ModeEvent, Node, Output,
    OutputEvent, Rect, ShutdownEvent, TickEvent, Version, WindowEvent, WindowProperties,
    WireEnum, Workspace, WorkspaceEvent,
};

type Object = Map<String, Value>;

/// Typed reply to a request
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Every command was accepted
    Command,
    Workspaces(Vec<Workspace>),
    /// The subscription was accepted
    Subscribed,
    Outputs(Vec<Output>),
    Tree(Node),
    Marks(Vec<String>),
    BarIds(Vec<String>),
    BarConfig(BarConfig),
    Version(Version),
    BindingModes(Vec<String>),
    Config(String),
    /// The tick was broadcast
    Tick,
    /// The sync message will be sent
    Sync,
}

impl Reply {
    /// Short name of the reply kind, for messages
    pub fn name(&self) -> &'static str {
        match self {
            Reply::Command => "command",
            Reply::Workspaces(_) => "workspaces",
            Reply::Subscribed => "subscribe",
            Reply::Outputs(_) => "outputs",
            Reply::Tree(_) => "tree",
            Reply::Marks(_) => "marks",
            Reply::BarIds(_) => "bar ids",
            Reply::BarConfig(_) => "bar config",
            Reply::Version(_) => "version",
            Reply::BindingModes(_) => "binding modes",
            Reply::Config(_) => "config",
            Reply::Tick => "tick",
            Reply::Sync => "sync",
        }
    }
}

/// Decode the reply to a request of type `message_type`
///
/// # Errors
///
/// Returns `I3Error::InvalidArgument` when the reply says i3 declined the
/// request, plus the decoding errors described in the module docs.
pub fn parse_reply(message_type: MessageType, payload: &[u8]) -> Result<Reply, I3Error> {
    let json = parse_json(payload)?;

    let reply = match message_type {
        MessageType::RunCommand => {
            check_command_outcomes(&json)?;
            Reply::Command
        }
        MessageType::GetWorkspaces => Reply::Workspaces(
            as_array(&json, "workspaces reply")?
                .iter()
                .map(parse_workspace)
                .collect::<Result<_, _>>()?,
        ),
        MessageType::Subscribe => {
            check_success(&json, "i3 declined subscription!")?;
            Reply::Subscribed
        }
        MessageType::GetOutputs => Reply::Outputs(
            as_array(&json, "outputs reply")?
                .iter()
                .map(parse_output)
                .collect::<Result<_, _>>()?,
        ),
        MessageType::GetTree => Reply::Tree(parse_node(&json)?),
        MessageType::GetMarks => Reply::Marks(string_array(&json, "marks reply")?),
        MessageType::GetBarConfig => match &json {
            Value::Array(_) => Reply::BarIds(string_array(&json, "bar ids reply")?),
            _ => {
                let object = as_object(&json, "bar config reply")?;
                if optional(object, "id").is_none() {
                    return Err(I3Error::invalid_argument(
                        "i3 didn't recognize requested bar ID!",
                    ));
                }
                Reply::BarConfig(parse_bar_config(&json)?)
            }
        },
        MessageType::GetVersion => Reply::Version(parse_version(&json)?),
        MessageType::GetBindingModes => {
            Reply::BindingModes(string_array(&json, "binding modes reply")?)
        }
        MessageType::GetConfig => {
            Reply::Config(str_field(as_object(&json, "config reply")?, "config")?)
        }
        MessageType::SendTick => {
            check_success(&json, "Sending TICK failed")?;
            Reply::Tick
        }
        MessageType::Sync => {
            check_success(&json, "Sending SYNC failed")?;
            Reply::Sync
        }
        MessageType::Event(category) => {
            return Err(I3Error::bad_message(format!(
                "\"{}\" event is not a reply",
                category
            )))
        }
    };

    Ok(reply)
}

/// Decode an event payload of the given category
pub fn parse_event(category: EventCategory, payload: &[u8]) -> Result<Event, I3Error> {
    let json = parse_json(payload)?;
    let object = as_object(&json, "event")?;

    let event = match category {
        EventCategory::Workspace => Event::Workspace(WorkspaceEvent {
            change: enum_field(object, "change")?,
            old: optional(object, "old").map(parse_node).transpose()?,
            current: optional(object, "current").map(parse_node).transpose()?,
        }),
        EventCategory::Output => Event::Output(OutputEvent {
            change: enum_field(object, "change")?,
        }),
        EventCategory::Mode => Event::Mode(ModeEvent {
            change: str_field(object, "change")?,
            pango_markup: bool_field(object, "pango_markup")?,
        }),
        EventCategory::Window => Event::Window(WindowEvent {
            change: enum_field(object, "change")?,
            container: parse_node(field(object, "container")?)?,
        }),
        EventCategory::BarConfigUpdate => Event::BarConfigUpdate(parse_bar_config(&json)?),
        EventCategory::Binding => Event::Binding(BindingEvent {
            change: enum_field(object, "change")?,
            binding: parse_binding(field(object, "binding")?)?,
        }),
        EventCategory::Shutdown => Event::Shutdown(ShutdownEvent {
            change: enum_field(object, "change")?,
        }),
        EventCategory::Tick => Event::Tick(TickEvent {
            first: bool_field(object, "first")?,
            payload: opt_str_field(object, "payload")?,
        }),
    };

    Ok(event)
}

/// Decode a container and, recursively, all of its children
pub fn parse_node(value: &Value) -> Result<Node, I3Error> {
    let object = as_object(value, "node")?;

    let fullscreen_code = u64_field(object, "fullscreen_mode")?;
    let fullscreen_mode = FullscreenMode::from_code(fullscreen_code)
        .ok_or_else(|| I3Error::unsupported("fullscreen_mode", fullscreen_code.to_string()))?;

    let focus = as_array(field(object, "focus")?, "focus")?
        .iter()
        .map(|id| {
            id.as_u64()
                .ok_or_else(|| I3Error::bad_message(format!("Invalid focus id: {}", id)))
        })
        .collect::<Result<_, _>>()?;

    // Absent or malformed marks are treated as no marks
    let marks = match object.get("marks") {
        Some(marks @ Value::Array(_)) => string_array(marks, "marks")?,
        _ => Vec::new(),
    };

    Ok(Node {
        id: u64_field(object, "id")?,
        name: opt_str_field(object, "name")?,
        node_type: enum_field(object, "type")?,
        border: enum_field(object, "border")?,
        current_border_width: positive_or_unset(object, "current_border_width")?,
        layout: enum_field(object, "layout")?,
        percent: opt_f64_field(object, "percent")?,
        rect: rect_field(object, "rect")?,
        window_rect: rect_field(object, "window_rect")?,
        deco_rect: rect_field(object, "deco_rect")?,
        geometry: rect_field(object, "geometry")?,
        window: opt_u64_field(object, "window")?,
        window_properties: optional(object, "window_properties")
            .map(parse_window_properties)
            .transpose()?,
        urgent: bool_field(object, "urgent")?,
        focused: bool_field(object, "focused")?,
        focus,
        fullscreen_mode,
        marks,
        nodes: child_nodes(object, "nodes")?,
        floating_nodes: child_nodes(object, "floating_nodes")?,
    })
}

fn child_nodes(object: &Object, key: &str) -> Result<Vec<Node>, I3Error> {
    match object.get(key) {
        Some(Value::Array(children)) => children.iter().map(parse_node).collect(),
        Some(_) => Err(I3Error::bad_message(format!(
            "Node field \"{}\" is not an array",
            key
        ))),
        None => Err(I3Error::bad_message(format!(
            "Node is missing the \"{}\" array",
            key
        ))),
    }
}

fn parse_window_properties(value: &Value) -> Result<WindowProperties, I3Error> {
    let object = as_object(value, "window_properties")?;

    Ok(WindowProperties {
        class: opt_str_field(object, "class")?,
        instance: opt_str_field(object, "instance")?,
        window_role: opt_str_field(object, "window_role")?,
        title: opt_str_field(object, "title")?,
        transient_for: opt_u64_field(object, "transient_for")?,
    })
}

fn parse_workspace(value: &Value) -> Result<Workspace, I3Error> {
    let object = as_object(value, "workspace")?;

    Ok(Workspace {
        num: unsigned_or_unset(object, "num")?,
        name: str_field(object, "name")?,
        visible: bool_field(object, "visible")?,
        focused: bool_field(object, "focused")?,
        urgent: bool_field(object, "urgent")?,
        rect: rect_field(object, "rect")?,
        output: str_field(object, "output")?,
    })
}

fn parse_output(value: &Value) -> Result<Output, I3Error> {
    let object = as_object(value, "output")?;

    Ok(Output {
        name: str_field(object, "name")?,
        active: bool_field(object, "active")?,
        primary: bool_field(object, "primary")?,
        current_workspace: opt_str_field(object, "current_workspace")?,
        rect: rect_field(object, "rect")?,
    })
}

fn parse_bar_config(value: &Value) -> Result<BarConfig, I3Error> {
    let object = as_object(value, "bar config")?;

    let colors = match optional(object, "colors") {
        Some(colors) => parse_bar_colors(as_object(colors, "colors")?)?,
        None => BarColors::default(),
    };

    Ok(BarConfig {
        id: str_field(object, "id")?,
        mode: enum_field(object, "mode")?,
        position: enum_field(object, "position")?,
        status_command: str_field(object, "status_command")?,
        font: str_field(object, "font")?,
        workspace_buttons: bool_field(object, "workspace_buttons")?,
        binding_mode_indicator: bool_field(object, "binding_mode_indicator")?,
        verbose: bool_field(object, "verbose")?,
        colors,
    })
}

fn parse_bar_colors(object: &Object) -> Result<BarColors, I3Error> {
    Ok(BarColors {
        background: opt_str_field(object, "background")?,
        focused_background: opt_str_field(object, "focused_background")?,
        statusline: opt_str_field(object, "statusline")?,
        focused_statusline: opt_str_field(object, "focused_statusline")?,
        separator: opt_str_field(object, "separator")?,
        focused_separator: opt_str_field(object, "focused_separator")?,
        focused_workspace_text: opt_str_field(object, "focused_workspace_text")?,
        focused_workspace_bg: opt_str_field(object, "focused_workspace_bg")?,
        focused_workspace_border: opt_str_field(object, "focused_workspace_border")?,
        active_workspace_text: opt_str_field(object, "active_workspace_text")?,
        active_workspace_bg: opt_str_field(object, "active_workspace_bg")?,
        active_workspace_border: opt_str_field(object, "active_workspace_border")?,
        inactive_workspace_text: opt_str_field(object, "inactive_workspace_text")?,
        inactive_workspace_bg: opt_str_field(object, "inactive_workspace_bg")?,
        inactive_workspace_border: opt_str_field(object, "inactive_workspace_border")?,
        urgent_workspace_text: opt_str_field(object, "urgent_workspace_text")?,
        urgent_workspace_bg: opt_str_field(object, "urgent_workspace_bg")?,
        urgent_workspace_border: opt_str_field(object, "urgent_workspace_border")?,
        binding_mode_text: opt_str_field(object, "binding_mode_text")?,
        binding_mode_bg: opt_str_field(object, "binding_mode_bg")?,
        binding_mode_border: opt_str_field(object, "binding_mode_border")?,
    })
}

fn parse_version(value: &Value) -> Result<Version, I3Error> {
    let object = as_object(value, "version reply")?;

    Ok(Version {
        major: u32_field(object, "major")?,
        minor: u32_field(object, "minor")?,
        patch: u32_field(object, "patch")?,
        human_readable: str_field(object, "human_readable")?,
        loaded_config_file_name: str_field(object, "loaded_config_file_name")?,
    })
}

fn parse_binding(value: &Value) -> Result<BindingInfo, I3Error> {
    let object = as_object(value, "binding")?;

    Ok(BindingInfo {
        command: str_field(object, "command")?,
        event_state_mask: string_array(field(object, "event_state_mask")?, "event_state_mask")?,
        input_code: opt_u64_field(object, "input_code")?
            .map(|code| narrow(code, "input_code"))
            .transpose()?,
        symbol: opt_str_field(object, "symbol")?,
        input_type: enum_field(object, "input_type")?,
    })
}

/// Turn the first declined command into `InvalidArgument`
///
/// The message carries everything i3 reported: whether it was a parse error,
/// the offending input, the position marker and the error text.
fn check_command_outcomes(json: &Value) -> Result<(), I3Error> {
    for outcome in as_array(json, "command reply")? {
        let outcome = as_object(outcome, "command outcome")?;
        if bool_field(outcome, "success")? {
            continue;
        }

        let mut message = String::new();
        if opt_bool_field(outcome, "parse_error")?.unwrap_or(false) {
            message.push_str("Parsing error!\n");
        }
        if let Some(input) = opt_str_field(outcome, "input")? {
            message.push_str(&input);
            message.push('\n');
        }
        if let Some(position) = opt_str_field(outcome, "errorposition")? {
            message.push_str(&position);
            message.push('\n');
        }
        message.push_str(
            opt_str_field(outcome, "error")?
                .as_deref()
                .unwrap_or("i3 declined the command"),
        );

        return Err(I3Error::invalid_argument(message));
    }

    Ok(())
}

fn check_success(json: &Value, declined: &str) -> Result<(), I3Error> {
    if bool_field(as_object(json, "reply")?, "success")? {
        Ok(())
    } else {
        Err(I3Error::invalid_argument(declined))
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn parse_json(payload: &[u8]) -> Result<Value, I3Error> {
    serde_json::from_slice(payload).map_err(I3Error::MalformedPayload)
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Object, I3Error> {
    value
        .as_object()
        .ok_or_else(|| I3Error::bad_message(format!("Expected {} to be a JSON object", what)))
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, I3Error> {
    value
        .as_array()
        .ok_or_else(|| I3Error::bad_message(format!("Expected {} to be a JSON array", what)))
}

/// Required field, `null` counts as missing
fn field<'a>(object: &'a Object, key: &str) -> Result<&'a Value, I3Error> {
    optional(object, key)
        .ok_or_else(|| I3Error::bad_message(format!("Missing required field \"{}\"", key)))
}

/// Optional field, `None` when missing or `null`
fn optional<'a>(object: &'a Object, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn wrong_type(key: &str, expected: &str, value: &Value) -> I3Error {
    I3Error::bad_message(format!(
        "Field \"{}\" should be {}, got {}",
        key, expected, value
    ))
}

fn str_field(object: &Object, key: &str) -> Result<String, I3Error> {
    let value = field(object, key)?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| wrong_type(key, "a string", value))
}

fn opt_str_field(object: &Object, key: &str) -> Result<Option<String>, I3Error> {
    optional(object, key)
        .map(|value| {
            value
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| wrong_type(key, "a string", value))
        })
        .transpose()
}

fn bool_field(object: &Object, key: &str) -> Result<bool, I3Error> {
    let value = field(object, key)?;
    value
        .as_bool()
        .ok_or_else(|| wrong_type(key, "a boolean", value))
}

fn opt_bool_field(object: &Object, key: &str) -> Result<Option<bool>, I3Error> {
    optional(object, key)
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| wrong_type(key, "a boolean", value))
        })
        .transpose()
}

fn u64_field(object: &Object, key: &str) -> Result<u64, I3Error> {
    let value = field(object, key)?;
    value
        .as_u64()
        .ok_or_else(|| wrong_type(key, "an unsigned integer", value))
}

fn opt_u64_field(object: &Object, key: &str) -> Result<Option<u64>, I3Error> {
    optional(object, key)
        .map(|value| {
            value
                .as_u64()
                .ok_or_else(|| wrong_type(key, "an unsigned integer", value))
        })
        .transpose()
}

fn u32_field(object: &Object, key: &str) -> Result<u32, I3Error> {
    narrow(u64_field(object, key)?, key)
}

fn opt_f64_field(object: &Object, key: &str) -> Result<Option<f64>, I3Error> {
    optional(object, key)
        .map(|value| {
            value
                .as_f64()
                .ok_or_else(|| wrong_type(key, "a number", value))
        })
        .transpose()
}

/// Unsigned field where i3 uses a negative value for "not set"
fn unsigned_or_unset(object: &Object, key: &str) -> Result<Option<u32>, I3Error> {
    let Some(value) = optional(object, key) else {
        return Ok(None);
    };

    let number = value
        .as_i64()
        .ok_or_else(|| wrong_type(key, "an integer", value))?;
    if number < 0 {
        return Ok(None);
    }
    narrow(number as u64, key).map(Some)
}

/// Like [`unsigned_or_unset`], but zero also means "not set"
fn positive_or_unset(object: &Object, key: &str) -> Result<Option<u32>, I3Error> {
    Ok(unsigned_or_unset(object, key)?.filter(|&value| value > 0))
}

fn narrow<T: TryFrom<u64>>(number: u64, key: &str) -> Result<T, I3Error> {
    T::try_from(number).map_err(|_| {
        I3Error::bad_message(format!("Field \"{}\" is out of range: {}", key, number))
    })
}

fn enum_field<T: WireEnum>(object: &Object, key: &str) -> Result<T, I3Error> {
    let literal = str_field(object, key)?;
    T::from_wire(&literal).ok_or_else(|| I3Error::unsupported(key, literal))
}

fn rect_field(object: &Object, key: &str) -> Result<Rect, I3Error> {
    let rect = as_object(field(object, key)?, key)?;

    Ok(Rect {
        x: narrow(u64_field(rect, "x")?, "x")?,
        y: narrow(u64_field(rect, "y")?, "y")?,
        width: narrow(u64_field(rect, "width")?, "width")?,
        height: narrow(u64_field(rect, "height")?, "height")?,
    })
}

fn string_array(value: &Value, what: &str) -> Result<Vec<String>, I3Error> {
    as_array(value, what)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| wrong_type(what, "an array of strings", value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BarMode, BarPosition, BindingChange, BorderStyle, InputType, NodeLayout, NodeType,
        ShutdownChange, WindowChange, WorkspaceChange,
    };
    use serde_json::json;

    fn rect(x: u16, y: u16, width: u16, height: u16) -> Value {
        json!({ "x": x, "y": y, "width": width, "height": height })
    }

    /// Minimal node JSON the way i3 sends it
    fn node_json(id: u64, nodes: Vec<Value>, floating_nodes: Vec<Value>) -> Value {
        json!({
            "id": id,
            "name": null,
            "type": "con",
            "border": "normal",
            "current_border_width": -1,
            "layout": "splith",
            "percent": null,
            "rect": rect(0, 0, 1920, 1080),
            "window_rect": rect(0, 0, 0, 0),
            "deco_rect": rect(0, 0, 0, 0),
            "geometry": rect(0, 0, 0, 0),
            "window": null,
            "urgent": false,
            "focused": false,
            "focus": [],
            "fullscreen_mode": 0,
            "nodes": nodes,
            "floating_nodes": floating_nodes,
        })
    }

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_version_reply() {
        let payload = br#"{"major":4,"minor":20,"patch":0,"human_readable":"4.20","loaded_config_file_name":"/x"}"#;

        let reply = parse_reply(MessageType::GetVersion, payload).unwrap();
        assert_eq!(
            reply,
            Reply::Version(Version {
                major: 4,
                minor: 20,
                patch: 0,
                human_readable: "4.20".to_string(),
                loaded_config_file_name: "/x".to_string(),
            })
        );
    }

    #[test]
    fn test_declined_command_reports_all_fields() {
        let payload = br#"[{"success":false,"error":"bad syntax","input":"foo","errorposition":"^","parse_error":true}]"#;

        let err = parse_reply(MessageType::RunCommand, payload).unwrap_err();
        match &err {
            I3Error::InvalidArgument { message } => {
                assert!(message.contains("Parsing error"), "{}", message);
                assert!(message.contains("foo"), "{}", message);
                assert!(message.contains('^'), "{}", message);
                assert!(message.contains("bad syntax"), "{}", message);
            }
            other => panic!("Expected InvalidArgument, got: {:?}", other),
        }
    }

    #[test]
    fn test_accepted_commands() {
        let payload = br#"[{"success":true},{"success":true}]"#;
        assert_eq!(
            parse_reply(MessageType::RunCommand, payload).unwrap(),
            Reply::Command
        );
    }

    #[test]
    fn test_workspaces_reply_translates_negative_num() {
        let payload = bytes(&json!([
            {"num": 1, "name": "1", "visible": true, "focused": true, "urgent": false,
             "rect": rect(0, 20, 1920, 1060), "output": "DP-1"},
            {"num": -1, "name": "mail", "visible": false, "focused": false, "urgent": true,
             "rect": rect(0, 20, 1920, 1060), "output": "HDMI-1"},
        ]));

        let Reply::Workspaces(workspaces) =
            parse_reply(MessageType::GetWorkspaces, &payload).unwrap()
        else {
            panic!("Expected workspaces reply");
        };

        assert_eq!(workspaces.len(), 2);
        assert_eq!(workspaces[0].num, Some(1));
        assert_eq!(workspaces[0].rect.height, 1060);
        assert_eq!(workspaces[1].num, None);
        assert_eq!(workspaces[1].name, "mail");
        assert!(workspaces[1].urgent);
    }

    #[test]
    fn test_outputs_reply_with_null_workspace() {
        let payload = bytes(&json!([
            {"name": "xroot-0", "active": false, "primary": false,
             "current_workspace": null, "rect": rect(0, 0, 3840, 1080)},
            {"name": "DP-1", "active": true, "primary": true,
             "current_workspace": "1", "rect": rect(0, 0, 1920, 1080)},
        ]));

        let Reply::Outputs(outputs) = parse_reply(MessageType::GetOutputs, &payload).unwrap()
        else {
            panic!("Expected outputs reply");
        };

        assert_eq!(outputs[0].current_workspace, None);
        assert_eq!(outputs[1].current_workspace.as_deref(), Some("1"));
        assert!(outputs[1].primary);
    }

    #[test]
    fn test_tree_keeps_nesting_and_order() {
        let tree = node_json(
            1,
            vec![
                node_json(2, vec![node_json(4, vec![], vec![])], vec![]),
                node_json(3, vec![], vec![]),
            ],
            vec![node_json(5, vec![], vec![node_json(6, vec![], vec![])])],
        );

        let Reply::Tree(root) = parse_reply(MessageType::GetTree, &bytes(&tree)).unwrap() else {
            panic!("Expected tree reply");
        };

        assert_eq!(root.id, 1);
        assert_eq!(
            root.nodes.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(root.nodes[0].nodes[0].id, 4);
        assert!(root.nodes[1].nodes.is_empty());
        assert_eq!(root.floating_nodes[0].id, 5);
        assert_eq!(root.floating_nodes[0].floating_nodes[0].id, 6);
        assert_eq!(
            root.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![1, 2, 4, 3, 5, 6]
        );
    }

    #[test]
    fn test_node_fields() {
        let mut value = node_json(94, vec![], vec![]);
        value["name"] = json!("vim");
        value["type"] = json!("floating_con");
        value["border"] = json!("pixel");
        value["current_border_width"] = json!(2);
        value["layout"] = json!("tabbed");
        value["percent"] = json!(0.5);
        value["window"] = json!(6291459u64);
        value["window_properties"] = json!({
            "class": "URxvt", "instance": "urxvt", "title": "vim", "transient_for": null
        });
        value["focused"] = json!(true);
        value["focus"] = json!([7, 8]);
        value["fullscreen_mode"] = json!(1);
        value["marks"] = json!(["a", "b"]);

        let node = parse_node(&value).unwrap();

        assert_eq!(node.name.as_deref(), Some("vim"));
        assert_eq!(node.node_type, NodeType::FloatingCon);
        assert_eq!(node.border, BorderStyle::Pixel);
        assert_eq!(node.current_border_width, Some(2));
        assert_eq!(node.layout, NodeLayout::Tabbed);
        assert_eq!(node.percent, Some(0.5));
        assert_eq!(node.window, Some(6291459));
        let properties = node.window_properties.unwrap();
        assert_eq!(properties.class.as_deref(), Some("URxvt"));
        assert_eq!(properties.window_role, None);
        assert_eq!(properties.transient_for, None);
        assert!(node.focused);
        assert_eq!(node.focus, vec![7, 8]);
        assert_eq!(node.fullscreen_mode, FullscreenMode::Output);
        assert_eq!(node.marks, vec!["a", "b"]);
    }

    #[test]
    fn test_node_defaults_for_unset_values() {
        let node = parse_node(&node_json(1, vec![], vec![])).unwrap();

        assert_eq!(node.name, None);
        assert_eq!(node.current_border_width, None);
        assert_eq!(node.percent, None);
        assert_eq!(node.window, None);
        assert_eq!(node.window_properties, None);
        assert!(node.marks.is_empty());
        assert!(node.nodes.is_empty());
        assert!(node.floating_nodes.is_empty());
    }

    #[test]
    fn test_zero_border_width_is_unset() {
        let mut value = node_json(1, vec![], vec![]);
        value["current_border_width"] = json!(0);
        assert_eq!(parse_node(&value).unwrap().current_border_width, None);

        value["current_border_width"] = json!(1);
        assert_eq!(parse_node(&value).unwrap().current_border_width, Some(1));
    }

    #[test]
    fn test_missing_child_arrays_are_bad_message() {
        for key in ["nodes", "floating_nodes"] {
            let mut value = node_json(1, vec![], vec![]);
            value.as_object_mut().unwrap().remove(key);
            let err = parse_node(&value).unwrap_err();
            assert!(matches!(err, I3Error::BadMessage { .. }), "{:?}", err);
            assert!(err.to_string().contains(key));

            let mut value = node_json(1, vec![], vec![]);
            value[key] = json!({});
            let err = parse_node(&value).unwrap_err();
            assert!(matches!(err, I3Error::BadMessage { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_unknown_layout_is_unsupported() {
        let mut value = node_json(1, vec![], vec![]);
        value["layout"] = json!("spiral");

        match parse_node(&value).unwrap_err() {
            I3Error::Unsupported { field, value } => {
                assert_eq!(field, "layout");
                assert_eq!(value, "spiral");
            }
            other => panic!("Expected Unsupported, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_value_deep_in_tree_is_unsupported() {
        let mut child = node_json(2, vec![], vec![]);
        child["border"] = json!("rounded");
        let tree = node_json(1, vec![child], vec![]);

        let err = parse_reply(MessageType::GetTree, &bytes(&tree)).unwrap_err();
        assert!(
            matches!(&err, I3Error::Unsupported { field, .. } if field == "border"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_unknown_fullscreen_mode_is_unsupported() {
        let mut value = node_json(1, vec![], vec![]);
        value["fullscreen_mode"] = json!(7);

        let err = parse_node(&value).unwrap_err();
        assert!(matches!(&err, I3Error::Unsupported { field, value } if field == "fullscreen_mode" && value == "7"));
    }

    #[test]
    fn test_rect_out_of_range_is_bad_message() {
        let mut value = node_json(1, vec![], vec![]);
        value["rect"]["width"] = json!(70000);

        assert!(matches!(
            parse_node(&value).unwrap_err(),
            I3Error::BadMessage { .. }
        ));
    }

    #[test]
    fn test_bar_ids_and_bar_config_share_a_type() {
        let ids = parse_reply(MessageType::GetBarConfig, br#"["bar-0","bar-1"]"#).unwrap();
        assert_eq!(
            ids,
            Reply::BarIds(vec!["bar-0".to_string(), "bar-1".to_string()])
        );

        let payload = bytes(&json!({
            "id": "bar-0", "mode": "dock", "position": "top",
            "status_command": "i3status", "font": "pango:monospace 8",
            "workspace_buttons": true, "binding_mode_indicator": true, "verbose": false,
            "colors": {"background": "#000000", "statusline": "#ffffff"}
        }));
        let Reply::BarConfig(bar) = parse_reply(MessageType::GetBarConfig, &payload).unwrap()
        else {
            panic!("Expected bar config reply");
        };
        assert_eq!(bar.id, "bar-0");
        assert_eq!(bar.mode, BarMode::Dock);
        assert_eq!(bar.position, BarPosition::Top);
        assert_eq!(bar.colors.background.as_deref(), Some("#000000"));
        assert_eq!(bar.colors.separator, None);
    }

    #[test]
    fn test_unknown_bar_is_invalid_argument() {
        let err = parse_reply(MessageType::GetBarConfig, b"{}").unwrap_err();
        assert!(matches!(err, I3Error::InvalidArgument { .. }), "{:?}", err);
    }

    #[test]
    fn test_unknown_bar_mode_is_unsupported() {
        let payload = bytes(&json!({
            "id": "bar-0", "mode": "overlay", "position": "top",
            "status_command": "", "font": "", "workspace_buttons": true,
            "binding_mode_indicator": true, "verbose": false
        }));
        let err = parse_reply(MessageType::GetBarConfig, &payload).unwrap_err();
        assert!(matches!(&err, I3Error::Unsupported { field, value } if field == "mode" && value == "overlay"));
    }

    #[test]
    fn test_string_list_replies() {
        assert_eq!(
            parse_reply(MessageType::GetMarks, br#"["a","b"]"#).unwrap(),
            Reply::Marks(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            parse_reply(MessageType::GetBindingModes, br#"["default","resize"]"#).unwrap(),
            Reply::BindingModes(vec!["default".to_string(), "resize".to_string()])
        );
        assert!(matches!(
            parse_reply(MessageType::GetMarks, br#"["a",1]"#).unwrap_err(),
            I3Error::BadMessage { .. }
        ));
    }

    #[test]
    fn test_config_and_success_replies() {
        assert_eq!(
            parse_reply(MessageType::GetConfig, br#"{"config":"set $mod Mod4\n"}"#).unwrap(),
            Reply::Config("set $mod Mod4\n".to_string())
        );
        assert_eq!(
            parse_reply(MessageType::SendTick, br#"{"success":true}"#).unwrap(),
            Reply::Tick
        );
        assert!(matches!(
            parse_reply(MessageType::Sync, br#"{"success":false}"#).unwrap_err(),
            I3Error::InvalidArgument { .. }
        ));
        assert!(matches!(
            parse_reply(MessageType::Subscribe, br#"{"success":false}"#).unwrap_err(),
            I3Error::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_malformed_json_is_bad_message() {
        let err = parse_reply(MessageType::GetVersion, b"{not json").unwrap_err();
        assert!(matches!(err, I3Error::MalformedPayload(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::BadMessage);
    }

    #[test]
    fn test_reply_names() {
        assert_eq!(Reply::Command.name(), "command");
        assert_eq!(Reply::BarIds(Vec::new()).name(), "bar ids");
        assert_eq!(Reply::Config(String::new()).name(), "config");
    }

    #[test]
    fn test_event_type_is_not_a_reply() {
        let err = parse_reply(MessageType::Event(EventCategory::Tick), b"{}").unwrap_err();
        assert!(matches!(err, I3Error::BadMessage { .. }));
    }

    #[test]
    fn test_tick_event() {
        let event = parse_event(EventCategory::Tick, br#"{"first":true,"payload":null}"#).unwrap();
        assert_eq!(
            event,
            Event::Tick(TickEvent {
                first: true,
                payload: None
            })
        );

        let event = parse_event(EventCategory::Tick, br#"{"first":false,"payload":"hi"}"#).unwrap();
        assert_eq!(
            event,
            Event::Tick(TickEvent {
                first: false,
                payload: Some("hi".to_string())
            })
        );
    }

    #[test]
    fn test_window_event() {
        let payload = bytes(&json!({
            "change": "new",
            "container": node_json(8, vec![], vec![]),
        }));

        let Event::Window(event) = parse_event(EventCategory::Window, &payload).unwrap() else {
            panic!("Expected window event");
        };
        assert_eq!(event.change, WindowChange::New);
        assert_eq!(event.container.id, 8);
    }

    #[test]
    fn test_window_event_without_container_is_bad_message() {
        let err = parse_event(EventCategory::Window, br#"{"change":"focus"}"#).unwrap_err();
        assert!(matches!(err, I3Error::BadMessage { .. }));
    }

    #[test]
    fn test_unknown_change_is_unsupported_and_known_change_decodes() {
        let err = parse_event(EventCategory::Window, &bytes(&json!({
            "change": "teleport",
            "container": node_json(8, vec![], vec![]),
        })))
        .unwrap_err();
        assert!(
            matches!(&err, I3Error::Unsupported { field, value } if field == "change" && value == "teleport"),
            "{:?}",
            err
        );

        assert!(parse_event(EventCategory::Window, &bytes(&json!({
            "change": "move",
            "container": node_json(8, vec![], vec![]),
        })))
        .is_ok());
    }

    #[test]
    fn test_workspace_event_with_and_without_old() {
        let payload = bytes(&json!({
            "change": "focus",
            "current": node_json(2, vec![], vec![]),
            "old": null,
        }));
        let Event::Workspace(event) = parse_event(EventCategory::Workspace, &payload).unwrap()
        else {
            panic!("Expected workspace event");
        };
        assert_eq!(event.change, WorkspaceChange::Focus);
        assert_eq!(event.current.map(|n| n.id), Some(2));
        assert!(event.old.is_none());

        let Event::Workspace(event) =
            parse_event(EventCategory::Workspace, br#"{"change":"reload"}"#).unwrap()
        else {
            panic!("Expected workspace event");
        };
        assert_eq!(event.change, WorkspaceChange::Reload);
        assert!(event.current.is_none());
    }

    #[test]
    fn test_mode_output_shutdown_events() {
        assert_eq!(
            parse_event(EventCategory::Mode, br#"{"change":"resize","pango_markup":false}"#)
                .unwrap(),
            Event::Mode(ModeEvent {
                change: "resize".to_string(),
                pango_markup: false
            })
        );
        assert_eq!(
            parse_event(EventCategory::Output, br#"{"change":"unspecified"}"#)
                .unwrap()
                .category(),
            EventCategory::Output
        );
        assert_eq!(
            parse_event(EventCategory::Shutdown, br#"{"change":"restart"}"#).unwrap(),
            Event::Shutdown(ShutdownEvent {
                change: ShutdownChange::Restart
            })
        );
    }

    #[test]
    fn test_binding_event() {
        let payload = bytes(&json!({
            "change": "run",
            "binding": {
                "command": "nop",
                "event_state_mask": ["shift", "Mod4"],
                "input_code": 0,
                "symbol": "t",
                "input_type": "keyboard"
            }
        }));

        let Event::Binding(event) = parse_event(EventCategory::Binding, &payload).unwrap() else {
            panic!("Expected binding event");
        };
        assert_eq!(event.change, BindingChange::Run);
        assert_eq!(event.binding.event_state_mask, vec!["shift", "Mod4"]);
        assert_eq!(event.binding.input_code, Some(0));
        assert_eq!(event.binding.symbol.as_deref(), Some("t"));
        assert_eq!(event.binding.input_type, InputType::Keyboard);
    }

    #[test]
    fn test_bar_config_update_event() {
        let payload = bytes(&json!({
            "id": "bar-1", "mode": "hide", "position": "bottom",
            "status_command": "i3status", "font": "fixed",
            "workspace_buttons": false, "binding_mode_indicator": true, "verbose": true
        }));

        let Event::BarConfigUpdate(bar) =
            parse_event(EventCategory::BarConfigUpdate, &payload).unwrap()
        else {
            panic!("Expected bar config update");
        };
        assert_eq!(bar.mode, BarMode::Hide);
        assert_eq!(bar.colors, BarColors::default());
    }
}
