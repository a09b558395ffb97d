//! Typed representations of i3 IPC data
//!
//! Every value here is produced by `parser` from one message and is
//! immutable afterwards. Fields that i3 may omit, send as `null`, or mark as
//! unset with a negative sentinel are `Option`s.
//!
//! All types derive `Serialize` so front ends can re-emit them as JSON.

use serde::Serialize;

/// Closed set of string (or integer) values with a fixed wire spelling
///
/// `parser` turns any literal outside the set into `I3Error::Unsupported`.
pub trait WireEnum: Sized {
    /// Look up a wire literal
    fn from_wire(literal: &str) -> Option<Self>;
}

/// Implements `WireEnum` plus `as_str` for a fieldless enum
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $literal:literal),+ $(,)? }) => {
        impl WireEnum for $name {
            fn from_wire(literal: &str) -> Option<Self> {
                match literal {
                    $($literal => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl $name {
            /// Spelling used on the wire
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $literal,)+
                }
            }
        }
    };
}

/// Screen area in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// One workspace as reported by `GET_WORKSPACES`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    /// Logical number, `None` for named workspaces without a number
    pub num: Option<u32>,
    pub name: String,
    pub visible: bool,
    pub focused: bool,
    pub urgent: bool,
    pub rect: Rect,
    /// Output (monitor) the workspace lives on
    pub output: String,
}

/// One video output as reported by `GET_OUTPUTS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub name: String,
    pub active: bool,
    pub primary: bool,
    /// Workspace currently visible on this output
    pub current_workspace: Option<String>,
    pub rect: Rect,
}

/// Kind of a node in the container tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Con,
    FloatingCon,
    Workspace,
    Dockarea,
}

wire_enum!(NodeType {
    Root => "root",
    Output => "output",
    Con => "con",
    FloatingCon => "floating_con",
    Workspace => "workspace",
    Dockarea => "dockarea",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    Normal,
    None,
    Pixel,
}

wire_enum!(BorderStyle {
    Normal => "normal",
    None => "none",
    Pixel => "pixel",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLayout {
    SplitH,
    SplitV,
    Stacked,
    Tabbed,
    Dockarea,
    Output,
}

wire_enum!(NodeLayout {
    SplitH => "splith",
    SplitV => "splitv",
    Stacked => "stacked",
    Tabbed => "tabbed",
    Dockarea => "dockarea",
    Output => "output",
});

/// Fullscreen state of a container, sent by i3 as 0, 1 or 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenMode {
    None,
    /// Fullscreen on its own output
    Output,
    /// Fullscreen across all outputs
    Global,
}

impl FullscreenMode {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(FullscreenMode::None),
            1 => Some(FullscreenMode::Output),
            2 => Some(FullscreenMode::Global),
            _ => None,
        }
    }
}

/// X11 properties of the client window inside a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowProperties {
    /// `WM_CLASS` class
    pub class: Option<String>,
    /// `WM_CLASS` instance
    pub instance: Option<String>,
    /// `WM_WINDOW_ROLE`
    pub window_role: Option<String>,
    /// `_NET_WM_NAME`
    pub title: Option<String>,
    /// `WM_TRANSIENT_FOR`
    pub transient_for: Option<u64>,
}

/// One container in i3's layout tree
///
/// `nodes` and `floating_nodes` own the children. `focus` only lists child
/// ids in focus order; use [`Node::find`] to resolve them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: u64,
    pub name: Option<String>,
    pub node_type: NodeType,
    pub border: BorderStyle,
    /// Border thickness in pixels, `None` when i3 reports zero or less
    pub current_border_width: Option<u32>,
    pub layout: NodeLayout,
    /// Share of the parent container, between 0.0 and 1.0
    pub percent: Option<f64>,
    /// Absolute display coordinates
    pub rect: Rect,
    /// Client window relative to the container
    pub window_rect: Rect,
    /// Window decoration relative to the parent
    pub deco_rect: Rect,
    /// Geometry the window asked for when it was mapped
    pub geometry: Rect,
    /// X11 window id of the client, if any
    pub window: Option<u64>,
    pub window_properties: Option<WindowProperties>,
    pub urgent: bool,
    pub focused: bool,
    pub focus: Vec<u64>,
    pub fullscreen_mode: FullscreenMode,
    pub marks: Vec<String>,
    pub nodes: Vec<Node>,
    pub floating_nodes: Vec<Node>,
}

impl Node {
    /// Depth-first iterator over this node and all descendants
    ///
    /// Tiling children are visited before floating children, each in the
    /// order i3 sent them.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// Find a node by id anywhere in this subtree
    pub fn find(&self, id: u64) -> Option<&Node> {
        self.iter().find(|node| node.id == id)
    }

    /// The focused node in this subtree, if any
    pub fn focused(&self) -> Option<&Node> {
        self.iter().find(|node| node.focused)
    }

    /// Direct children (tiling, then floating)
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }
}

/// Iterator returned by [`Node::iter`]
#[derive(Debug)]
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.floating_nodes.iter().rev());
        self.stack.extend(node.nodes.iter().rev());
        Some(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Dock,
    Hide,
    Invisible,
}

wire_enum!(BarMode {
    Dock => "dock",
    Hide => "hide",
    Invisible => "invisible",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarPosition {
    Bottom,
    Top,
}

wire_enum!(BarPosition {
    Bottom => "bottom",
    Top => "top",
});

/// Colors configured for an i3bar, each an `#rrggbb` string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarColors {
    pub background: Option<String>,
    pub focused_background: Option<String>,
    pub statusline: Option<String>,
    pub focused_statusline: Option<String>,
    pub separator: Option<String>,
    pub focused_separator: Option<String>,
    pub focused_workspace_text: Option<String>,
    pub focused_workspace_bg: Option<String>,
    pub focused_workspace_border: Option<String>,
    pub active_workspace_text: Option<String>,
    pub active_workspace_bg: Option<String>,
    pub active_workspace_border: Option<String>,
    pub inactive_workspace_text: Option<String>,
    pub inactive_workspace_bg: Option<String>,
    pub inactive_workspace_border: Option<String>,
    pub urgent_workspace_text: Option<String>,
    pub urgent_workspace_bg: Option<String>,
    pub urgent_workspace_border: Option<String>,
    pub binding_mode_text: Option<String>,
    pub binding_mode_bg: Option<String>,
    pub binding_mode_border: Option<String>,
}

/// Configuration of one i3bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarConfig {
    pub id: String,
    pub mode: BarMode,
    pub position: BarPosition,
    pub status_command: String,
    pub font: String,
    pub workspace_buttons: bool,
    pub binding_mode_indicator: bool,
    pub verbose: bool,
    pub colors: BarColors,
}

/// Version of the running i3
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub human_readable: String,
    /// Config file i3 loaded last
    pub loaded_config_file_name: String,
}

// =============================================================================
// Event Payloads
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceChange {
    Focus,
    Init,
    Empty,
    Urgent,
    Reload,
    Rename,
    Restored,
    Move,
}

wire_enum!(WorkspaceChange {
    Focus => "focus",
    Init => "init",
    Empty => "empty",
    Urgent => "urgent",
    Reload => "reload",
    Rename => "rename",
    Restored => "restored",
    Move => "move",
});

/// Workspace event; `old` and `current` are present when the change has them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceEvent {
    pub change: WorkspaceChange,
    pub old: Option<Node>,
    pub current: Option<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChange {
    Unspecified,
}

wire_enum!(OutputChange {
    Unspecified => "unspecified",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEvent {
    pub change: OutputChange,
}

/// Binding mode change; `change` is the name of the new mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeEvent {
    pub change: String,
    pub pango_markup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowChange {
    New,
    Close,
    Focus,
    Title,
    FullscreenMode,
    Move,
    Floating,
    Urgent,
    Mark,
}

wire_enum!(WindowChange {
    New => "new",
    Close => "close",
    Focus => "focus",
    Title => "title",
    FullscreenMode => "fullscreen_mode",
    Move => "move",
    Floating => "floating",
    Urgent => "urgent",
    Mark => "mark",
});

/// Window event with the container that holds the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEvent {
    pub change: WindowChange,
    pub container: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingChange {
    Run,
}

wire_enum!(BindingChange {
    Run => "run",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Keyboard,
    Mouse,
}

wire_enum!(InputType {
    Keyboard => "keyboard",
    Mouse => "mouse",
});

/// The binding that was triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingInfo {
    pub command: String,
    /// Modifiers held, e.g. `["shift", "Mod4"]`
    pub event_state_mask: Vec<String>,
    pub input_code: Option<u32>,
    pub symbol: Option<String>,
    pub input_type: InputType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingEvent {
    pub change: BindingChange,
    pub binding: BindingInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownChange {
    Restart,
    Exit,
}

wire_enum!(ShutdownChange {
    Restart => "restart",
    Exit => "exit",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownEvent {
    pub change: ShutdownChange,
}

/// Tick broadcast; `first` is set on the tick that confirms a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickEvent {
    pub first: bool,
    pub payload: Option<String>,
}
