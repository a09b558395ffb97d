//! i3-ipc CLI
//!
//! Query and control a running i3 instance over its IPC socket.

use std::fmt::Display;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use i3_ipc::{Callback, EventCategory, I3Client, Node, Rect};
use miette::IntoDiagnostic;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "i3-ipc")]
#[command(about = "Query and control i3 over IPC")]
#[command(version)]
struct Cli {
    /// Path to the i3 socket (defaults to $I3SOCK, then `i3 --get-socketpath`)
    #[arg(short, long)]
    socket: Option<String>,

    /// Print replies and events as JSON
    #[arg(short, long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run i3 commands, separated by `;`
    Command {
        commands: String,
    },

    /// List workspaces
    Workspaces,

    /// List outputs
    Outputs,

    /// Print the layout tree
    Tree,

    /// List marks
    Marks,

    /// List bar ids
    Bars,

    /// Show the configuration of one bar
    BarConfig {
        id: String,
    },

    /// Show the i3 version
    Version,

    /// List binding modes
    BindingModes,

    /// Print the loaded configuration file
    Config,

    /// Broadcast a tick to subscribed clients
    Tick {
        payload: Option<String>,
    },

    /// Ask i3 to send a sync message to a window
    Sync {
        window: u32,
        random: u32,
    },

    /// Subscribe to events and print them as they arrive
    Listen {
        /// Event categories: workspace, output, mode, window, barconfig_update,
        /// binding, shutdown or tick
        #[arg(required = true, value_parser = parse_category)]
        categories: Vec<EventCategory>,

        /// Stop after this many events
        #[arg(short, long)]
        count: Option<u64>,
    },
}

fn parse_category(name: &str) -> Result<EventCategory, String> {
    EventCategory::from_subscription_name(name)
        .ok_or_else(|| format!("unknown event category: {}", name))
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut client = match &cli.socket {
        Some(socket) => {
            // Expand tilde in socket path
            let socket_path: PathBuf = shellexpand::tilde(socket).into_owned().into();
            I3Client::connect_to(socket_path).await?
        }
        None => I3Client::connect().await?,
    };

    let json = cli.json;
    let result = match cli.command {
        Commands::Command { commands } => {
            client.run_command(&commands).await?;
            Ok(())
        }
        Commands::Workspaces => cmd_workspaces(&mut client, json).await,
        Commands::Outputs => cmd_outputs(&mut client, json).await,
        Commands::Tree => {
            let tree = client.get_tree().await?;
            emit(json, &tree, || print_tree(&tree, 0))
        }
        Commands::Marks => {
            let marks = client.get_marks().await?;
            emit(json, &marks, || print_lines(&marks))
        }
        Commands::Bars => {
            let ids = client.get_bar_ids().await?;
            emit(json, &ids, || print_lines(&ids))
        }
        Commands::BarConfig { id } => cmd_bar_config(&mut client, &id, json).await,
        Commands::Version => {
            let version = client.get_version().await?;
            emit(json, &version, || {
                println!("i3 version {}", version.human_readable);
                println!("Loaded config: {}", version.loaded_config_file_name);
            })
        }
        Commands::BindingModes => {
            let modes = client.get_binding_modes().await?;
            emit(json, &modes, || print_lines(&modes))
        }
        Commands::Config => {
            let config = client.get_config().await?;
            emit(json, &config, || print!("{}", config))
        }
        Commands::Tick { payload } => {
            client.send_tick(payload.as_deref()).await?;
            Ok(())
        }
        Commands::Sync { window, random } => {
            client.sync(window, random).await?;
            Ok(())
        }
        Commands::Listen { categories, count } => {
            cmd_listen(&mut client, &categories, count, json).await
        }
    };

    if let Err(e) = client.close().await {
        tracing::debug!(error = %e, "Failed to close i3 connection");
    }
    result
}

/// Print `value` as JSON, or run `human` for the readable form
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> miette::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    } else {
        human();
    }
    Ok(())
}

fn print_lines<T: Display>(items: &[T]) {
    for item in items {
        println!("{}", item);
    }
}

fn format_rect(rect: &Rect) -> String {
    format!("{}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y)
}

async fn cmd_workspaces(client: &mut I3Client, json: bool) -> miette::Result<()> {
    let workspaces = client.get_workspaces().await?;

    emit(json, &workspaces, || {
        for workspace in &workspaces {
            let num = workspace
                .num
                .map(|num| num.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mut flags = Vec::new();
            if workspace.focused {
                flags.push("focused");
            }
            if workspace.visible {
                flags.push("visible");
            }
            if workspace.urgent {
                flags.push("urgent");
            }

            println!(
                "{:>3} {} on {} {} [{}]",
                num,
                workspace.name,
                workspace.output,
                format_rect(&workspace.rect),
                flags.join(", ")
            );
        }
    })
}

async fn cmd_outputs(client: &mut I3Client, json: bool) -> miette::Result<()> {
    let outputs = client.get_outputs().await?;

    emit(json, &outputs, || {
        for output in &outputs {
            let state = if output.active { "active" } else { "inactive" };
            let primary = if output.primary { ", primary" } else { "" };
            println!("{} ({}{})", output.name, state, primary);
            println!("    Geometry: {}", format_rect(&output.rect));
            println!(
                "    Workspace: {}",
                output.current_workspace.as_deref().unwrap_or("<none>")
            );
        }
    })
}

fn print_tree(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let focused = if node.focused { " *" } else { "" };
    let marks = if node.marks.is_empty() {
        String::new()
    } else {
        format!(" marks={}", node.marks.join(","))
    };

    println!(
        "{}{} #{} {:?} [{}]{}{}",
        indent,
        node.node_type.as_str(),
        node.id,
        node.name.as_deref().unwrap_or(""),
        node.layout.as_str(),
        marks,
        focused
    );

    for child in node.children() {
        print_tree(child, depth + 1);
    }
}

async fn cmd_bar_config(client: &mut I3Client, id: &str, json: bool) -> miette::Result<()> {
    let bar = client.get_bar_config(id).await?;

    emit(json, &bar, || {
        println!("Bar {}", bar.id);
        println!("  Mode: {}", bar.mode.as_str());
        println!("  Position: {}", bar.position.as_str());
        println!("  Status command: {}", bar.status_command);
        println!("  Font: {}", bar.font);
        println!("  Workspace buttons: {}", bar.workspace_buttons);
        println!("  Binding mode indicator: {}", bar.binding_mode_indicator);
        println!("  Verbose: {}", bar.verbose);
    })
}

/// Callback printing every event of one category
fn reporter<T>(json: bool, category: EventCategory) -> impl FnMut(&T) + Send + 'static
where
    T: Serialize + std::fmt::Debug,
{
    move |event: &T| {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Failed to serialize {} event: {}", category, e),
            }
        } else {
            println!("{}: {:?}", category, event);
        }
    }
}

async fn cmd_listen(
    client: &mut I3Client,
    categories: &[EventCategory],
    count: Option<u64>,
    json: bool,
) -> miette::Result<()> {
    for &category in categories {
        let callback = match category {
            EventCategory::Workspace => Callback::workspace(reporter(json, category)),
            EventCategory::Output => Callback::output(reporter(json, category)),
            EventCategory::Mode => Callback::mode(reporter(json, category)),
            EventCategory::Window => Callback::window(reporter(json, category)),
            EventCategory::BarConfigUpdate => {
                Callback::bar_config_update(reporter(json, category))
            }
            EventCategory::Binding => Callback::binding(reporter(json, category)),
            EventCategory::Shutdown => Callback::shutdown(reporter(json, category)),
            EventCategory::Tick => Callback::tick(reporter(json, category)),
        };
        client.subscribe(callback).await?;
        tracing::info!(%category, "Subscribed");
    }

    let mut handled = 0;
    while count.map_or(true, |count| handled < count) {
        let category = client.handle_next_event().await?;
        handled += 1;

        // i3 closes the connection right after a shutdown event
        if category == EventCategory::Shutdown {
            break;
        }
    }

    Ok(())
}
