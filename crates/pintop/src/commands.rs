use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::ArgMatches;
use tokio::sync::watch;
use tracing::{error, info, warn};

use pintop_core::events;
use pintop_core::settings::Settings;
use pintop_core::window::WindowBounds;
use pintop_core::{PinController, PinState, PintopConfig, Platform, SettingsStore, TargetWindowRef};

use crate::table::TableFormatter;

/// A window as printed by `pintop list --json`.
#[derive(serde::Serialize)]
struct WindowRow<'a> {
    pid: i32,
    app: &'a str,
    bundle_id: Option<&'a str>,
    title: &'a str,
    bounds: WindowBounds,
}

impl<'a> From<&'a TargetWindowRef> for WindowRow<'a> {
    fn from(window: &'a TargetWindowRef) -> Self {
        Self {
            pid: window.pid,
            app: &window.process_name,
            bundle_id: window.bundle_id.as_deref(),
            title: &window.title,
            bounds: window.bounds,
        }
    }
}

#[derive(serde::Serialize)]
struct SettingsResponse<'a> {
    path: Option<String>,
    raise_interval_secs: f64,
    allow_focus_steal: bool,
    last_pinned: Option<&'a pintop_core::PinnedIdentity>,
}

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup(matches.subcommand_name().unwrap_or("none"));

    match matches.subcommand() {
        Some(("list", sub_matches)) => handle_list_command(sub_matches),
        Some(("pin", sub_matches)) => handle_pin_command(matches, sub_matches),
        Some(("permission", sub_matches)) => handle_permission_command(sub_matches),
        Some(("settings", sub_matches)) => handle_settings_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

fn load_platform() -> Result<Platform, Box<dyn std::error::Error>> {
    pintop_macos::platform().map_err(|e| {
        eprintln!("{}", e);
        error!(event = "cli.platform_unavailable", error = %e);
        events::log_app_error(&e);
        e.into()
    })
}

fn handle_list_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    info!(event = "cli.list_started", json_output = json_output);

    let platform = load_platform()?;
    match platform.discovery.enumerate() {
        Ok(windows) => {
            if json_output {
                let rows: Vec<WindowRow> = windows.iter().map(WindowRow::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if windows.is_empty() {
                println!("No pinnable windows found.");
            } else {
                println!("Pinnable windows:");
                TableFormatter::new(&windows).print_table(&windows);
            }

            info!(event = "cli.list_completed", count = windows.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to list windows: {}", e);
            error!(event = "cli.list_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

fn load_config(root_matches: &ArgMatches) -> Result<PintopConfig, Box<dyn std::error::Error>> {
    let explicit = root_matches.get_one::<PathBuf>("config");
    let config = PintopConfig::load_hierarchy(explicit.map(PathBuf::as_path)).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        error!(event = "cli.config_invalid", error = %e);
        events::log_app_error(&e);
        e
    })?;
    Ok(config)
}

fn open_settings() -> SettingsStore {
    let store = SettingsStore::open_default();
    if let Some(detail) = store.load_error() {
        eprintln!("Warning: settings file unreadable, using defaults ({})", detail);
        warn!(event = "cli.settings_load_failed", error = detail);
    }
    events::log_settings_loaded(&store);
    store
}

fn handle_pin_command(
    root_matches: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let app_filter = matches.get_one::<String>("app").cloned();
    let title_filter = matches.get_one::<String>("title").cloned();
    let use_last = matches.get_flag("last");

    info!(
        event = "cli.pin_started",
        app = ?app_filter,
        title = ?title_filter,
        last = use_last
    );

    if !use_last && app_filter.is_none() && title_filter.is_none() {
        eprintln!("Specify a window with --app, --title or --last.");
        return Err("No target window specified".into());
    }

    let config = load_config(root_matches)?;
    let settings = Arc::new(open_settings());
    let platform = load_platform()?;

    let windows = platform.discovery.enumerate().map_err(|e| {
        eprintln!("Failed to list windows: {}", e);
        error!(event = "cli.pin_enumerate_failed", error = %e);
        events::log_app_error(&e);
        e
    })?;

    let target = if use_last {
        let Some(identity) = settings.last_pinned_identity() else {
            eprintln!("No window has been pinned yet.");
            return Err("No last pinned window".into());
        };
        identity.find_match(&windows).cloned()
    } else {
        select_target(&windows, app_filter.as_deref(), title_filter.as_deref()).cloned()
    };

    let Some(target) = target else {
        eprintln!("No matching window found. Run 'pintop list' to see pinnable windows.");
        error!(event = "cli.pin_target_not_found");
        return Err("Target window not found".into());
    };

    info!(event = "cli.pin_target_resolved", pid = target.pid, target = %target);
    let result = run_with_main_loop(run_pin(platform, settings, config, target));
    events::log_app_shutdown();

    match result {
        Ok(()) => {
            info!(event = "cli.pin_completed");
            Ok(())
        }
        Err(message) => {
            error!(event = "cli.pin_failed", error = %message);
            Err(message.into())
        }
    }
}

/// Pick a window by app name and/or title. Exact (case-insensitive) app name
/// matches beat partial ones; the title filter is a case-insensitive substring.
/// Discovery lists windows front to back, so the frontmost match wins.
fn select_target<'a>(
    windows: &'a [TargetWindowRef],
    app: Option<&str>,
    title: Option<&str>,
) -> Option<&'a TargetWindowRef> {
    let title_lower = title.map(str::to_lowercase);
    let title_matches = |w: &TargetWindowRef| {
        title_lower
            .as_deref()
            .is_none_or(|t| w.title.to_lowercase().contains(t))
    };

    let Some(app) = app else {
        return windows.iter().find(|w| title_matches(w));
    };

    let app_lower = app.to_lowercase();
    windows
        .iter()
        .find(|w| w.process_name.to_lowercase() == app_lower && title_matches(w))
        .or_else(|| {
            windows
                .iter()
                .find(|w| w.process_name.to_lowercase().contains(&app_lower) && title_matches(w))
        })
}

/// Drive `future` on a runtime thread while this thread pumps the main run
/// loop, which overlay surfaces need.
fn run_with_main_loop<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {}", e))?;

    let done = Arc::new(AtomicBool::new(false));
    let worker_done = Arc::clone(&done);
    let worker = std::thread::Builder::new()
        .name("pintop-runtime".to_string())
        .spawn(move || {
            let result = runtime.block_on(future);
            worker_done.store(true, Ordering::Release);
            result
        })
        .map_err(|e| format!("Failed to start runtime thread: {}", e))?;

    pintop_macos::run_main_loop(&done);

    worker
        .join()
        .unwrap_or_else(|_| Err("Runtime thread panicked".to_string()))
}

async fn run_pin(
    platform: Platform,
    settings: Arc<SettingsStore>,
    config: PintopConfig,
    target: TargetWindowRef,
) -> Result<(), String> {
    let handle = PinController::spawn(platform, settings, config);

    let (state_tx, mut state_rx) = watch::channel(PinState::Idle);
    handle
        .add_state_observer(Box::new(move |state| {
            println!("State: {}", state);
            let _ = state_tx.send(state.clone());
        }))
        .await
        .map_err(|e| e.to_string())?;

    handle.pin(target).await.map_err(|e| e.to_string())?;
    println!("Press Ctrl-C to unpin.");

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(event = "cli.pin_signal_failed", error = %e);
                }
                info!(event = "cli.pin_interrupted");
                break Ok(());
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break Err("Pin controller stopped unexpectedly".to_string());
                }
                let state = state_rx.borrow_and_update().clone();
                match state {
                    PinState::Error(message) => break Err(message),
                    PinState::Idle => break Ok(()),
                    // The controller logs which strategy it settles on.
                    PinState::Pinning(_) => {}
                }
            }
        }
    };

    if let Err(e) = handle.shutdown().await {
        warn!(event = "cli.pin_shutdown_failed", error = %e);
    }
    outcome
}

fn handle_permission_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let request = matches.get_flag("request");
    info!(event = "cli.permission_started", request = request);

    let platform = load_platform()?;
    let capability = &platform.capability;

    if capability.has_permission() {
        println!("Screen Recording permission: granted");
        return Ok(());
    }

    if request {
        capability.request_permission();
        println!("Screen Recording permission: requested");
        println!("Approve pintop in System Settings > Privacy & Security > Screen Recording.");
    } else {
        println!("Screen Recording permission: not granted");
        println!("Pins fall back to the raise loop. Run 'pintop permission --request' to ask.");
    }

    info!(event = "cli.permission_completed", granted = false);
    Ok(())
}

fn handle_settings_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("show", sub_matches)) => handle_settings_show(sub_matches),
        Some(("interval", sub_matches)) => handle_settings_interval(sub_matches),
        Some(("focus-steal", sub_matches)) => handle_settings_focus_steal(sub_matches),
        _ => {
            error!(event = "cli.settings_subcommand_unknown");
            Err("Unknown settings subcommand".into())
        }
    }
}

fn handle_settings_show(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let store = open_settings();
    let snapshot: Settings = store.snapshot();

    if json_output {
        let response = SettingsResponse {
            path: store.path().map(|p| p.display().to_string()),
            raise_interval_secs: snapshot.raise_interval_secs(),
            allow_focus_steal: snapshot.allow_focus_steal,
            last_pinned: snapshot.last_pinned_identity.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if let Some(path) = store.path() {
        println!("Settings file:  {}", path.display());
    }
    println!("Raise interval: {}s", snapshot.raise_interval_secs());
    println!(
        "Focus steal:    {}",
        if snapshot.allow_focus_steal { "on" } else { "off" }
    );
    match &snapshot.last_pinned_identity {
        Some(identity) => println!(
            "Last pinned:    {} (pinned {})",
            identity.process_name,
            identity.pinned_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("Last pinned:    none"),
    }
    Ok(())
}

fn handle_settings_interval(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let requested = *matches
        .get_one::<f64>("seconds")
        .ok_or("Seconds argument is required")?;

    let store = open_settings();
    match store.set_raise_interval(requested) {
        Ok(stored) => {
            if stored == requested {
                println!("Raise interval set to {}s", stored);
            } else {
                println!(
                    "Raise interval set to {}s (requested {}s is outside 0.2-1.5)",
                    stored, requested
                );
            }
            info!(event = "cli.settings_interval_completed", stored = stored);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            error!(event = "cli.settings_interval_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

fn handle_settings_focus_steal(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let allow = matches.get_one::<String>("mode").map(String::as_str) == Some("on");

    let store = open_settings();
    match store.set_allow_focus_steal(allow) {
        Ok(()) => {
            println!("Focus steal {}", if allow { "enabled" } else { "disabled" });
            info!(event = "cli.settings_focus_steal_completed", allow = allow);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            error!(event = "cli.settings_focus_steal_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}
