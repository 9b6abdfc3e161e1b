use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("pintop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep one window on top of all others")
        .long_about(
            "pintop pins a window above everything else. With Screen Recording permission it \
             mirrors the window into a click-through overlay; without it, it keeps raising the \
             window on a timer.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Load tunables from this TOML file on top of ~/.pintop/config.toml")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        // List subcommand
        .subcommand(
            Command::new("list").about("List windows that can be pinned").arg(
                Arg::new("json")
                    .long("json")
                    .help("Output in JSON format")
                    .action(ArgAction::SetTrue),
            ),
        )
        // Pin subcommand
        .subcommand(
            Command::new("pin")
                .about("Pin a window and keep it on top until Ctrl-C")
                .arg(
                    Arg::new("app")
                        .long("app")
                        .short('a')
                        .help("Pin a window of this app (exact name preferred, falls back to partial)")
                        .conflicts_with("last"),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .short('t')
                        .help("Pin the window whose title contains this text")
                        .conflicts_with("last"),
                )
                .arg(
                    Arg::new("last")
                        .long("last")
                        .help("Re-pin the window pinned most recently")
                        .action(ArgAction::SetTrue),
                ),
        )
        // Permission subcommand
        .subcommand(
            Command::new("permission")
                .about("Show whether Screen Recording permission is granted")
                .arg(
                    Arg::new("request")
                        .long("request")
                        .help("Show the system permission prompt if not yet granted")
                        .action(ArgAction::SetTrue),
                ),
        )
        // Settings subcommand
        .subcommand(
            Command::new("settings")
                .about("Show or change persisted settings")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("show").about("Show current settings").arg(
                        Arg::new("json")
                            .long("json")
                            .help("Output in JSON format")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(
                    Command::new("interval")
                        .about("Set the raise-loop interval in seconds (clamped to 0.2-1.5)")
                        .arg(
                            Arg::new("seconds")
                                .help("Seconds between raises")
                                .required(true)
                                .allow_negative_numbers(true)
                                .value_parser(clap::value_parser!(f64)),
                        ),
                )
                .subcommand(
                    Command::new("focus-steal")
                        .about("Also activate the pinned app on every raise")
                        .arg(
                            Arg::new("mode")
                                .help("on or off")
                                .required(true)
                                .value_parser(["on", "off"]),
                        ),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "pintop");
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["pintop"]);
        assert!(matches.is_err());
    }

    #[test]
    fn test_cli_list_json() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["pintop", "list", "--json"]);
        assert!(matches.is_ok());

        let matches = matches.unwrap();
        let list_matches = matches.subcommand_matches("list").unwrap();
        assert!(list_matches.get_flag("json"));
    }

    #[test]
    fn test_cli_pin_app_and_title() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["pintop", "pin", "--app", "Safari", "--title", "Docs"])
            .unwrap();
        let pin_matches = matches.subcommand_matches("pin").unwrap();
        assert_eq!(
            pin_matches.get_one::<String>("app").map(String::as_str),
            Some("Safari")
        );
        assert_eq!(
            pin_matches.get_one::<String>("title").map(String::as_str),
            Some("Docs")
        );
        assert!(!pin_matches.get_flag("last"));
    }

    #[test]
    fn test_cli_pin_last_conflicts_with_app() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["pintop", "pin", "--last", "--app", "Safari"]);
        assert!(matches.is_err());
    }

    #[test]
    fn test_cli_permission_request() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["pintop", "permission", "--request"])
            .unwrap();
        let permission_matches = matches.subcommand_matches("permission").unwrap();
        assert!(permission_matches.get_flag("request"));
    }

    #[test]
    fn test_cli_settings_interval_parses_float() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["pintop", "settings", "interval", "0.75"])
            .unwrap();
        let settings_matches = matches.subcommand_matches("settings").unwrap();
        let interval_matches = settings_matches.subcommand_matches("interval").unwrap();
        assert_eq!(interval_matches.get_one::<f64>("seconds"), Some(&0.75));
    }

    #[test]
    fn test_cli_settings_interval_accepts_negative() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["pintop", "settings", "interval", "-1"]);
        assert!(matches.is_ok());
    }

    #[test]
    fn test_cli_settings_interval_rejects_text() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["pintop", "settings", "interval", "fast"]);
        assert!(matches.is_err());
    }

    #[test]
    fn test_cli_focus_steal_values() {
        let app = build_cli();
        assert!(
            app.clone()
                .try_get_matches_from(vec!["pintop", "settings", "focus-steal", "on"])
                .is_ok()
        );
        assert!(
            app.try_get_matches_from(vec!["pintop", "settings", "focus-steal", "maybe"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_verbose_is_global() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["pintop", "settings", "show", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_cli_config_path() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["pintop", "--config", "/tmp/pintop.toml", "list"])
            .unwrap();
        assert_eq!(
            matches.get_one::<std::path::PathBuf>("config"),
            Some(&std::path::PathBuf::from("/tmp/pintop.toml"))
        );
    }
}
