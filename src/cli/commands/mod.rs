use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("pordego")
        .about("Authentication gateway and session middleware")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PORDEGO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("provider-url")
                .long("provider-url")
                .help("Auth provider base URL, example: https://project.supabase.co")
                .env("PORDEGO_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new("provider-key")
                .long("provider-key")
                .help("Auth provider publishable API key")
                .env("PORDEGO_PROVIDER_KEY")
                .required(true),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Public base URL of the site, used for CORS and OAuth callbacks")
                .env("PORDEGO_FRONTEND_URL")
                .required(true),
        )
        .arg(
            Arg::new("exempt-path")
                .long("exempt-path")
                .help("Extra path the session gate lets through without a session (repeatable)")
                .env("PORDEGO_EXEMPT_PATH")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("flow-ttl")
                .long("flow-ttl")
                .help("Seconds an unfinished auth flow is kept before it expires")
                .default_value("900")
                .env("PORDEGO_FLOW_TTL")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PORDEGO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "pordego");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Authentication gateway and session middleware"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_provider() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "pordego",
            "--port",
            "8080",
            "--provider-url",
            "https://project.supabase.co",
            "--provider-key",
            "publishable-key",
            "--frontend-url",
            "https://app.example.com",
        ]);

        assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(8080));
        assert_eq!(
            matches
                .get_one::<String>("provider-url")
                .map(|s| s.to_string()),
            Some("https://project.supabase.co".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("provider-key")
                .map(|s| s.to_string()),
            Some("publishable-key".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("frontend-url")
                .map(|s| s.to_string()),
            Some("https://app.example.com".to_string())
        );
        assert_eq!(matches.get_one::<u64>("flow-ttl").map(|s| *s), Some(900));
    }

    #[test]
    fn test_check_exempt_paths() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "pordego",
            "--provider-url",
            "https://project.supabase.co",
            "--provider-key",
            "publishable-key",
            "--frontend-url",
            "https://app.example.com",
            "--exempt-path",
            "/pricing",
            "--exempt-path",
            "/about",
        ]);

        let paths: Vec<String> = matches
            .get_many::<String>("exempt-path")
            .map(|values| values.map(ToString::to_string).collect())
            .unwrap_or_default();
        assert_eq!(paths, vec!["/pricing".to_string(), "/about".to_string()]);
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PORDEGO_PROVIDER_URL", Some("https://project.supabase.co")),
                ("PORDEGO_PROVIDER_KEY", Some("publishable-key")),
                ("PORDEGO_FRONTEND_URL", Some("https://app.example.com")),
                ("PORDEGO_PORT", Some("443")),
                ("PORDEGO_FLOW_TTL", Some("300")),
                ("PORDEGO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["pordego"]);
                assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(443));
                assert_eq!(
                    matches
                        .get_one::<String>("provider-url")
                        .map(|s| s.to_string()),
                    Some("https://project.supabase.co".to_string())
                );
                assert_eq!(matches.get_one::<u64>("flow-ttl").map(|s| *s), Some(300));
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("PORDEGO_LOG_LEVEL", Some(level)),
                    ("PORDEGO_PROVIDER_URL", Some("https://project.supabase.co")),
                    ("PORDEGO_PROVIDER_KEY", Some("publishable-key")),
                    ("PORDEGO_FRONTEND_URL", Some("https://app.example.com")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["pordego"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("PORDEGO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "pordego".to_string(),
                    "--provider-url".to_string(),
                    "https://project.supabase.co".to_string(),
                    "--provider-key".to_string(),
                    "publishable-key".to_string(),
                    "--frontend-url".to_string(),
                    "https://app.example.com".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
