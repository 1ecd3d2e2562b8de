use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        provider_url: matches
            .get_one("provider-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --provider-url"))?,
        provider_key: matches
            .get_one("provider-key")
            .map(|s: &String| SecretString::from(s.to_string()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --provider-key"))?,
        frontend_url: matches
            .get_one("frontend-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --frontend-url"))?,
        exempt_paths: matches
            .get_many::<String>("exempt-path")
            .map(|values| values.map(ToString::to_string).collect())
            .unwrap_or_default(),
        flow_ttl_seconds: matches.get_one::<u64>("flow-ttl").copied().unwrap_or(900),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "pordego",
            "--provider-url",
            "https://project.supabase.co",
            "--provider-key",
            "publishable-key",
            "--frontend-url",
            "https://app.example.com",
            "--exempt-path",
            "/pricing",
        ]);

        let Action::Server {
            port,
            provider_url,
            provider_key,
            frontend_url,
            exempt_paths,
            flow_ttl_seconds,
        } = handler(&matches)?;

        assert_eq!(port, 8080);
        assert_eq!(provider_url, "https://project.supabase.co");
        assert_eq!(provider_key.expose_secret(), "publishable-key");
        assert_eq!(frontend_url, "https://app.example.com");
        assert_eq!(exempt_paths, vec!["/pricing".to_string()]);
        assert_eq!(flow_ttl_seconds, 900);
        Ok(())
    }
}
