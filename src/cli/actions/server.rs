use crate::api;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::provider::HttpAuthProvider;
use anyhow::Result;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            provider_url,
            provider_key,
            frontend_url,
            exempt_paths,
            flow_ttl_seconds,
        } => {
            let mut globals = GlobalArgs::new(provider_url, frontend_url);
            globals.set_key(provider_key);

            let provider =
                HttpAuthProvider::new(&globals.provider_url, globals.provider_key.clone())?;

            let config = api::AuthConfig::new(globals.frontend_url.clone())
                .with_extra_exempt_paths(exempt_paths)
                .with_flow_ttl_seconds(flow_ttl_seconds);

            api::new(port, config, Arc::new(provider)).await?;
        }
    }

    Ok(())
}
