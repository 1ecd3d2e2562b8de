pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        provider_url: String,
        provider_key: SecretString,
        frontend_url: String,
        exempt_paths: Vec<String>,
        flow_ttl_seconds: u64,
    },
}
