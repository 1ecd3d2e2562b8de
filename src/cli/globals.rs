use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub provider_url: String,
    pub provider_key: SecretString,
    pub frontend_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(provider_url: String, frontend_url: String) -> Self {
        Self {
            provider_url,
            provider_key: SecretString::default(),
            frontend_url,
        }
    }

    pub fn set_key(&mut self, key: SecretString) {
        self.provider_key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://project.supabase.co".to_string(),
            "https://app.example.com".to_string(),
        );
        assert_eq!(args.provider_url, "https://project.supabase.co");
        assert_eq!(args.frontend_url, "https://app.example.com");
        assert_eq!(args.provider_key.expose_secret(), "");
    }
}
