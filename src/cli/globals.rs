use secrecy::SecretString;
use std::path::PathBuf;

/// Used when `CRMDASH_AUTH_URL` is not set; every auth call will fail.
pub const PLACEHOLDER_AUTH_URL: &str = "https://your-project.supabase.co";
/// Used when `CRMDASH_AUTH_ANON_KEY` is not set.
pub const PLACEHOLDER_ANON_KEY: &str = "your-anon-key";

#[derive(Clone)]
pub struct GlobalArgs {
    pub auth_url: String,
    pub anon_key: SecretString,
    pub api_url: String,
    pub site_url: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, site_url: String, session_file: PathBuf) -> Self {
        Self {
            auth_url: PLACEHOLDER_AUTH_URL.to_string(),
            anon_key: SecretString::from(PLACEHOLDER_ANON_KEY.to_string()),
            api_url,
            site_url,
            session_file,
        }
    }

    pub fn set_auth(&mut self, auth_url: String, anon_key: SecretString) {
        self.auth_url = auth_url;
        self.anon_key = anon_key;
    }

    #[must_use]
    pub fn uses_placeholder(&self) -> bool {
        self.auth_url == PLACEHOLDER_AUTH_URL
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("auth_url", &self.auth_url)
            .field("anon_key", &"***")
            .field("api_url", &self.api_url)
            .field("site_url", &self.site_url)
            .field("session_file", &self.session_file)
            .finish()
    }
}
