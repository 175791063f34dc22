/// Target eBay environment. Every URL and the token file location derive
/// from this value; it is threaded explicitly through constructors instead
/// of living in process globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbayEnv {
    Sandbox,
    Production,
}

impl EbayEnv {
    pub fn name(self) -> &'static str {
        match self {
            EbayEnv::Sandbox => "sandbox",
            EbayEnv::Production => "production",
        }
    }

    pub fn api_root(self) -> &'static str {
        match self {
            EbayEnv::Sandbox => "https://api.sandbox.ebay.com",
            EbayEnv::Production => "https://api.ebay.com",
        }
    }

    /// Root for the user-facing consent page (not the API host).
    pub fn auth_root(self) -> &'static str {
        match self {
            EbayEnv::Sandbox => "https://auth.sandbox.ebay.com",
            EbayEnv::Production => "https://auth.ebay.com",
        }
    }

    pub fn token_url(self) -> String {
        format!("{}/identity/v1/oauth2/token", self.api_root())
    }

    pub fn authorize_url(self) -> String {
        format!("{}/oauth2/authorize", self.auth_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_and_production_hosts_differ() {
        assert!(EbayEnv::Sandbox.api_root().contains("sandbox"));
        assert!(!EbayEnv::Production.api_root().contains("sandbox"));
        assert_eq!(
            EbayEnv::Production.token_url(),
            "https://api.ebay.com/identity/v1/oauth2/token"
        );
    }
}
