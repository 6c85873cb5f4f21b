use uuid::Uuid;
use zeroize::Zeroizing;

/// Row from the external account catalog
#[derive(Clone)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub terminal_login: Option<i64>,
    pub terminal_secret: Option<String>,
    pub server: Option<String>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("terminal_login", &self.terminal_login)
            .field("terminal_secret", &self.terminal_secret.as_ref().map(|_| "****"))
            .field("server", &self.server)
            .finish()
    }
}

impl Account {
    /// Credentials for the terminal, or `None` when any part is missing or empty.
    pub fn credentials(&self) -> Option<Credentials> {
        let login = self.terminal_login.filter(|login| *login != 0)?;
        let secret = self
            .terminal_secret
            .as_deref()
            .filter(|s| !s.is_empty())?;
        let server = self
            .server
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;

        Some(Credentials {
            login,
            secret: Zeroizing::new(secret.to_string()),
            server: server.to_string(),
        })
    }
}

/// Login material for one trading account. The secret is wiped on drop.
#[derive(Clone)]
pub struct Credentials {
    pub login: i64,
    pub secret: Zeroizing<String>,
    /// Nominal server name as entered by the user
    pub server: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"****")
            .field("server", &self.server)
            .finish()
    }
}
