//! Example demonstrating nested configuration passed as JSON text

use envschema::EnvSchema;

#[derive(Debug, EnvSchema)]
struct DatabaseConfig {
    pub host: String,

    #[env(default = 5432)]
    pub port: u16,

    pub username: String,
}

impl DatabaseConfig {
    fn connection_string(&self) -> String {
        format!("{}:{} (user: {})", self.host, self.port, self.username)
    }
}

#[derive(Debug, EnvSchema)]
struct Config {
    pub app_name: String,

    #[env(nested)]
    pub database: DatabaseConfig,
}

fn main() -> anyhow::Result<()> {
    let env = [
        ("APP_NAME", "my-application"),
        ("DATABASE", r#"{"HOST":"localhost","USERNAME":"admin"}"#),
    ];

    let config = Config::from_env_map(env)?;

    println!("Configuration loaded:");
    println!("  App Name: {}", config.app_name);
    println!("  Database: {}", config.database.connection_string());

    Ok(())
}
