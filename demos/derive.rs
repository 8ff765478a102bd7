//! Example deriving the schema from a struct

use envschema::EnvSchema;

#[derive(Debug, EnvSchema)]
#[env(prefix = "DEMO_")]
struct Config {
    /// Runtime mode of the service
    #[env(one_of = ["development", "production"], default = "development")]
    pub node_env: String,

    // Numeric type, bounded by the u16 range
    #[env(default = 8080, examples = [3000, 8080])]
    pub port: u16,

    // Boolean type
    #[env(default = false)]
    pub debug_mode: bool,

    /// Semicolon separated feature flags
    #[env(list, default = "")]
    pub feature_flags: Vec<String>,

    // Optional field: None when not set
    pub api_token: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let env = [
        ("DEMO_NODE_ENV", "production"),
        ("DEMO_FEATURE_FLAGS", "Search;Beta-UI;"),
        ("DEMO_PORT", "3000"),
    ];

    let config = Config::from_env_map(env)?;

    println!("Configuration loaded:");
    println!("  Node env: {}", config.node_env);
    println!("  Port: {}", config.port);
    println!("  Debug mode: {}", config.debug_mode);
    println!("  Feature flags: {:?}", config.feature_flags);
    println!("  API token set: {}", config.api_token.is_some());

    // A broken environment reports every offending variable at once
    let broken = [("DEMO_NODE_ENV", "staging"), ("DEMO_PORT", "http")];
    if let Err(err) = Config::from_env_map(broken) {
        println!("\nDiagnostics:\n{err}");
        println!("Causes: {:?}", err.causes());
    }

    Ok(())
}
