//! Basic usage example with a hand-built schema

use envschema::{parse_value, process_env, Schema};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let schema = Schema::object()
        .property(
            "NODE_ENV",
            Schema::union([Schema::literal("development"), Schema::literal("production")])
                .with_default("development")
                .with_examples(["development", "production"]),
        )
        .property(
            "DEBUG",
            Schema::boolean().with_default(true).with_examples([true, false]),
        )
        .property("FEATURE_FLAGS", Schema::string_list().with_default(""))
        .property(
            "SERVER_PORT",
            Schema::integer()
                .with_default(0x0801)
                .with_examples([3000, 5000, 0x0801, 0xffff]),
        )
        .property(
            "DATABASE_URL",
            Schema::string()
                .min_length(24)
                .with_description("Connection string of the primary database")
                .with_examples(["postgresql://<username>:<password>@<host>:<port>/<database>"]),
        );

    // Start from the process environment and override a single variable
    let mut env = process_env();
    env.insert("VERSION".to_string(), "1.0.0".to_string());

    match parse_value(&schema, &env) {
        Ok(config) => {
            println!("Configuration loaded:");
            println!("  Node env: {}", config["NODE_ENV"]);
            println!("  Debug: {}", config["DEBUG"]);
            println!("  Feature flags: {}", config["FEATURE_FLAGS"]);
            println!("  Server port: {}", config["SERVER_PORT"]);
            println!("  Database URL: {}", config["DATABASE_URL"]);
        }
        Err(err) => {
            eprintln!("Invalid environment:\n{err}");
            eprintln!("Offending variables: {:?}", err.causes());
        }
    }

    Ok(())
}
