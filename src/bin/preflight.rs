use logepi::domain::statement::render_ident;
use logepi::infra::{config, database};
use logepi::{EventStore, PgEventStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--table <name>]\n\
         \n\
         Reads the same configuration as the server:\n\
           $LOGEPI_CONFIG, or config.json next to the executable\n\
           PORT overrides the listen port\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let table = match args.iter().position(|a| a == "--table") {
        Some(idx) => match args.get(idx + 1) {
            Some(t) => Some(t.clone()),
            None => usage_and_exit(),
        },
        None => None,
    };

    let settings = config::Settings::load()?;

    println!("> Preflight:");
    println!("  config: {}", config::config_path()?.display());
    println!("  listen: {}", settings.listen_on());
    println!("  database: {}", settings.database.redacted());
    println!("  identifiers: {:?}", settings.ident_mode);
    if settings.database.ssl_mode != config::DEFAULT_SSL_MODE {
        eprintln!("  Warning: sslmode is not 'require'.");
    }

    let pool = database::connect(&settings.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed connection to DB: {}", e))?;
    let store = PgEventStore::new(pool.clone());
    store
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("DB ping failed: {}", e))?;
    println!("  Database reachable.");

    if let Some(table) = table {
        // to_regclass resolves the name the same way the INSERT will.
        let name = render_ident(&table, settings.ident_mode);
        let found: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(&name)
            .fetch_one(&pool)
            .await?;
        match found {
            Some(resolved) => println!("  Table {} resolves to {}.", table, resolved),
            None => return Err(anyhow::anyhow!("Table {} does not exist", table)),
        }
    }

    println!("> Preflight OK.");
    Ok(())
}
