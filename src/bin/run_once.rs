//! Run the digest pipeline once against the configured store and print the result.
//!
//! Usage: run_once [--hours N] [--top-n N] [--no-migrate]

use daily_digest::config::AppConfig;
use daily_digest::params::RunParams;
use std::collections::HashMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    daily_digest::init_tracing();

    let mut query = HashMap::new();
    let mut migrate = true;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--hours" => {
                query.insert("hours".to_string(), args.next().unwrap_or_default());
            }
            "--top-n" => {
                query.insert("top_n".to_string(), args.next().unwrap_or_default());
            }
            "--no-migrate" => migrate = false,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    let params = RunParams::from_query(&query);

    let cfg = AppConfig::from_env();
    let pipeline = daily_digest::build_pipeline(&cfg).await?;
    if migrate {
        pipeline.store().migrate().await?;
    }

    let result = pipeline.run(params).await;

    for (source, n) in &result.fetched {
        match result.errors.get(source) {
            Some(err) => println!("{source:>10}: failed ({err})"),
            None => println!("{source:>10}: {n} item(s)"),
        }
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
