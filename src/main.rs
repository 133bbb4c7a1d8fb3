use storefront::{Config, build_rocket, init_tracing};

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.logging);

    let _rocket = build_rocket(config).launch().await?;
    Ok(())
}
