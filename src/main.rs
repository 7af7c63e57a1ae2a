use vouchomat::{config::load_config, App, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // We have a different logging mechanism for production
    #[cfg(not(debug_assertions))]
    {
        vouchomat::init_production_tracing()
    }
    #[cfg(debug_assertions)]
    {
        vouchomat::init_dbg_tracing();
    }

    let config = load_config()?;
    let app = App::build_from_config(config).await?;

    vouchomat::serve(app).await?;

    Ok(())
}
