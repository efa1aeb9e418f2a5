mod cli;

use crate::cli::app::App;
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    cli::init_tracing();

    let mut app = App::new(args)?;
    app.run().await?;
    Ok(())
}
