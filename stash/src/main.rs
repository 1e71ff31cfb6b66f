use stash_config::{StashConfig, DEFAULT_CONFIG_FILE};
use stash_core::master::Master;
use utils::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let cfg = StashConfig::from_file_or_default(&path);
    init_tracing(cfg.global().log_level());
    cfg.print();

    let master = Master::new(cfg)?;
    master.run().await?;

    Ok(())
}
