use color_eyre::Result;

use pack_tracker::config::Config;
use pack_tracker::tracker::Tracker;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    Tracker::new(config)?.run()
}
