mod app;
mod config_store;
mod logging;

fn main() -> anyhow::Result<()> {
    app::run()
}
