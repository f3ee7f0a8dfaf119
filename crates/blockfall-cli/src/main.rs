mod command;
mod store;
mod util;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    command::run()
}
