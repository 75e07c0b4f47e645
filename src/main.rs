use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = relocate::cli::parse();
    app::run(args)
}
