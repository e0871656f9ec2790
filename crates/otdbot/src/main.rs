use clap::Parser;

use otdbot::config::CliArgs;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();
    match otdbot::run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("otdbot failed: {err}");
            std::process::exit(1);
        }
    }
}
