use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = fire_planner::api::Cli::parse();
    if let Err(e) = fire_planner::api::run_cli(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
