use app_lib::ServerConfig;
use clap::Parser;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    app_lib::run(config).await.inspect_err(|e| {
        log::error!("server exited with error: {}", e);
    })
}
