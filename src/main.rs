use animation_service::cli::{self, Cli};
use animation_service::logger::init_logger;
use clap::Parser;
use dotenv::dotenv;

#[actix_web::main]
async fn main() {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        log::error!("(main) {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
