use idle_controller::{cli::{Cli, VERSION}, server, Config};
use log::{error, info};

fn main() {
    let cli = Cli::init();

    let config = match Config::load_from_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading config: {}", e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    if cli.check {
        println!("Config OK");
        std::process::exit(exitcode::OK);
    }

    let _log_handle = match config.log.setup("server") {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error setting up logging: {}", e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    info!("Starting {} {}", env!("CARGO_PKG_NAME"), VERSION);

    if let Err(e) = server::run(config) {
        error!("Runtime failed: {}", e);
        std::process::exit(exitcode::OSERR);
    }
}
