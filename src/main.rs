//! Provides the main entry point to the program.
use house_energy_cost::cli::run_cli;
use house_energy_cost::log;
use human_panic::setup_panic;

fn main() {
    setup_panic!();

    if let Err(err) = run_cli() {
        // Errors are logged if the logger is up, otherwise printed to the terminal
        if log::is_logger_initialised() {
            ::log::error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        std::process::exit(1);
    }
}
