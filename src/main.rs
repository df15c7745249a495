//! 命令行入口。
use clap::{Arg, Command};
use log::debug;

use spn_bench::config::Config;
use spn_bench::pipeline;

fn make_cli() -> Command {
    Command::new("spn-bench")
        .version("v0.1.0")
        .about("Generates benchmark datasets of stochastic Petri nets with steady-state analysis")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the YAML configuration file")
                .default_value("config.yaml"),
        )
}

fn main() {
    if std::env::var("SPN_LOG").is_ok() {
        let env = env_logger::Env::new()
            .filter("SPN_LOG")
            .write_style("SPN_LOG_STYLE");
        env_logger::init_from_env(env);
    }

    let matches = make_cli().get_matches();
    let config_path = matches.get_one::<String>("config").unwrap();

    let result = Config::load_from_file(config_path).and_then(|config| {
        debug!("loaded configuration: {config:?}");
        pipeline::run(&config)
    });
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
