use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::process;

use keypress::config::{parse_timeout_ms, Config};
use keypress::logging::*;
use keypress::{echo_with, signals, KeypressError, LoopExit};

fn build_config(matches: &ArgMatches) -> Result<Config, KeypressError> {
	let explicit = matches.get_one::<String>("config").map(PathBuf::from);
	let mut config = Config::load(explicit.as_deref())?;
	config.apply_env()?;

	if let Some(key) = matches.get_one::<String>("exit-key") {
		config.exit_key = key.parse()?;
	}
	if let Some(ms) = matches.get_one::<String>("timeout-ms") {
		config.poll_timeout_ms = parse_timeout_ms(ms)?;
	}
	Ok(config)
}

fn main() {
	init_tracing();

	let matches = Command::new("keypress")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Echo keypresses one per line until the exit key is pressed")
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("PATH")
				.help("Config file (default: ~/.config/keypress/config.toml)"),
		)
		.arg(
			Arg::new("exit-key")
				.short('e')
				.long("exit-key")
				.value_name("KEY")
				.help("Key that ends capture: esc, del, ^X or 0xNN (default: esc)"),
		)
		.arg(
			Arg::new("timeout-ms")
				.short('t')
				.long("timeout-ms")
				.value_name("MS")
				.help("Wait per poll in milliseconds; 0 polls without waiting"),
		)
		.get_matches();

	let result = build_config(&matches).and_then(|config| {
		info!("Capturing keys until {} is pressed", config.exit_key);
		echo_with(&config)
	});

	match result {
		Ok(LoopExit::Interrupted) => {
			let sig = signals::last_signal().unwrap_or(libc::SIGINT);
			debug!("Interrupted by signal {}, exiting", sig);
			process::exit(signals::exit_code(sig));
		}
		Ok(exit) => debug!("Finished: {:?}", exit),
		Err(e) => {
			if e.is_terminal_broken() {
				eprintln!("keypress: {} (run `reset` to repair the terminal)", e);
			} else {
				eprintln!("keypress: {}", e);
			}
			process::exit(1);
		}
	}
}

// vim: ts=4
