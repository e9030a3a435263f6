use stackview::cli::{Cli, HELP};
use stackview::config;

pub fn main() -> iced::Result {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let cli = match Cli::parse(pico_args::Arguments::from_env()) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            std::process::exit(2);
        }
    };
    if cli.help {
        print!("{HELP}");
        return Ok(());
    }

    let mut config = config::load(cli.config.as_deref());
    if let Some(url) = cli.sample_url {
        config.sample_data_url = url;
    }

    stackview::app::run(config, cli.files)
}
