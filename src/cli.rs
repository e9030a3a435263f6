use std::path::PathBuf;

pub const HELP: &str = "\
stackview: browse a DICOM series slice by slice

USAGE:
  stackview [OPTIONS] [FILES]...

OPTIONS:
  --config <PATH>       Read settings from PATH instead of the default location
  --sample-url <URL>    Directory serving manifest.json and sample_dicom/
  -h, --help            Print this help

FILES are opened after start-up instead of the sample series.
";

#[derive(Debug, Default, PartialEq)]
pub struct Cli {
    pub help: bool,
    pub config: Option<PathBuf>,
    pub sample_url: Option<String>,
    pub files: Vec<PathBuf>,
}

impl Cli {
    pub fn parse(mut args: pico_args::Arguments) -> Result<Self, pico_args::Error> {
        let help = args.contains(["-h", "--help"]);
        let config = args.opt_value_from_str("--config")?;
        let sample_url = args.opt_value_from_str("--sample-url")?;
        let files = args.finish().into_iter().map(PathBuf::from).collect();
        Ok(Self {
            help,
            config,
            sample_url,
            files,
        })
    }
}
