use clap::Parser;
use std::path::PathBuf;

/// User-specified command line parameters
#[derive(Debug, Parser)]
#[clap(name = "AUR", about)]
pub struct Args {
    #[clap(long, short = 'c', default_value = "aur.toml")]
    /// Path to the configuration file. Defaults are used if it doesn't exist.
    pub config: PathBuf,

    #[clap(long, short = 'f')]
    /// Overrides the amount of frames to run.
    pub frames: Option<u64>,

    #[clap(long)]
    /// Forces the headless renderer, even if a GPU is available.
    pub headless: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::parse_from(["aur", "--frames", "10", "--headless"]);
        assert_eq!(args.config, PathBuf::from("aur.toml"));
        assert_eq!(args.frames, Some(10));
        assert!(args.headless);
    }
}
