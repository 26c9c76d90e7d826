use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "cgrecon", about = "Reconstruct images from measured signals with CGNE or CGNR")]
pub struct Cli {

    /// TOML file declaring the available models
    #[clap(short, long, default_value = "cgrecon.toml")]
    pub config: PathBuf,

    /// Key of the model which produced the signals (e.g. '60x60')
    #[clap(short, long)]
    pub model: String,

    /// Reconstruction algorithm: CGNE or CGNR
    #[clap(short, long, default_value = "CGNE")]
    pub algorithm: String,

    /// Measured signal files (.csv, .npy, .json, .raw, .bin)
    #[clap(short, long = "signal", required = true, num_args = 1..)]
    pub signals: Vec<PathBuf>,

    /// Apply the sensor gain profile to the signals before reconstructing
    #[clap(long)]
    pub gain: bool,

    /// Where to write the images, if different from the config file's `output_dir`
    #[clap(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Maximum number of rayon threads, if different from the config file's `threads`
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,
}
