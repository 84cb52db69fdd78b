use binimage::config::{self, Config};
use binimage::imaging::{ImageHandle, RasterHandle, Value};
use binimage::output::{self, ImageInfo};
use binimage::{Forwarded, Proxy};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "binimage")]
#[command(about = "Border cropping, binarization and fitting for scanned images")]
#[command(long_about = "\
Border cropping, binarization and fitting for scanned images

Composite operations:

  crop-border    crop to the content around black pixels; blank pages are
                 copied unchanged
  crop-border --binary
                 decide the crop on a black/white copy, cut it from the
                 original colors
  binarize       quantize to gray, then ordered-dither to black and white
  fit            shrink into a bounding box, only if the image exceeds it

Any library primitive or composite can be invoked by name:

  binimage call scan.png bounding_box
  binimage call scan.png quantize 16 gray --output gray.png
  binimage call scan.png level_in_place 20 230 --output leveled.png

Run 'binimage gen-config' to generate a documented binimage.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./binimage.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log composite decisions (binimage=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show size, black-pixel flag, bounding box and color count
    Info {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Crop the border around the image content
    CropBorder {
        input: PathBuf,
        output: PathBuf,
        /// Treat the image as binary when looking for content
        #[arg(long)]
        binary: bool,
    },
    /// Convert to a black and white image
    Binarize { input: PathBuf, output: PathBuf },
    /// Shrink the image to fit the given bounds if it exceeds them
    Fit {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
    },
    /// Invoke an operation by name
    Call {
        input: PathBuf,
        operation: String,
        args: Vec<String>,
        /// Where to write an image result (or the receiver after an in-place form)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock binimage.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match cli.command {
        Command::GenConfig => Config::default(),
        _ => config::load_config(cli.config.as_deref())?,
    };
    init_tracing(&config, cli.verbose)?;

    match cli.command {
        Command::Info { input, json } => {
            let proxy = load(&input)?;
            let info = ImageInfo::gather(&proxy, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&info);
            }
        }
        Command::CropBorder {
            input,
            output,
            binary,
        } => {
            let proxy = load(&input)?;
            let cropped = if binary {
                proxy.crop_border_treating_as_binary(&config.binary.options())?
            } else {
                proxy.crop_border()?
            };
            save(&input, &proxy, &output, &cropped)?;
        }
        Command::Binarize { input, output } => {
            let proxy = load(&input)?;
            let binary = proxy.to_binary(&config.binary.options())?;
            save(&input, &proxy, &output, &binary)?;
        }
        Command::Fit {
            input,
            output,
            max_width,
            max_height,
        } => {
            let proxy = load(&input)?;
            let fitted = proxy.fit_to_size(
                max_width.unwrap_or(config.fit.max_width),
                max_height.unwrap_or(config.fit.max_height),
            )?;
            save(&input, &proxy, &output, &fitted)?;
        }
        Command::Call {
            input,
            operation,
            args,
            output,
        } => {
            let mut proxy = load(&input)?;
            let (columns, rows) = (proxy.columns(), proxy.rows());
            let args: Vec<&str> = args.iter().map(String::as_str).collect();

            match call_with_defaults(&mut proxy, &operation, &args, &config)? {
                Forwarded::Image(result) => match output {
                    Some(path) => {
                        result.image().write(&path)?;
                        println!(
                            "{}",
                            output::format_written(
                                &input,
                                (columns, rows),
                                &path,
                                (result.columns(), result.rows())
                            )
                        );
                    }
                    None => println!(
                        "{operation}: {}x{} image (use --output to save it)",
                        result.columns(),
                        result.rows()
                    ),
                },
                Forwarded::Value(value) => {
                    output::print_value(&operation, &value);
                    if let (Value::Unit, Some(path)) = (&value, output) {
                        proxy.image().write(&path)?;
                        println!(
                            "{}",
                            output::format_written(
                                &input,
                                (columns, rows),
                                &path,
                                (proxy.columns(), proxy.rows())
                            )
                        );
                    }
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`, which
/// wins over `[logging] level`.
fn init_tracing(config: &Config, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let fallback = if verbose {
        "binimage=debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()?;
    Ok(())
}

fn load(path: &Path) -> binimage::Result<Proxy> {
    let proxy = Proxy::<RasterHandle>::load_from_file(path)?;
    debug!(path = %path.display(), columns = proxy.columns(), rows = proxy.rows(), "loaded");
    Ok(proxy)
}

fn save(input: &Path, source: &Proxy, output: &Path, result: &Proxy) -> binimage::Result<()> {
    result.image().write(output)?;
    println!(
        "{}",
        output::format_written(
            input,
            (source.columns(), source.rows()),
            output,
            (result.columns(), result.rows())
        )
    );
    Ok(())
}

/// By-name call where argument-less parameterized operations take their
/// parameters from the config file instead of the built-in defaults.
fn call_with_defaults(
    proxy: &mut Proxy,
    operation: &str,
    args: &[&str],
    config: &Config,
) -> binimage::Result<Forwarded<RasterHandle>> {
    if !args.is_empty() {
        return proxy.call(operation, args);
    }

    let binary = config.binary.options();
    let unit = Forwarded::Value(Value::Unit);
    Ok(match operation {
        "to_binary" => Forwarded::Image(proxy.to_binary(&binary)?),
        "to_binary_in_place" => {
            proxy.to_binary_in_place(&binary)?;
            unit
        }
        "crop_border_treating_as_binary" => {
            Forwarded::Image(proxy.crop_border_treating_as_binary(&binary)?)
        }
        "crop_border_treating_as_binary_in_place" => {
            proxy.crop_border_treating_as_binary_in_place(&binary)?;
            unit
        }
        "level_in_place" => {
            proxy.level_in_place(&config.level.params())?;
            unit
        }
        "quantize_in_place" => {
            proxy.quantize_in_place(&config.quantize.params())?;
            unit
        }
        "fit_to_size" => {
            Forwarded::Image(proxy.fit_to_size(config.fit.max_width, config.fit.max_height)?)
        }
        "fit_to_size_in_place" => {
            proxy.fit_to_size_in_place(config.fit.max_width, config.fit.max_height)?;
            unit
        }
        _ => return proxy.call(operation, args),
    })
}
