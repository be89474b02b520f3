mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use pixatools_adapters::{
    present_history_row, present_tool_output, present_usage, read_source_image, write_output,
    HttpImageEditGateway, ImageCrateRaster, InMemoryStateStore, SqliteStateStore, SystemClock,
};
use pixatools_application::{
    ApplicationError, ApplicationService, ClearHistoryCommand, CompressCommand, ConvertCommand,
    CropCommand, EnhanceCommand, FallbackPolicy, FindHistoryQuery, ListHistoryQuery,
    PassportCommand, RasterEngine, RemoveBackgroundCommand, ResizeCommand, StateStore,
    ToolOutput, UsageQuery,
};
use pixatools_domain::{
    CropRatio, DataUrl, OutputFormat, PassportSize, Quality, Rgb, BG_COLORS,
    DEFAULT_COMPRESS_QUALITY, MAX_PASSPORT_DPI, PASSPORT_DPI, PASSPORT_SIZES,
};

#[derive(Debug, Parser)]
#[command(name = "pixatools", version, about = "Local image tools with a daily AI quota")]
struct Cli {
    /// TOML config file (defaults to ./pixatools.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite file holding usage and history
    #[arg(long, global = true)]
    state: Option<String>,
    /// Keep usage and history in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,
    /// What raster tools do when an image cannot be processed
    #[arg(long, global = true, value_enum, default_value_t = Fallback::Fail)]
    fallback: Fallback,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Fallback {
    Fail,
    Original,
}

impl From<Fallback> for FallbackPolicy {
    fn from(value: Fallback) -> Self {
        match value {
            Fallback::Fail => FallbackPolicy::Fail,
            Fallback::Original => FallbackPolicy::ReturnOriginal,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Change pixel dimensions; omit --height to keep the aspect ratio
    Resize {
        input: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: Option<u32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-encode as JPEG at a lower quality
    Compress {
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_COMPRESS_QUALITY, value_parser = parse_quality)]
        quality: f32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert between JPEG, PNG and WebP
    Convert {
        input: PathBuf,
        #[arg(long, value_parser = parse_format)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Center crop to a preset ratio (square, 4:5, 16:9, free)
    Crop {
        input: PathBuf,
        #[arg(long, default_value = "square", value_parser = parse_ratio)]
        ratio: CropRatio,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// AI background removal (uses one unit of the daily quota)
    RemoveBg {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// AI enhancement (uses one unit of the daily quota)
    Enhance {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Passport photo on a solid background
    Passport {
        input: PathBuf,
        #[arg(long, default_value = "us", value_parser = parse_passport_size)]
        size: PassportSize,
        #[arg(long, default_value = "white", value_parser = parse_color)]
        background: Rgb,
        #[arg(
            long,
            default_value_t = PASSPORT_DPI,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PASSPORT_DPI))
        )]
        dpi: u32,
        /// Input already has a transparent background; skip the AI cutout
        #[arg(long)]
        no_cutout: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recent results
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show the AI quota without spending it
    Usage,
    /// List passport sizes and background colors
    Presets,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    List,
    Clear,
    Export { id: String, output: PathBuf },
}

#[derive(Debug)]
enum CommandError {
    Runtime(String),
    Quota(String),
}

impl From<ApplicationError> for CommandError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::QuotaExceeded { .. } => Self::Quota(error.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(1);
        }
    };

    let result = build_application_service(&cli, &config)
        .and_then(|service| run_command(cli.command, cli.fallback.into(), &service, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
        Err(CommandError::Quota(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(3)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, String> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(state) = &cli.state {
        config.state_path = state.clone();
    }
    Ok(config)
}

fn build_application_service(
    cli: &Cli,
    config: &AppConfig,
) -> Result<ApplicationService, CommandError> {
    let store: Arc<dyn StateStore> = if cli.ephemeral {
        Arc::new(InMemoryStateStore::default())
    } else {
        let sqlite = SqliteStateStore::new(&config.state_path);
        sqlite.initialize()?;
        Arc::new(sqlite)
    };
    let gateway = HttpImageEditGateway::new(config.gateway_config())?;
    tracing::debug!(
        state = %config.state_path,
        ephemeral = cli.ephemeral,
        "application service ready"
    );

    Ok(ApplicationService::new(
        store,
        Arc::new(SystemClock),
        Box::new(ImageCrateRaster),
        Box::new(gateway),
        config.quota_policy(),
    ))
}

fn run_command(
    command: Command,
    fallback: FallbackPolicy,
    service: &ApplicationService,
    config: &AppConfig,
) -> Result<(), CommandError> {
    match command {
        Command::Resize {
            input,
            width,
            height,
            output,
        } => {
            let result = service.resize(ResizeCommand {
                source: read_source_image(&input)?,
                width,
                height,
                fallback,
            })?;
            let info = ImageCrateRaster.probe(&result.image.bytes).ok();
            let name = match info {
                Some(info) => format!("resized-{}x{}", info.width, info.height),
                None => format!("resized-{}", result.entry.id),
            };
            save(&result, output, config, &name)
        }
        Command::Compress {
            input,
            quality,
            output,
        } => {
            let result = service.compress(CompressCommand {
                source: read_source_image(&input)?,
                quality: Quality::new(quality).map_err(ApplicationError::from)?,
                fallback,
            })?;
            let name = format!("compressed-{}", result.entry.id);
            save(&result, output, config, &name)
        }
        Command::Convert {
            input,
            format,
            output,
        } => {
            let source = read_source_image(&input)?;
            let name = format!("{}-pixatools", source.name);
            let result = service.convert(ConvertCommand {
                source,
                format,
                fallback,
            })?;
            save(&result, output, config, &name)
        }
        Command::Crop {
            input,
            ratio,
            output,
        } => {
            let result = service.crop(CropCommand {
                source: read_source_image(&input)?,
                ratio,
                fallback,
            })?;
            let name = format!("cropped-{}", result.entry.id);
            save(&result, output, config, &name)
        }
        Command::RemoveBg { input, output } => {
            let result = service.remove_background(RemoveBackgroundCommand {
                source: read_source_image(&input)?,
            })?;
            save(&result, output, config, "cutout")
        }
        Command::Enhance { input, output } => {
            let result = service.enhance(EnhanceCommand {
                source: read_source_image(&input)?,
            })?;
            save(&result, output, config, "enhanced")
        }
        Command::Passport {
            input,
            size,
            background,
            dpi,
            no_cutout,
            output,
        } => {
            let mut command = PassportCommand::new(read_source_image(&input)?, size, background);
            command.dpi = dpi;
            command.remove_background = !no_cutout;
            let result = service.passport(command)?;
            let name = format!("pixatools-passport-{}", result.entry.id);
            save(&result, output, config, &name)
        }
        Command::History { action } => run_history(action, service),
        Command::Usage => {
            let status = service.usage(UsageQuery)?;
            println!("{}", present_usage(&status));
            Ok(())
        }
        Command::Presets => {
            println!("passport sizes:");
            for size in PASSPORT_SIZES {
                let (width, height) = size.pixel_dimensions(PASSPORT_DPI);
                println!("  {}\t{}\t{}x{} px", size.name, size.label, width, height);
            }
            println!("background colors:");
            for color in BG_COLORS {
                println!("  {}\t{}", color.value, color.name);
            }
            Ok(())
        }
    }
}

fn run_history(action: HistoryAction, service: &ApplicationService) -> Result<(), CommandError> {
    match action {
        HistoryAction::List => {
            let entries = service.list_history(ListHistoryQuery)?;
            if entries.is_empty() {
                println!("no recent files");
                return Ok(());
            }
            for entry in entries {
                println!("{}", present_history_row(&entry));
            }
            Ok(())
        }
        HistoryAction::Clear => {
            service.clear_history(ClearHistoryCommand)?;
            println!("history cleared");
            Ok(())
        }
        HistoryAction::Export { id, output } => {
            let entry = service.find_history(FindHistoryQuery { id })?;
            let bytes = DataUrl::parse(&entry.data_url)
                .and_then(|url| url.decode())
                .map_err(ApplicationError::from)?;
            write_output(&output, &bytes)?;
            println!("exported {} to {}", entry.name, output.display());
            Ok(())
        }
    }
}

fn save(
    result: &ToolOutput,
    output: Option<PathBuf>,
    config: &AppConfig,
    default_stem: &str,
) -> Result<(), CommandError> {
    let path = output.unwrap_or_else(|| default_output_path(config, default_stem, result));
    write_output(&path, &result.image.bytes)?;
    println!("{}", present_tool_output(result, &path.display().to_string()));
    Ok(())
}

fn default_output_path(config: &AppConfig, stem: &str, result: &ToolOutput) -> PathBuf {
    let extension = OutputFormat::from_mime(&result.image.mime_type)
        .map(OutputFormat::extension)
        .unwrap_or("img");
    config.output_dir().join(format!("{stem}.{extension}"))
}

fn parse_quality(value: &str) -> Result<f32, String> {
    let quality: f32 = value
        .parse()
        .map_err(|_| format!("not a number: {value}"))?;
    Quality::new(quality)
        .map(Quality::get)
        .map_err(|error| error.to_string())
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    value.parse().map_err(|error: pixatools_domain::DomainError| error.to_string())
}

fn parse_ratio(value: &str) -> Result<CropRatio, String> {
    value.parse().map_err(|error: pixatools_domain::DomainError| error.to_string())
}

fn parse_passport_size(value: &str) -> Result<PassportSize, String> {
    PassportSize::find(value).map_err(|error| error.to_string())
}

fn parse_color(value: &str) -> Result<Rgb, String> {
    Rgb::resolve(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resize_without_height() {
        let cli = Cli::try_parse_from(["pixatools", "resize", "a.jpg", "--width", "640"])
            .expect("resize should parse");
        assert!(matches!(
            cli.command,
            Command::Resize {
                width: 640,
                height: None,
                ..
            }
        ));
        assert_eq!(cli.fallback, Fallback::Fail);
    }

    #[test]
    fn parse_convert_rejects_unknown_format() {
        let result = Cli::try_parse_from(["pixatools", "convert", "a.png", "--format", "gif"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_compress_rejects_out_of_range_quality() {
        let result = Cli::try_parse_from(["pixatools", "compress", "a.png", "--quality", "1.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_passport_presets() {
        let cli = Cli::try_parse_from([
            "pixatools",
            "passport",
            "me.png",
            "--size",
            "uk",
            "--background",
            "studio blue",
            "--no-cutout",
        ])
        .expect("passport should parse");
        match cli.command {
            Command::Passport {
                size,
                background,
                no_cutout,
                ..
            } => {
                assert_eq!(size.name, "UK_PASSPORT");
                assert_eq!(background, Rgb([0x1E, 0x40, 0xAF]));
                assert!(no_cutout);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_passport_rejects_out_of_range_dpi() {
        for dpi in ["0", "1201", "4000000"] {
            let result = Cli::try_parse_from(["pixatools", "passport", "me.png", "--dpi", dpi]);
            assert!(result.is_err(), "dpi {dpi}");
        }
    }

    #[test]
    fn quota_errors_map_to_their_own_exit_path() {
        let error: CommandError = ApplicationError::QuotaExceeded { limit: 5 }.into();
        assert!(matches!(error, CommandError::Quota(_)));
    }

    #[test]
    fn ephemeral_service_runs_history_commands() {
        let cli = Cli::try_parse_from(["pixatools", "--ephemeral", "history", "list"])
            .expect("parse");
        let config = AppConfig::default();
        let service = build_application_service(&cli, &config).expect("service");
        run_command(cli.command, cli.fallback.into(), &service, &config).expect("list");
    }

    fn write_png(dir: &tempfile::TempDir) -> PathBuf {
        let input = dir.path().join("in.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
            .save(&input)
            .expect("save");
        input
    }

    fn run_ephemeral(args: &[&str]) -> (ApplicationService, Result<(), CommandError>) {
        let mut argv = vec!["pixatools", "--ephemeral"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("parse");
        let config = AppConfig::default();
        let service = build_application_service(&cli, &config).expect("service");
        let result = run_command(cli.command, cli.fallback.into(), &service, &config);
        (service, result)
    }

    #[test]
    fn oversized_resize_is_a_runtime_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let input = write_png(&dir);
        let input = input.display().to_string();
        let output = dir.path().join("out.jpg").display().to_string();
        let huge = u32::MAX.to_string();

        let (_service, result) = run_ephemeral(&[
            "resize",
            input.as_str(),
            "--width",
            huge.as_str(),
            "--height",
            huge.as_str(),
            "-o",
            output.as_str(),
        ]);
        match result {
            Err(CommandError::Runtime(message)) => {
                assert!(message.contains("cannot allocate"), "{message}")
            }
            other => panic!("expected runtime error, got {other:?}"),
        }
    }

    #[test]
    fn ai_command_without_api_key_spends_no_quota() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let input = write_png(&dir);
        let input = input.display().to_string();

        let (service, result) = run_ephemeral(&["remove-bg", input.as_str()]);
        assert!(matches!(result, Err(CommandError::Runtime(_))));
        assert_eq!(service.usage(UsageQuery).expect("usage").used, 0);
    }

    #[test]
    fn resize_writes_output_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let input = dir.path().join("in.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([1, 2, 3]))
            .save(&input)
            .expect("save");
        let output = dir.path().join("out.jpg");

        let cli = Cli::try_parse_from([
            "pixatools".to_string(),
            "--ephemeral".to_string(),
            "resize".to_string(),
            input.display().to_string(),
            "--width".to_string(),
            "20".to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ])
        .expect("parse");
        let config = AppConfig::default();
        let service = build_application_service(&cli, &config).expect("service");
        run_command(cli.command, cli.fallback.into(), &service, &config).expect("resize");

        let written = image::open(&output).expect("open output");
        assert_eq!((written.width(), written.height()), (20, 10));
        assert_eq!(
            service.list_history(ListHistoryQuery).expect("list")[0].name,
            "Resized Image"
        );
    }
}
