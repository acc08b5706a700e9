use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, ResultExt};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use seamcarve::energy::DEFAULT_BLUR_SIGMA;
use seamcarve::{SeamCarver, SEAM_HIGHLIGHT, SobelEnergy, TargetSize};

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("seamcarve")
        .version("0.1.0")
        .about("Content-aware image narrowing by seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to narrow")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATH")
                .help("Where to write the carved image")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("width")
                .short("w")
                .long("width")
                .value_name("SIZE")
                .help("Target width: a pixel count, or a fraction in (0, 1]; a bare 1 means full width")
                .takes_value(true)
                .default_value("1.0"),
        )
        .arg(
            Arg::with_name("height")
                .short("H")
                .long("height")
                .value_name("SIZE")
                .help("Target height; only the current height is supported")
                .takes_value(true)
                .default_value("1.0"),
        )
        .arg(
            Arg::with_name("sigma")
                .long("sigma")
                .value_name("F")
                .help("Gaussian smoothing applied before measuring energy")
                .takes_value(true)
                .conflicts_with("no-blur"),
        )
        .arg(
            Arg::with_name("no-blur")
                .long("no-blur")
                .help("Measure energy on the unsmoothed image"),
        )
        .arg(
            Arg::with_name("energy")
                .long("energy")
                .value_name("PATH")
                .help("Also write the last energy map, scaled to grayscale")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seams")
                .long("seams")
                .value_name("PATH")
                .help("Also write the last seam removed, painted in red")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every removed seam"),
        )
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("seamcarve={}", level))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn estimator(matches: &ArgMatches) -> Result<SobelEnergy, failure::Error> {
    if matches.is_present("no-blur") {
        return Ok(SobelEnergy::new(None));
    }
    let sigma = match matches.value_of("sigma") {
        Some(sigma) => sigma
            .parse::<f32>()
            .with_context(|_| format!("bad --sigma '{}'", sigma))?,
        None => DEFAULT_BLUR_SIGMA,
    };
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(format_err!(
            "--sigma must be a positive number (use --no-blur to skip smoothing), got {}",
            sigma
        ));
    }
    Ok(SobelEnergy::new(Some(sigma)))
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let input = matches
        .value_of("input")
        .ok_or_else(|| format_err!("no input image given"))?;
    let output = matches
        .value_of("output")
        .ok_or_else(|| format_err!("no output path given"))?;
    let width_request: TargetSize = matches.value_of("width").unwrap_or("1.0").parse()?;
    let height_request: TargetSize = matches.value_of("height").unwrap_or("1.0").parse()?;

    let source = image::open(input)
        .with_context(|_| format!("failed to load {}", input))?
        .to_rgb();
    let (width, height) = source.dimensions();
    let target_width = width_request.resolve(width)?;
    let target_height = height_request.resolve(height)?;

    let wants_diagnostics = matches.is_present("energy") || matches.is_present("seams");
    let carver = SeamCarver::with_estimator(estimator(matches)?).keep_diagnostics(wants_diagnostics);
    let result = carver.retarget(&source, target_width, target_height)?;

    result
        .image
        .save(output)
        .with_context(|_| format!("failed to save {}", output))?;
    info!(
        input,
        output,
        width = result.image.width(),
        height = result.image.height(),
        "wrote carved image"
    );

    if let Some(last) = &result.last {
        if let Some(path) = matches.value_of("energy") {
            last.energy_image()
                .save(path)
                .with_context(|_| format!("failed to save {}", path))?;
        }
        if let Some(path) = matches.value_of("seams") {
            last.seam_image(SEAM_HIGHLIGHT)?
                .save(path)
                .with_context(|_| format!("failed to save {}", path))?;
        }
    }
    Ok(())
}

fn main() {
    let matches = app().get_matches();
    init_logging(matches.is_present("verbose"));

    if let Err(err) = run(&matches) {
        error!("{}", err);
        for cause in err.iter_causes() {
            error!("caused by: {}", cause);
        }
        process::exit(1);
    }
}
