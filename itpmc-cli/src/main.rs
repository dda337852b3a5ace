use std::env;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

use anyhow::{anyhow, Error};
use clap::{App, AppSettings, Arg};
use env_logger::Builder;
use log::info;

use itpmc::{BmcConfig, BmcResult, BmcSolver, BmcStatus, InterpolantKind, LogLevel, PreprocessLevel};
use itpmc_io::{parse_problem, Format, Problem};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            eprintln!("Error: {}", err);
            2
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging(level: LogLevel) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, level.filter());

    if let Ok(ref env_var) = env::var("ITPMC_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn yes_no(value: &str) -> bool {
    value == "yes"
}

fn preprocess_level(value: &str) -> PreprocessLevel {
    match value {
        "no" => PreprocessLevel::None,
        "quick" => PreprocessLevel::Quick,
        "expensive" => PreprocessLevel::Expensive,
        _ => unreachable!(),
    }
}

fn status_name(status: BmcStatus) -> &'static str {
    match status {
        BmcStatus::Sat => "SAT",
        BmcStatus::Unsat => "UNSAT",
        BmcStatus::DepthLimitReached => "DEPTH LIMIT",
        BmcStatus::CraigLimitReached => "CRAIG LIMIT",
        BmcStatus::MemoryLimitReached => "MEMORY LIMIT",
        BmcStatus::Interrupted => "INTERRUPTED",
    }
}

fn exit_code(status: BmcStatus) -> i32 {
    match status {
        BmcStatus::Sat => 10,
        BmcStatus::Unsat => 20,
        BmcStatus::DepthLimitReached
        | BmcStatus::CraigLimitReached
        | BmcStatus::MemoryLimitReached => 30,
        BmcStatus::Interrupted => 40,
    }
}

/// Writes the line-oriented result header shared by stdout and result files.
fn write_header(
    target: &mut impl Write,
    result: &BmcResult,
    runtime_secs: u64,
) -> io::Result<()> {
    writeln!(target, "Result: {}", status_name(result.status()))?;
    writeln!(target, "Exit: {}", exit_code(result.status()))?;
    writeln!(target, "Depth: {}", result.depth())?;
    writeln!(target, "Runtime: {} seconds", runtime_secs)
}

/// Echoes every command line argument as an `Option:` line.
fn write_options(target: &mut impl Write) -> io::Result<()> {
    for argument in env::args().skip(1) {
        writeln!(target, "Option: {}", argument)?;
    }
    Ok(())
}

/// Writes a multi-line artefact with a per-line prefix.
fn write_prefixed(target: &mut impl Write, prefix: &str, artefact: &[u8]) -> io::Result<()> {
    for line in String::from_utf8_lossy(artefact).lines() {
        writeln!(target, "{} {}", prefix, line)?;
    }
    Ok(())
}

fn export_result(
    path: &str,
    result: &BmcResult,
    runtime_secs: u64,
    problem: &Problem,
) -> Result<(), Error> {
    info!("exporting result to file \"{}\"", path);
    let mut stream = fs::File::create(path)?;
    write_header(&mut stream, result, runtime_secs)?;
    write_options(&mut stream)?;

    if let Some(model) = result.model() {
        let mut buffer = vec![];
        problem.write_model(&mut buffer, model)?;
        write_prefixed(&mut stream, "Model:", &buffer)?;
    }
    if let Some(certificate) = result.certificate() {
        let mut buffer = vec![];
        problem.write_certificate(&mut buffer, certificate)?;
        write_prefixed(&mut stream, "Certificate:", &buffer)?;
    }
    Ok(())
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("itpmc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interpolation-based bounded model checker")
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("<input> 'Input file, - for stdin'")
        .arg_from_usage("[output] 'Output file for the result summary'")
        .arg(
            Arg::with_name("format")
                .long("format")
                .takes_value(true)
                .possible_values(&["cip", "aiger", "dimspec"])
                .default_value("aiger")
                .help("Input format"),
        )
        .arg(
            Arg::with_name("max-depth")
                .long("max-depth")
                .takes_value(true)
                .default_value("100")
                .help("Maximum number of timeframes"),
        )
        .arg(
            Arg::with_name("interpolant")
                .long("interpolant")
                .takes_value(true)
                .possible_values(&[
                    "symmetric",
                    "asymmetric",
                    "dual-symmetric",
                    "dual-asymmetric",
                    "intersection",
                    "union",
                    "smallest",
                    "largest",
                ])
                .default_value("smallest")
                .help("Craig interpolant selector"),
        )
        .arg(
            Arg::with_name("craig-interpolation")
                .long("craig-interpolation")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("yes")
                .help("Enable Craig interpolation"),
        )
        .arg(
            Arg::with_name("fixed-point-check")
                .long("fixed-point-check")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("yes")
                .help("Enable interpolant fixed-point checks"),
        )
        .arg(
            Arg::with_name("sanity-check-problem")
                .long("sanity-check-problem")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("yes")
                .help("Check satisfiability of init, target and the base case upfront"),
        )
        .arg(
            Arg::with_name("total-trans")
                .long("total-trans")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("no")
                .help("Assume a total transition relation"),
        )
        .arg(
            Arg::with_name("preprocess-init")
                .long("preprocess-init")
                .takes_value(true)
                .possible_values(&["no", "quick", "expensive"])
                .default_value("quick")
                .help("Preprocessing of the initial state"),
        )
        .arg(
            Arg::with_name("preprocess-trans")
                .long("preprocess-trans")
                .takes_value(true)
                .possible_values(&["no", "quick", "expensive"])
                .default_value("quick")
                .help("Preprocessing of the transition relation"),
        )
        .arg(
            Arg::with_name("preprocess-target")
                .long("preprocess-target")
                .takes_value(true)
                .possible_values(&["no", "quick", "expensive"])
                .default_value("quick")
                .help("Preprocessing of the target state"),
        )
        .arg(
            Arg::with_name("preprocess-craig")
                .long("preprocess-craig")
                .takes_value(true)
                .possible_values(&["no", "quick", "expensive"])
                .default_value("quick")
                .help("Preprocessing of Craig interpolants"),
        )
        .arg(
            Arg::with_name("check-problem")
                .long("check-problem")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("no")
                .help("Check the problem for inconsistencies before solving"),
        )
        .arg(
            Arg::with_name("solve-problem")
                .long("solve-problem")
                .takes_value(true)
                .possible_values(&["yes", "no"])
                .default_value("yes")
                .help("Solve the problem (no: parse, check and export only)"),
        )
        .arg(
            Arg::with_name("export-problem")
                .long("export-problem")
                .takes_value(true)
                .value_name("path")
                .help("Export the parsed problem"),
        )
        .arg(
            Arg::with_name("export-result")
                .long("export-result")
                .takes_value(true)
                .value_name("path")
                .help("Export the result summary"),
        )
        .arg(
            Arg::with_name("export-model")
                .long("export-model")
                .takes_value(true)
                .value_name("path")
                .help("Export the model in the SAT case"),
        )
        .arg(
            Arg::with_name("export-certificate")
                .long("export-certificate")
                .takes_value(true)
                .value_name("path")
                .help("Export the certificate in the UNSAT case"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .takes_value(true)
                .possible_values(&[
                    "none",
                    "competition",
                    "minimal",
                    "info",
                    "debug",
                    "trace",
                    "extended-trace",
                    "full-trace",
                ])
                .default_value("minimal")
                .help("Diagnostic verbosity"),
        )
        .get_matches();

    let log_level = match matches.value_of("log").unwrap() {
        "none" => LogLevel::None,
        "competition" => LogLevel::Competition,
        "minimal" => LogLevel::Minimal,
        "info" => LogLevel::Info,
        "debug" => LogLevel::Debug,
        "trace" => LogLevel::Trace,
        "extended-trace" => LogLevel::ExtendedTrace,
        "full-trace" => LogLevel::FullTrace,
        _ => unreachable!(),
    };
    init_logging(log_level);

    let mut config = BmcConfig::default();
    config.log_level = log_level;
    config.max_depth = matches
        .value_of("max-depth")
        .unwrap()
        .parse()
        .map_err(|_| anyhow!("invalid value for max-depth"))?;
    config.interpolant = match matches.value_of("interpolant").unwrap() {
        "symmetric" => InterpolantKind::Symmetric,
        "asymmetric" => InterpolantKind::Asymmetric,
        "dual-symmetric" => InterpolantKind::DualSymmetric,
        "dual-asymmetric" => InterpolantKind::DualAsymmetric,
        "intersection" => InterpolantKind::Intersection,
        "union" => InterpolantKind::Union,
        "smallest" => InterpolantKind::Smallest,
        "largest" => InterpolantKind::Largest,
        _ => unreachable!(),
    };
    config.craig_interpolation = yes_no(matches.value_of("craig-interpolation").unwrap());
    config.fixed_point_check = yes_no(matches.value_of("fixed-point-check").unwrap());
    config.sanity_checks = yes_no(matches.value_of("sanity-check-problem").unwrap());
    config.total_transition_relation = yes_no(matches.value_of("total-trans").unwrap());
    config.preprocess_init = preprocess_level(matches.value_of("preprocess-init").unwrap());
    config.preprocess_trans = preprocess_level(matches.value_of("preprocess-trans").unwrap());
    config.preprocess_target = preprocess_level(matches.value_of("preprocess-target").unwrap());
    config.preprocess_craig = preprocess_level(matches.value_of("preprocess-craig").unwrap());

    let format = match matches.value_of("format").unwrap() {
        "cip" => Format::Cip,
        "aiger" => Format::Aiger,
        "dimspec" => Format::Dimspec,
        _ => unreachable!(),
    };

    let input_path = matches.value_of("input").unwrap();
    let (problem, bmc_problem) = if input_path == "-" {
        info!("reading from stdin");
        let stdin = io::stdin();
        parse_problem(format, stdin.lock())?
    } else {
        info!("reading file \"{}\"", input_path);
        let file = fs::File::open(input_path)
            .map_err(|_| anyhow!("input file \"{}\" was not found", input_path))?;
        parse_problem(format, io::BufReader::new(file))?
    };

    if yes_no(matches.value_of("check-problem").unwrap()) {
        info!("checking problem for inconsistencies");
        if let Err(error) = bmc_problem.check() {
            eprintln!("Error: Found invalid BMC problem: {}", error);
            return Ok(3);
        }
    }

    if let Some(path) = matches.value_of("export-problem") {
        info!("exporting problem to file \"{}\"", path);
        let mut stream = fs::File::create(path)?;
        problem.write(&mut stream)?;
    }

    if !yes_no(matches.value_of("solve-problem").unwrap()) {
        info!("not solving bmc problem");
        return Ok(0);
    }

    info!("solving bmc problem");
    let mut solver = BmcSolver::new(bmc_problem, config);

    let start = Instant::now();
    let result = solver.solve();
    let runtime_secs = start.elapsed().as_secs();

    let mut output: Box<dyn Write> = match matches.value_of("output") {
        Some("-") => Box::new(io::stdout()),
        Some(path) => Box::new(
            fs::File::create(path)
                .map_err(|_| anyhow!("output file \"{}\" could not be created", path))?,
        ),
        None => Box::new(io::sink()),
    };

    eprintln!("Result: {}", status_name(result.status()));
    write_header(&mut output, &result, runtime_secs)?;

    if let Some(model) = result.model() {
        if let Some(path) = matches.value_of("export-model") {
            info!("exporting model to file \"{}\"", path);
            let mut stream = fs::File::create(path)?;
            problem.write_model(&mut stream, model)?;
        }
    }
    if let Some(certificate) = result.certificate() {
        if let Some(path) = matches.value_of("export-certificate") {
            info!("exporting certificate to file \"{}\"", path);
            let mut stream = fs::File::create(path)?;
            problem.write_certificate(&mut stream, certificate)?;
        }
    }
    if let Some(path) = matches.value_of("export-result") {
        export_result(path, &result, runtime_secs, &problem)?;
    }

    Ok(exit_code(result.status()))
}
