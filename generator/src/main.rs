use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use marshall_gen::mapping_compiler::{CompileOptions, compile_with};
use marshall_gen::mapping_writer::{self, WriteOptions};
use marshall_gen::primitive_registry::{self, PrimitiveRegistry};
use marshall_gen::{CompileError, MappingFile, Struct, mapping_loader, schema_loader};

fn main() {
    let matches = cli().get_matches();
    init_logging(&matches);

    let phase_start = Instant::now();
    let exit_code = match run(&matches) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    log::debug!("marshall-gen finished in {} ms", phase_start.elapsed().as_millis());
    std::process::exit(exit_code);
}

fn cli() -> Command {
    Command::new("marshall-gen")
        .about("Compiles a struct schema (.mrtype) into a binary field mapping (.mrmap)")
        .arg(
            Arg::new("schema")
                .short('s')
                .long("schema")
                .help("Schema files to read, in order (.mrtype is appended when missing)")
                .num_args(1..)
                .value_name("FILES"),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .help("Struct to compile; prompts on stdin when omitted")
                .value_name("STRUCT"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("out")
                .help("Output mapping path (default: <first schema>.mrmap)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("primitives")
                .short('p')
                .long("primitives")
                .help("Extra primitive registry files, loaded in order")
                .num_args(1..)
                .value_name("FILES"),
        )
        .arg(
            Arg::new("debug-names")
                .long("debug-names")
                .help("Store member names in the mapping for inspection")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("Print the parsed structs and exit")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["target", "output"]),
        )
        .arg(
            Arg::new("view-mapping")
                .long("view-mapping")
                .help("Print the size table and property tree of a .mrmap file and exit")
                .value_name("FILE")
                .num_args(1)
                .conflicts_with_all(["schema", "target", "output", "primitives", "list"]),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .group(
            clap::ArgGroup::new("mode")
                .args(["schema", "view-mapping"])
                .required(true),
        )
}

// RUST_LOG still overrides the level picked from -v/-q
fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("quiet") {
        LevelFilter::Error
    } else {
        match matches.get_count("verbose") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    if let Some(mapping_path) = matches.get_one::<String>("view-mapping") {
        return view_mapping(Path::new(mapping_path));
    }

    let mut registry = PrimitiveRegistry::builtin();
    if let Some(files) = matches.get_many::<String>("primitives") {
        let files: Vec<&str> = files.map(String::as_str).collect();
        registry.load_from_files(&files).map_err(|e| anyhow!(e))?;
    }
    primitive_registry::install(registry).map_err(|e| anyhow!(e))?;

    let schema_paths: Vec<PathBuf> = matches
        .get_many::<String>("schema")
        .map(|paths| paths.map(PathBuf::from).collect())
        .unwrap_or_default();
    let Some(first_schema) = schema_paths.first() else {
        bail!("--schema needs at least one file");
    };
    let structs = schema_loader::load_schemas(&schema_paths)?;

    if matches.get_flag("list") {
        for s in &structs {
            println!("{}\n", s);
        }
        return Ok(());
    }

    let options = CompileOptions {
        debug_names: matches.get_flag("debug-names"),
    };

    let compile_start = Instant::now();
    let (target, mapping) = match matches.get_one::<String>("target") {
        Some(target) => {
            let mapping = compile_with(primitive_registry::global(), &structs, target, options)?;
            (target.clone(), mapping)
        }
        None => prompt_and_compile(&structs, options)?,
    };
    log::info!(
        "compiled {} in {} ms",
        target,
        compile_start.elapsed().as_millis()
    );

    let output_path = match matches.get_one::<String>("output") {
        Some(explicit_path) => PathBuf::from(explicit_path),
        None => mapping_writer::default_output_path(&schema_loader::resolve_schema_path(first_schema)),
    };

    let write_options = WriteOptions {
        debug_names: options.debug_names,
    };
    mapping_writer::write_mapping(&mapping, &output_path, write_options)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "Emitted mapping for {} -> {} ({} sizes, {} properties)",
        target,
        output_path.display(),
        mapping.sizes.len(),
        mapping.properties.len()
    );
    Ok(())
}

// Interactive mode: a missing struct re-prompts with the suggestion instead of exiting
fn prompt_and_compile(structs: &[Struct], options: CompileOptions) -> Result<(String, MappingFile)> {
    let stdin = io::stdin();
    select_target(
        &mut stdin.lock(),
        &mut io::stdout(),
        primitive_registry::global(),
        structs,
        options,
    )
}

fn select_target(
    input: &mut impl BufRead,
    out: &mut impl Write,
    registry: &PrimitiveRegistry,
    structs: &[Struct],
    options: CompileOptions,
) -> Result<(String, MappingFile)> {
    loop {
        write!(out, "Struct to parse: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No struct selected");
        }
        let target = line.trim();
        if target.is_empty() {
            continue;
        }

        match compile_with(registry, structs, target, options) {
            Ok(mapping) => return Ok((target.to_string(), mapping)),
            Err(e @ CompileError::NotFound { .. }) => writeln!(out, "{}", e)?,
            Err(e) => return Err(e.into()),
        }
    }
}

fn view_mapping(path: &Path) -> Result<()> {
    let mapping = mapping_loader::load_mapping(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    println!("Mapping {}", path.display());
    println!();
    print!("{}", mapping.render());
    Ok(())
}
