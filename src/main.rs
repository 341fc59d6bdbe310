//! Punto de entrada ("driver").
//!
//! Este módulo lee el archivo fuente, invoca la traducción y expone
//! una CLI. La salida es todo o nada: ante un diagnóstico no se
//! escribe nada y el proceso termina con estado -1.

use anyhow::{self, Context};
use clap::{crate_version, Arg, Command};
use log::LevelFilter;
use traductor::target::Target;

use std::{fs, io::Write, str::FromStr};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("traductor")
        .version(crate_version!())
        .about("Traductor de un lenguaje imperativo pequeño")
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .value_name("TARGET")
                .takes_value(true)
                .default_value("pascal")
                .possible_values(["pascal", "c"])
                .help("Lenguaje objetivo"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .takes_value(true)
                .default_value("-")
                .help("Archivo de salida ('-' para stdout)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Bitácora de depuración en stderr"),
        )
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .required(true)
                .help("Archivo fuente"),
        )
        .get_matches();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"));
    if args.is_present("verbose") {
        logger.filter_level(LevelFilter::Debug);
    }

    logger.init();

    // Se extraen argumentos; clap ya validó valores y defaults
    let target = args
        .value_of("target")
        .and_then(|target| Target::from_str(target).ok())
        .unwrap_or_default();

    let output = args.value_of("output").unwrap_or("-");
    let input = args.value_of("input").context("Missing input file")?;

    let source = fs::read(input)
        .with_context(|| format!("Failed to read source file: {}", input))?;

    // Fuentes que no son UTF-8 se leen como Latin-1, byte a carácter
    let source = String::from_utf8(source).unwrap_or_else(|error| {
        log::debug!("{} is not UTF-8, reading as Latin-1", input);
        error.into_bytes().into_iter().map(char::from).collect()
    });

    log::debug!("translating {} for target {}", input, target);

    let text = match traductor::translate(&source, target) {
        Ok(text) => text,
        Err(diagnostic) => {
            eprintln!("{}", diagnostic);
            std::process::exit(-1);
        }
    };

    match output {
        "-" => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }

        path => {
            fs::write(path, text).with_context(|| format!("Failed to write to file: {}", path))?;
        }
    }

    Ok(())
}
