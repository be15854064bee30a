//! Punto de entrada ("driver").
//!
//! Este módulo lee el archivo fuente, invoca al compilador y escribe
//! el programa generado. Expone una CLI.

mod logger;

use anyhow::{anyhow, Context};
use clap::{self, crate_version, Arg, Command};
use obsact::Backend;

use std::{fs, io::Write, str::FromStr};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("ObsAct compiler")
        .version(crate_version!())
        .arg(
            Arg::new("backend")
                .short('b')
                .long("backend")
                .value_name("LANGUAGE")
                .takes_value(true)
                .default_value("c")
                .possible_values(["c", "python"])
                .help("Target language"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase log verbosity (repeatable)"),
        )
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source file"),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Output file ('-' for stdout, defaults to saida.c or saida.py)"),
        )
        .get_matches();

    logger::configure(args.occurrences_of("verbose")).map_err(|error| anyhow!(error))?;

    // Se extraen argumentos necesarios
    let backend = args.value_of("backend").unwrap();
    let backend = Backend::from_str(backend).expect("main.rs allowed a bad backend");
    let input = args.value_of("input").unwrap();
    let output = args
        .value_of("output")
        .unwrap_or_else(|| backend.default_output());

    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read source file: {}", input))?;

    let program = match obsact::compile_named(&source, input, backend) {
        Ok(program) => program,
        Err(diagnostics) => {
            eprint!("{}", diagnostics);
            std::process::exit(1);
        }
    };

    match output {
        "-" => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(program.as_bytes())
                .context("Failed to emit to stdout")?;
        }

        path => {
            fs::write(path, program)
                .with_context(|| format!("Failed to write output file: {}", path))?;

            println!("Generated {}", path);
        }
    }

    Ok(())
}
