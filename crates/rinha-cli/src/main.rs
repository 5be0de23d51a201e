use std::{env, fs, process::ExitCode};

use rinha::Program;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: rinha <ast.json>");
        return ExitCode::FAILURE;
    };

    let document = match read_file(file_path) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let program = match Program::load_str(&document) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error:\n{err}");
            return ExitCode::FAILURE;
        }
    };

    // Echo the program back in surface form before running it.
    println!("{program}");
    println!();

    match program.run_no_limits() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error:\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot read {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("cannot read {file_path}: {err}"))
}
