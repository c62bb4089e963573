use std::process;

fn main() {
    match docmerge_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("docmerge error: {err:#}");
            process::exit(2);
        }
    }
}
