mod readme;

use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let task = args.last().map(|e| return e.as_str()).unwrap_or_default();

    if task == "update-readme" {
        if let Err(err) = readme::update() {
            eprintln!("ERROR: {err}");
            process::exit(1);
        }
    } else {
        eprintln!("ERROR: No task selected");
        process::exit(1);
    }
}
