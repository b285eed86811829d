use std::process::ExitCode;

use chrono::Local;
use cronlaunch::Cron;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        let program = args.first().map_or("launch_times", String::as_str);
        eprintln!("Usage: {program} '<cron expression>' <count>");
        return ExitCode::from(2);
    }

    let count: usize = match args[2].parse() {
        Ok(count) => count,
        Err(_) => {
            eprintln!("Count must be a non-negative number, got '{}'", args[2]);
            return ExitCode::from(2);
        }
    };

    let cron: Cron = match args[1].parse() {
        Ok(cron) => cron,
        Err(e) => {
            eprintln!("Couldn't parse '{}': {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    // Next launches after now, in local time
    let time = Local::now();
    for launch in cron.iter_after(time).take(count) {
        println!("{}", launch.format("%Y-%m-%d %H:%M:%S"));
    }

    ExitCode::SUCCESS
}
