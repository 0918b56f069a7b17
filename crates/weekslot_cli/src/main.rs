//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `weekslot_core` linkage without the Flutter runtime.
//! - Print the selectable weekdays of a `DD/MM/YYYY` range when given one.

use std::process::ExitCode;
use weekslot_core::calendar::range_weekdays::weekdays_in_text_range;

fn main() -> ExitCode {
    println!("weekslot_core ping={}", weekslot_core::ping());
    println!("weekslot_core version={}", weekslot_core::core_version());

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [start, end] => match weekdays_in_text_range(start, end) {
            Ok(days) => {
                let names = days
                    .iter()
                    .map(|day| day.full_name())
                    .collect::<Vec<_>>()
                    .join(",");
                println!("weekdays={names}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(2)
            }
        },
        _ => {
            eprintln!("usage: weekslot [START_DATE END_DATE]");
            ExitCode::from(2)
        }
    }
}
