/// Example program to print the loaded configuration
///
/// Run with: cargo run -p drift-config --example print_config

fn main() {
    let config = match drift_config::DriftConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!("=== Drift Configuration ===\n");

    println!("Animation:");
    println!("  Duration: {} ms", config.animation.duration_ms);
    println!("  Curve: {}", config.animation.curve);
    println!();

    println!("Container:");
    println!("  Orientation: {:?}", config.container.orientation);
    println!("  Spacing: {}", config.container.spacing);
    println!("  Relocation Curve: {}", config.container.relocation_curve);
    match config.container.relocation_duration_ms {
        Some(ms) => println!("  Relocation Duration: {ms} ms"),
        None => println!("  Relocation Duration: follows entrance/exit"),
    }
    println!();

    println!("Frame:");
    println!("  Interval: {} ms", config.frame.interval_ms);
    println!("  Max Frames: {}", config.frame.max_frames);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
