/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    // Load configuration from rune.toml
    let config = rune_config::RuneConfig::load();

    println!("=== Rune Motion Configuration ===\n");

    println!("Animation Settings:");
    println!("  Slow Animations: {}", config.animation.use_slow_animations);
    println!("  Slow Factor: {}", config.animation.slow_factor);
    println!("  Desired FPS: {}", config.animation.desired_fps);
    println!("  Frame Interval: {:.3}ms", config.animation.frame_interval_ms());
    println!("  Max Catch-up Frames: {}", config.animation.max_catch_up_frames);
    println!("  Compaction Interval: {}", config.animation.compaction_interval);
    println!();

    println!("Logging Settings:");
    println!("  Filter: {:?}", config.logging.filter);
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
