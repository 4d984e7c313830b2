use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    playback: Playback,
    tone: Tone,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Playback {
    device: String,
    sample_rate: u32,
    buffer_size: usize,
    silence_prime: bool,
    queue_depth: usize,
}

#[derive(Deserialize)]
struct Tone {
    frequency: f32,
    amplitude: f32,
    duration_ms: u64,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 播放配置
    println!("cargo:rustc-env=PLAYBACK_DEVICE={}", config.playback.device);
    println!("cargo:rustc-env=PLAYBACK_SAMPLE_RATE={}", config.playback.sample_rate);
    println!("cargo:rustc-env=PLAYBACK_BUFFER_SIZE={}", config.playback.buffer_size);
    println!("cargo:rustc-env=PLAYBACK_SILENCE_PRIME={}", config.playback.silence_prime);
    println!("cargo:rustc-env=PLAYBACK_QUEUE_DEPTH={}", config.playback.queue_depth);

    // 测试音配置
    println!("cargo:rustc-env=TONE_FREQUENCY={}", config.tone.frequency);
    println!("cargo:rustc-env=TONE_AMPLITUDE={}", config.tone.amplitude);
    println!("cargo:rustc-env=TONE_DURATION_MS={}", config.tone.duration_ms);
}
