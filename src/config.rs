use std::str::FromStr;

use crate::audio::{PlayerConfig, DEFAULT_DEVICE};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // 应用信息
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 播放配置
    pub playback_device: &'static str,
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub silence_prime: bool,
    pub queue_depth: usize,

    // 测试音配置
    pub tone_frequency: f32,
    pub tone_amplitude: f32,
    pub tone_duration_ms: u64,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            playback_device: env!("PLAYBACK_DEVICE"),
            sample_rate: parse(env!("PLAYBACK_SAMPLE_RATE"), "Failed to parse PLAYBACK_SAMPLE_RATE")?,
            buffer_size: parse(env!("PLAYBACK_BUFFER_SIZE"), "Failed to parse PLAYBACK_BUFFER_SIZE")?,
            silence_prime: parse(env!("PLAYBACK_SILENCE_PRIME"), "Failed to parse PLAYBACK_SILENCE_PRIME")?,
            queue_depth: parse(env!("PLAYBACK_QUEUE_DEPTH"), "Failed to parse PLAYBACK_QUEUE_DEPTH")?,

            tone_frequency: parse(env!("TONE_FREQUENCY"), "Failed to parse TONE_FREQUENCY")?,
            tone_amplitude: parse(env!("TONE_AMPLITUDE"), "Failed to parse TONE_AMPLITUDE")?,
            tone_duration_ms: parse(env!("TONE_DURATION_MS"), "Failed to parse TONE_DURATION_MS")?,
        })
    }

    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            device: self.playback_device.to_string(),
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            silence_prime: self.silence_prime,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let player = PlayerConfig::default();
        Self {
            app_name: env!("CARGO_PKG_NAME"),
            app_version: env!("CARGO_PKG_VERSION"),
            playback_device: DEFAULT_DEVICE,
            sample_rate: player.sample_rate,
            buffer_size: player.buffer_size,
            silence_prime: player.silence_prime,
            queue_depth: 8,
            tone_frequency: 440.0,
            tone_amplitude: 0.2,
            tone_duration_ms: 3000,
        }
    }
}

fn parse<T: FromStr>(value: &str, what: &'static str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Config(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_time_config_parses() {
        let config = Config::new().unwrap();
        assert!(config.sample_rate > 0);
        assert!(config.buffer_size > 0);
        assert!(config.queue_depth > 0);
    }

    #[test]
    fn player_config_carries_playback_section() {
        let config = Config {
            playback_device: "hw:1,0",
            sample_rate: 44_100,
            buffer_size: 512,
            silence_prime: true,
            ..Config::default()
        };
        let player = config.player_config();
        assert_eq!(player.device, "hw:1,0");
        assert_eq!(player.sample_rate, 44_100);
        assert_eq!(player.buffer_size, 512);
        assert!(player.silence_prime);
    }

    #[test]
    fn parse_reports_field_on_failure() {
        assert_eq!(parse::<u32>(" 48000 ", "rate").unwrap(), 48_000);
        assert!(parse::<bool>("true", "flag").unwrap());
        assert!(matches!(
            parse::<u32>("fast", "Failed to parse PLAYBACK_SAMPLE_RATE"),
            Err(Error::Config("Failed to parse PLAYBACK_SAMPLE_RATE"))
        ));
    }
}
