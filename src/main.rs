use std::f32::consts::TAU;

use pcm_player_rs::config::Config;
use pcm_player_rs::{AudioContext, PlaybackSystem};
use tokio::signal;
use tokio::sync::mpsc;

/// Sine oscillator producing fixed-size mono buffers.
struct Tone {
    phase: f32,
    step: f32,
    amplitude: f32,
}

impl Tone {
    fn new(frequency: f32, sample_rate: u32, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate as f32,
            amplitude,
        }
    }

    fn next_buffer(&mut self, len: usize) -> Vec<f32> {
        (0..len)
            .map(|_| {
                let sample = self.amplitude * self.phase.sin();
                self.phase = (self.phase + self.step) % TAU;
                sample
            })
            .collect()
    }
}

async fn play_tone(config: &Config, tx: mpsc::Sender<Vec<f32>>) {
    let mut tone = Tone::new(config.tone_frequency, config.sample_rate, config.tone_amplitude);
    let total = config.sample_rate as u64 * config.tone_duration_ms / 1000;
    let mut sent = 0u64;

    while sent < total {
        let len = (total - sent).min(config.buffer_size as u64) as usize;
        // 阻塞写线程消费缓冲区时这里会自然背压
        if tx.send(tone.next_buffer(len)).await.is_err() {
            log::warn!("Playback thread gone, stopping tone");
            return;
        }
        sent += len as u64;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let config = Config::new().unwrap_or_default();
    log::info!(
        "{} {} starting: rate={}Hz, buffer={} frames",
        config.app_name,
        config.app_version,
        config.sample_rate,
        config.buffer_size,
    );

    let context = AudioContext::global();
    // 任何返回路径都释放音频库
    let _shutdown = context.shutdown_guard();

    // 播放线程通道
    let (tx, rx) = mpsc::channel::<Vec<f32>>(config.queue_depth.max(1));
    let playback = PlaybackSystem::start(context.clone(), config.player_config(), rx)?;

    tokio::select! {
        _ = play_tone(&config, tx) => {}
        _ = signal::ctrl_c() => {
            log::info!("Interrupted, stopping playback");
        }
    }

    // 发送端已释放，等待播放线程排空
    let stats = tokio::task::spawn_blocking(move || playback.finish()).await?;
    log::info!(
        "Playback finished: written={}, dropped={}, underflows={}",
        stats.buffers_written,
        stats.buffers_dropped,
        stats.underflows,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_buffers_have_requested_length_and_amplitude() {
        let mut tone = Tone::new(1_000.0, 48_000, 0.5);
        let buf = tone.next_buffer(480);
        assert_eq!(buf.len(), 480);
        assert_eq!(buf[0], 0.0);
        assert!(buf.iter().all(|s| s.abs() <= 0.5));
        assert!(buf.iter().any(|s| *s > 0.49));
    }

    #[test]
    fn tone_is_continuous_across_buffers() {
        let mut split = Tone::new(440.0, 48_000, 1.0);
        let mut whole = Tone::new(440.0, 48_000, 1.0);
        let mut joined = split.next_buffer(100);
        joined.extend(split.next_buffer(100));
        assert_eq!(joined, whole.next_buffer(200));
    }
}
