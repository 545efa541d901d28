use std::time::{Duration, Instant};

use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use wildmatch::WildMatch;

use crate::intensity_filter::IntensityFilter;
use crate::osc_server::OscServer;
use crate::output::OutputSender;
use crate::settings::Settings;

/// Wires the OSC ingest server, the intensity filter, and the output
/// sender together on one fixed-rate tick loop. One instance per stream;
/// the loop task is the filter's only owner.
pub struct Pipeline {
    epoch: Instant,
    settings: Settings,
    osc_server: OscServer,
    filter: IntensityFilter,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        let epoch = Instant::now();
        let osc_server = OscServer::new(
            settings.osc_in_port,
            WildMatch::new(&settings.osc_path),
            epoch,
        );
        let mut filter = IntensityFilter::new(settings.intensity_config());
        // seed so the very first tick has a position to hold
        filter.ingest(0.0, 0.0);

        Self {
            epoch,
            settings,
            osc_server,
            filter,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let sender = OutputSender::new(
            &self.settings.out_host,
            self.settings.out_port,
            self.settings.out_address.clone(),
        )
        .await?;

        let period = Duration::from_secs_f64(1.0 / self.settings.output_rate);
        let mut ticks = IntervalStream::new(tokio::time::interval(period));

        tracing::info!(
            pattern = %self.settings.osc_path,
            rate = self.settings.output_rate,
            "pipeline running"
        );

        while ticks.next().await.is_some() {
            self.drain_updates();

            let now = self.epoch.elapsed().as_secs_f64();
            match self.filter.sample_parts(now) {
                Ok(out) => {
                    tracing::trace!(
                        timestamp = out.timestamp,
                        position = out.position_term,
                        velocity = out.velocity_term,
                        combined = out.combined,
                        "tick"
                    );
                    sender.send(out.combined).await?;
                }
                // the filter is seeded at startup, so this is a real bug
                Err(error) => {
                    tracing::error!(%error, "output tick failed");
                }
            }
        }

        Ok(())
    }

    /// Pull everything the server buffered since the last tick into the
    /// filter, normalized through the configured input range.
    fn drain_updates(&mut self) {
        while let Some(update) = self.osc_server.try_read_update() {
            let value = self.normalize(update.value);
            tracing::debug!(address = %update.address, raw = update.value, value, "ingest");
            self.filter.ingest(update.timestamp, value);
        }
    }

    fn normalize(&self, raw: f32) -> f32 {
        let start = self.settings.osc_range_start;
        let end = self.settings.osc_range_end;
        if end <= start {
            return raw.clamp(0.0, 1.0);
        }
        ((raw - start) / (end - start)).clamp(0.0, 1.0)
    }
}
