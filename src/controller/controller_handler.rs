use std::sync::Arc;

use log::{error, info};

use crate::configuration::config::Config;
use crate::data_capture::MjpegEncoderFactory;
use crate::detection::factory_from_config;
use crate::error_handling::types::*;
use crate::network::network_listener::NetworkListener;
use crate::reporting::BackendReporter;
use crate::session_management::SessionContext;

/// Wires the process-wide collaborators together and runs the listener.
pub struct Controller {
    pub config: Arc<Config>,
    ctx: SessionContext,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing controller");

        config.ensure_output_dir()?;
        let trackers = factory_from_config(&config.detector)?;
        let encoders = Arc::new(MjpegEncoderFactory::new(
            &config.recorder.output_dir,
            config.recorder.jpeg_quality,
        ));
        let reporter = BackendReporter::new(&config.reporter).map_err(|e| {
            error!("Unable to build the backend reporter: {}", e);
            ControllerError::ReportingError(e)
        })?;

        let config = Arc::new(config);
        let ctx = SessionContext::new(config.clone(), trackers, encoders, Arc::new(reporter));

        info!(
            "Detector: {:?}, {} workers; reporting to {}",
            config.detector.kind, config.detector.workers, config.reporter.endpoint
        );
        Ok(Self { config, ctx })
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Binds the listen address and serves until the process stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        let addr = self.config.listen_addr()?;
        let listener = NetworkListener::bind(addr).await?;
        listener.run(self.ctx).await;
        Ok(())
    }
}
