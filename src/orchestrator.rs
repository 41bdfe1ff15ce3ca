//! Job orchestration: turn "fabricate this file" into a validated,
//! routed, dispatched job.
//!
//! Dispatch always runs the same bracket against the chosen driver:
//! connect, upload, start, disconnect. The disconnect runs on every
//! exit path once the connect succeeded, so a failed upload never
//! leaks a protocol session.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    geometry, select_device, AnyDriver, Control as ControlTrait, DeviceSnapshot, Error, JobMode,
    JobSpec, ModelDimensions, Registry, SelectionResult, StatusCache,
};

/// A request to fabricate one model file.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// The local model file.
    pub file: PathBuf,
    /// What kind of fabrication to run.
    pub mode: JobMode,
    /// Route to this device instead of letting selection pick one. The
    /// device must still support the mode and fit the model; its
    /// availability is the caller's problem.
    pub device: Option<String>,
    /// Optional nozzle/tool temperature override, °C.
    pub nozzle_temp: Option<u32>,
    /// Optional bed temperature override, °C.
    pub bed_temp: Option<u32>,
}

impl JobRequest {
    /// A request with no overrides.
    pub fn new(file: PathBuf, mode: JobMode) -> Self {
        Self {
            file,
            mode,
            device: None,
            nozzle_temp: None,
            bed_temp: None,
        }
    }
}

/// A successfully dispatched job.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    /// Identifier assigned to this job.
    pub job_id: Uuid,
    /// The device the job is running on.
    pub device_id: String,
    /// Why that device was chosen.
    pub rationale: String,
    /// Name of the uploaded file as the device knows it.
    pub remote_name: String,
    /// Dimensions of the dispatched model.
    pub dimensions: ModelDimensions,
}

/// The lifecycle commands that run against an already-routed device.
#[derive(Debug, Clone, Copy)]
enum LifecycleOp {
    Pause,
    Resume,
    Cancel,
}

/// Coordinates analysis, selection, and dispatch across the fleet.
pub struct Orchestrator {
    registry: Arc<Registry>,
    cache: Arc<StatusCache>,
}

impl Orchestrator {
    /// An orchestrator over the given registry and status cache.
    pub fn new(registry: Arc<Registry>, cache: Arc<StatusCache>) -> Self {
        Self { registry, cache }
    }

    /// The status cache backing routing decisions.
    pub fn status_cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    /// Analyze a model and report where it would be routed, without
    /// touching any device beyond a status read.
    pub async fn analyze_model(
        &self,
        file: &std::path::Path,
        mode: JobMode,
    ) -> Result<(ModelDimensions, SelectionResult), Error> {
        let dims = geometry::analyze(file)?;
        let selection = select_device(&self.fleet_snapshot().await, mode, &dims)?;
        Ok((dims, selection))
    }

    /// Validate, route, and dispatch a job.
    ///
    /// Geometry is validated before any device is touched. A selected
    /// device that is already running or paused fails the request with
    /// [Error::DeviceBusy]; an explicitly requested device skips that
    /// check.
    pub async fn queue_job(&self, request: JobRequest) -> Result<QueuedJob, Error> {
        let dims = geometry::analyze(&request.file)?;

        let (device_id, rationale) = match &request.device {
            Some(id) => {
                let capabilities = self.registry.capabilities(id)?;
                if !capabilities.supports(request.mode) {
                    return Err(Error::UnknownDevice(format!(
                        "device {} does not run {} jobs",
                        id, request.mode
                    )));
                }
                if !capabilities.fits(&dims) {
                    return Err(Error::ModelTooLarge {
                        max_dimension: dims.max_dimension,
                        largest_envelope: capabilities.envelope.max_extent(),
                    });
                }
                (id.clone(), format!("{} was explicitly requested", id))
            }
            None => {
                let selection = select_device(&self.fleet_snapshot().await, request.mode, &dims)?;
                if !selection.device_available {
                    return Err(Error::DeviceBusy {
                        device: selection.device_id,
                    });
                }
                (selection.device_id, selection.rationale)
            }
        };

        let job_id = Uuid::new_v4();
        tracing::info!(
            job = %job_id,
            device = %device_id,
            mode = %request.mode,
            rationale = %rationale,
            "dispatching job"
        );

        let driver = self.registry.get_driver(&device_id)?;
        let mut driver = driver.lock().await;

        driver.connect().await?;
        let dispatched = dispatch(&mut driver, &request, job_id).await;
        let remote_name = self.close_session(&mut driver, &device_id, dispatched).await?;

        // The device just changed state; stale cache entries would keep
        // routing jobs at it.
        self.cache.invalidate(&device_id);

        Ok(QueuedJob {
            job_id,
            device_id,
            rationale,
            remote_name,
            dimensions: dims,
        })
    }

    /// Pause the active job on a device.
    pub async fn pause_job(&self, device_id: &str) -> Result<(), Error> {
        self.lifecycle(device_id, LifecycleOp::Pause).await
    }

    /// Resume a paused job on a device.
    pub async fn resume_job(&self, device_id: &str) -> Result<(), Error> {
        self.lifecycle(device_id, LifecycleOp::Resume).await
    }

    /// Cancel the active job on a device.
    pub async fn cancel_job(&self, device_id: &str) -> Result<(), Error> {
        self.lifecycle(device_id, LifecycleOp::Cancel).await
    }

    async fn lifecycle(&self, device_id: &str, op: LifecycleOp) -> Result<(), Error> {
        let driver = self.registry.get_driver(device_id)?;
        let mut driver = driver.lock().await;

        driver.connect().await?;
        let result = match op {
            LifecycleOp::Pause => driver.pause().await,
            LifecycleOp::Resume => driver.resume().await,
            LifecycleOp::Cancel => driver.cancel().await,
        };
        self.close_session(&mut driver, device_id, result).await?;

        self.cache.invalidate(device_id);
        Ok(())
    }

    /// Close the protocol session after a command sequence. The
    /// disconnect always runs; a disconnect failure after a failed
    /// sequence is logged rather than masking the sequence's error.
    async fn close_session<T>(
        &self,
        driver: &mut AnyDriver,
        device_id: &str,
        result: Result<T, Error>,
    ) -> Result<T, Error> {
        let disconnected = driver.disconnect().await;
        match result {
            Ok(value) => {
                disconnected?;
                Ok(value)
            }
            Err(err) => {
                if let Err(disconnect_err) = disconnected {
                    tracing::warn!(
                        device = device_id,
                        error = %disconnect_err,
                        "disconnect failed after job error"
                    );
                }
                Err(err)
            }
        }
    }

    async fn fleet_snapshot(&self) -> Vec<DeviceSnapshot> {
        self.cache
            .get_all_statuses()
            .await
            .into_iter()
            .filter_map(|(id, status)| {
                let capabilities = self.registry.capabilities(&id).ok()?.clone();
                Some(DeviceSnapshot {
                    id,
                    capabilities,
                    status,
                })
            })
            .collect()
    }
}

/// The upload-then-start half of the dispatch bracket. Runs with the
/// session already open; the caller owns the disconnect.
async fn dispatch(
    driver: &mut AnyDriver,
    request: &JobRequest,
    job_id: Uuid,
) -> Result<String, Error> {
    let remote_name = driver.upload_file(&request.file).await?;
    let spec = JobSpec {
        job_id,
        file: request.file.clone(),
        remote_name: remote_name.clone(),
        mode: request.mode,
        nozzle_temp: request.nozzle_temp,
        bed_temp: request.bed_temp,
    };
    driver.start_job(&spec).await?;
    Ok(remote_name)
}
