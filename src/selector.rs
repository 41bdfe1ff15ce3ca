//! Device selection: given a fleet's capabilities and live status, pick
//! the device a job should run on and say why.
//!
//! Selection is a pure function over snapshots, so it is deterministic
//! and unit-testable without hardware. Preference order for devices
//! that fit: smallest envelope first, finer quality tier breaking ties.
//! Availability never makes selection fail; an unavailable pick is
//! reported through [SelectionResult::device_available] and left to the
//! caller to act on.

use crate::{DeviceCapabilities, DeviceState, DeviceStatus, Error, JobMode, ModelDimensions};

/// One device as the selector sees it: identity, declared capabilities,
/// and the most recent cached status.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    /// Stable device identifier.
    pub id: String,
    /// Declared capabilities.
    pub capabilities: DeviceCapabilities,
    /// Most recent observed status.
    pub status: DeviceStatus,
}

/// The outcome of a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    /// The chosen device.
    pub device_id: String,
    /// Human-readable reason for the choice.
    pub rationale: String,
    /// Whether the model fits the chosen device's envelope.
    pub model_fits: bool,
    /// Whether the chosen device was idle at selection time.
    pub device_available: bool,
}

/// Pick the device for a job.
///
/// Fails with [Error::UnknownDevice] when no configured device supports
/// the mode and [Error::ModelTooLarge] when an additive model fits no
/// supporting device's envelope. Mill and laser-etch jobs are not
/// envelope-gated.
pub fn select_device(
    fleet: &[DeviceSnapshot],
    mode: JobMode,
    dims: &ModelDimensions,
) -> Result<SelectionResult, Error> {
    let supporting: Vec<&DeviceSnapshot> = fleet
        .iter()
        .filter(|device| device.capabilities.supports(mode))
        .collect();
    if supporting.is_empty() {
        return Err(Error::UnknownDevice(format!(
            "no configured device supports {} jobs",
            mode
        )));
    }

    // Mill and laser jobs route to the one device class that runs them;
    // the workpiece envelope is the operator's concern there, not ours.
    // Additive jobs are envelope-gated.
    let mut fitting: Vec<&DeviceSnapshot> = if mode == JobMode::AdditivePrint {
        supporting
            .iter()
            .copied()
            .filter(|device| device.capabilities.fits(dims))
            .collect()
    } else {
        supporting.clone()
    };
    if fitting.is_empty() {
        let largest_envelope = supporting
            .iter()
            .map(|device| device.capabilities.envelope.max_extent())
            .fold(0.0f64, f64::max);
        return Err(Error::ModelTooLarge {
            max_dimension: dims.max_dimension,
            largest_envelope,
        });
    }

    fitting.sort_by(|a, b| {
        a.capabilities
            .envelope
            .max_extent()
            .total_cmp(&b.capabilities.envelope.max_extent())
            .then(b.capabilities.quality_tier.cmp(&a.capabilities.quality_tier))
    });

    if fitting.len() == 1 {
        let only = fitting[0];
        let available = only.status.state == DeviceState::Idle;
        let rationale = if available {
            format!("{} is the only option for this job and is idle", only.id)
        } else {
            format!(
                "{} is the only option for this job; routing although it is {}",
                only.id,
                unavailability(&only.status)
            )
        };
        return Ok(SelectionResult {
            device_id: only.id.clone(),
            rationale,
            model_fits: only.capabilities.fits(dims),
            device_available: available,
        });
    }

    match fitting.iter().position(|device| device.status.state == DeviceState::Idle) {
        // The preferred (smallest) fitting device is idle.
        Some(0) => {
            let chosen = fitting[0];
            Ok(SelectionResult {
                device_id: chosen.id.clone(),
                rationale: format!(
                    "{} is the smallest idle device that fits the model",
                    chosen.id
                ),
                model_fits: chosen.capabilities.fits(dims),
                device_available: true,
            })
        }
        // A larger device is idle; say why each smaller one was passed
        // over.
        Some(at) => {
            let chosen = fitting[at];
            let skipped: Vec<String> = fitting[..at]
                .iter()
                .map(|device| format!("{} is {}", device.id, unavailability(&device.status)))
                .collect();
            Ok(SelectionResult {
                device_id: chosen.id.clone(),
                rationale: format!(
                    "{} selected as fallback: {}",
                    chosen.id,
                    skipped.join("; ")
                ),
                model_fits: chosen.capabilities.fits(dims),
                device_available: true,
            })
        }
        // Nothing fitting is idle. Route to the preferred device anyway
        // and let the caller decide whether to queue behind it.
        None => {
            let chosen = fitting[0];
            Ok(SelectionResult {
                device_id: chosen.id.clone(),
                rationale: format!(
                    "no fitting device is idle; {} is the smallest fit and is {}",
                    chosen.id,
                    unavailability(&chosen.status)
                ),
                model_fits: chosen.capabilities.fits(dims),
                device_available: false,
            })
        }
    }
}

fn unavailability(status: &DeviceStatus) -> &'static str {
    match status.state {
        DeviceState::Printing => "busy printing another job",
        DeviceState::Paused => "busy with a paused job",
        DeviceState::Offline => "offline or unreachable",
        DeviceState::Idle => "idle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceClass, Volume};
    use pretty_assertions::assert_eq;

    fn dims(max: f64) -> ModelDimensions {
        ModelDimensions {
            width: max,
            depth: max / 2.0,
            height: max / 2.0,
            max_dimension: max,
            volume: max * max * max / 4.0,
            surface_area: max * max,
            min_bound: [0.0; 3],
            max_bound: [max, max / 2.0, max / 2.0],
        }
    }

    fn printer(id: &str, extent: f64, tier: u8, state: DeviceState) -> DeviceSnapshot {
        DeviceSnapshot {
            id: id.to_owned(),
            capabilities: DeviceCapabilities {
                class: DeviceClass::Noop,
                modes: vec![JobMode::AdditivePrint],
                envelope: Volume {
                    width: extent,
                    depth: extent,
                    height: extent,
                },
                quality_tier: tier,
            },
            status: DeviceStatus::with_state(state),
        }
    }

    fn mill(id: &str, state: DeviceState) -> DeviceSnapshot {
        DeviceSnapshot {
            id: id.to_owned(),
            capabilities: DeviceCapabilities {
                class: DeviceClass::FabLink,
                modes: vec![JobMode::SubtractiveMill, JobMode::LaserEtch],
                envelope: Volume {
                    width: 600.0,
                    depth: 600.0,
                    height: 200.0,
                },
                quality_tier: 2,
            },
            status: DeviceStatus::with_state(state),
        }
    }

    fn fleet(small_state: DeviceState, large_state: DeviceState) -> Vec<DeviceSnapshot> {
        vec![
            printer("workshop-large", 800.0, 1, large_state),
            printer("workshop-small", 250.0, 3, small_state),
            mill("mill", DeviceState::Idle),
        ]
    }

    #[test]
    fn test_small_model_goes_to_smallest_idle_printer() {
        let fleet = fleet(DeviceState::Idle, DeviceState::Idle);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(150.0)).unwrap();
        assert_eq!(result.device_id, "workshop-small");
        assert!(result.rationale.contains("idle"));
        assert!(result.device_available);
    }

    #[test]
    fn test_busy_small_printer_falls_back_to_large() {
        let fleet = fleet(DeviceState::Printing, DeviceState::Idle);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(180.0)).unwrap();
        assert_eq!(result.device_id, "workshop-large");
        assert!(result.rationale.contains("fallback"));
        assert!(result.rationale.contains("busy printing another job"));
        assert!(result.device_available);
    }

    #[test]
    fn test_offline_small_printer_reason_differs_from_busy() {
        let fleet = fleet(DeviceState::Offline, DeviceState::Idle);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(180.0)).unwrap();
        assert_eq!(result.device_id, "workshop-large");
        assert!(result.rationale.contains("offline or unreachable"));
    }

    #[test]
    fn test_large_model_only_fits_large_printer() {
        let fleet = fleet(DeviceState::Idle, DeviceState::Idle);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(600.0)).unwrap();
        assert_eq!(result.device_id, "workshop-large");
        assert!(result.rationale.contains("only option"));
    }

    #[test]
    fn test_sole_fitting_device_routes_even_when_busy() {
        let fleet = fleet(DeviceState::Idle, DeviceState::Printing);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(600.0)).unwrap();
        assert_eq!(result.device_id, "workshop-large");
        assert!(result.rationale.contains("only option"));
        assert!(!result.device_available);
    }

    #[test]
    fn test_oversized_model_is_rejected_with_remediation() {
        let fleet = fleet(DeviceState::Idle, DeviceState::Idle);
        let err = select_device(&fleet, JobMode::AdditivePrint, &dims(900.0)).unwrap_err();
        match err {
            Error::ModelTooLarge {
                max_dimension,
                largest_envelope,
            } => {
                assert_eq!(max_dimension, 900.0);
                assert_eq!(largest_envelope, 800.0);
            }
            other => panic!("expected ModelTooLarge, got {other}"),
        }
    }

    #[test]
    fn test_mill_job_routes_to_mill_even_when_busy() {
        let mut fleet = fleet(DeviceState::Idle, DeviceState::Idle);
        fleet[2].status = DeviceStatus::with_state(DeviceState::Printing);

        let result = select_device(&fleet, JobMode::SubtractiveMill, &dims(150.0)).unwrap();
        assert_eq!(result.device_id, "mill");
        assert!(result.rationale.contains("only option"));
        assert!(!result.device_available);
    }

    #[test]
    fn test_oversized_mill_part_routes_without_envelope_gate() {
        let fleet = fleet(DeviceState::Idle, DeviceState::Idle);
        let result = select_device(&fleet, JobMode::SubtractiveMill, &dims(900.0)).unwrap();
        assert_eq!(result.device_id, "mill");
        assert!(!result.model_fits);
        assert!(result.device_available);
    }

    #[test]
    fn test_unsupported_mode_is_unknown_device() {
        let fleet = vec![printer("workshop-small", 250.0, 3, DeviceState::Idle)];
        let err = select_device(&fleet, JobMode::LaserEtch, &dims(10.0)).unwrap_err();
        assert!(matches!(err, Error::UnknownDevice(_)));
        assert!(err.to_string().contains("laser-etch"));
    }

    #[test]
    fn test_no_idle_fit_routes_smallest_as_unavailable() {
        let fleet = fleet(DeviceState::Printing, DeviceState::Paused);
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(150.0)).unwrap();
        assert_eq!(result.device_id, "workshop-small");
        assert!(!result.device_available);
    }

    #[test]
    fn test_quality_tier_breaks_envelope_ties() {
        let fleet = vec![
            printer("coarse", 250.0, 1, DeviceState::Idle),
            printer("fine", 250.0, 3, DeviceState::Idle),
        ];
        let result = select_device(&fleet, JobMode::AdditivePrint, &dims(100.0)).unwrap();
        assert_eq!(result.device_id, "fine");
    }
}
