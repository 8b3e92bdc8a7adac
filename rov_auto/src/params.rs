//! # Rover Autonomy Parameters
//!
//! This module provides the parameters of the autonomy pipeline, loaded from `rov_auto.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::auto::{map::WorldMapParams, nav_mgr::NavMgrParams, per::PerMgrParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the whole autonomy pipeline.
///
/// Any missing section or field takes the value tuned for the simulator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RovAutoParams {
    /// Perception parameters.
    pub per: PerMgrParams,

    /// World map parameters.
    pub map: WorldMapParams,

    /// Navigation state machine parameters.
    pub nav: NavMgrParams,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params() {
        let params: RovAutoParams = util::params::from_str(
            r#"
            [map]
            world_size = 100

            [nav]
            stop_forward = 20
            brake_set = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(params.map.world_size, 100);
        assert_eq!(params.map.scale, 10.0);
        assert_eq!(params.nav.stop_forward, 20);
        assert_eq!(params.nav.brake_set, 5.0);
        assert_eq!(params.nav.throttle_set, 0.2);
        assert_eq!(params.per, PerMgrParams::default());
    }

    #[test]
    fn test_default_params_file() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params")
            .join("rov_auto.toml");

        let params: RovAutoParams = util::params::load_path(path).unwrap();

        assert_eq!(params, RovAutoParams::default());
    }
}
