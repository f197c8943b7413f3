//! Main car executable entry point.
//!
//! # Architecture
//!
//! The executable runs two tasks on their own threads:
//!
//!     - Control loop, at a fixed rate:
//!         - Vehicle sensing
//!         - Pose estimation
//!         - Stop/resume handling
//!         - Speed and trajectory control
//!         - Vehicle demands
//!     - Perception loop, at the camera frame rate:
//!         - Frame acquisition
//!         - Object detection
//!         - Stop decision and publication
//!
//! The tasks only communicate through the `CoordState`. Ctrl-C raises its terminate flag, as does
//! either task on a fatal error, which stops both tasks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::{sync::Arc, thread};
use structopt::StructOpt;

// Internal
use car_lib::{
    coord::CoordState,
    ctrl_loop::{self, run_ctrl_loop, CtrlEqpt, CtrlLoop},
    params::CarExecParams,
    per::{self, PerMgr},
    per_loop::{run_per_loop, PerEqpt},
    sim::{DeadReckoner, SimCamera, SimDetector, SimGps, SimVehicle, SimWorld},
    speed_ctrl,
    tm::{ArchTmSink, CtrlTm, PerTm},
    traj_ctrl::{self, RoadMap, RoadMapParams, TableRoadMap, TrajCtrl, WaypointPath},
};
use eqpt_if::eqpt::{gps::Gps, loc::Pose};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "car_exec", about = "Self-driving car executable")]
struct Args {
    /// Override the experiment duration in seconds
    #[structopt(short, long)]
    duration: Option<f64>,

    /// Disable steering control, driving straight ahead at the cruise speed
    #[structopt(long)]
    no_steering: bool,

    /// Minimum log level, one of info, debug or trace
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("car_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(args.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Self-Driving Car Executable\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: CarExecParams =
        util::params::load("car_exec.toml").wrap_err("Could not load exec params")?;
    let speed_params: speed_ctrl::Params =
        util::params::load("speed_ctrl.toml").wrap_err("Could not load SpeedCtrl params")?;
    let traj_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load TrajCtrl params")?;
    let per_params: per::Params =
        util::params::load("per_mgr.toml").wrap_err("Could not load PerMgr params")?;
    let mut ctrl_params: ctrl_loop::Params =
        util::params::load("ctrl_loop.toml").wrap_err("Could not load CtrlLoop params")?;

    exec_params
        .per_loop
        .validate()
        .wrap_err("Invalid perception loop params")?;

    if let Some(d) = args.duration {
        ctrl_params.duration_s = d;
    }
    if args.no_steering {
        ctrl_params.steering_enabled = false;
    }

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let (traj_ctrl, initial_pose) = if ctrl_params.steering_enabled {
        let road_map_params: RoadMapParams =
            util::params::load("road_map.toml").wrap_err("Could not load road map params")?;

        let (tc, pose) = init_traj_ctrl(traj_params, &road_map_params)?;
        info!(
            "TrajCtrl init complete, tracking {} waypoints",
            tc.path().get_num_points()
        );
        (Some(tc), pose)
    } else {
        warn!("Steering control disabled");
        (None, Pose::default())
    };

    let cruise_speed_ms = speed_params.cruise_speed_ms;
    let ctrl = CtrlLoop::new(ctrl_params.clone(), speed_params, traj_ctrl)
        .wrap_err("Failed to initialise the control loop")?;
    info!("CtrlLoop init complete");

    let lamp_colours = per_params.colours.clone();
    let per_mgr = PerMgr::new(per_params).wrap_err("Failed to initialise PerMgr")?;
    info!("PerMgr init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE EQUIPMENT ----

    let world = Arc::new(SimWorld::new(exec_params.sim.clone(), initial_pose));

    let ctrl_eqpt = CtrlEqpt {
        vehicle: Box::new(SimVehicle::new(world.clone())),
        gps: if ctrl_params.steering_enabled {
            Some(Box::new(SimGps::new(world.clone())) as Box<dyn Gps>)
        } else {
            None
        },
        estimator: Box::new(DeadReckoner::new(initial_pose)),
    };

    let per_eqpt = PerEqpt {
        camera: Box::new(
            SimCamera::new(world.clone(), &lamp_colours)
                .wrap_err("Failed to initialise the camera")?,
        ),
        detector: Box::new(SimDetector::new(world)),
    };

    info!("Simulated equipment initialised");

    let mut ctrl_tm = ArchTmSink::<CtrlTm>::new(&session, "ctrl_tm.csv")
        .wrap_err("Failed to create the control telemetry archive")?;
    let mut per_tm = ArchTmSink::<PerTm>::new(&session, "per_tm.csv")
        .wrap_err("Failed to create the perception telemetry archive")?;

    // ---- COORDINATION ----

    let coord = Arc::new(CoordState::new(cruise_speed_ms));

    let c = coord.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, terminating");
        c.terminate();
    })
    .wrap_err("Failed to set the interrupt handler")?;

    // ---- RUN TASKS ----

    info!("Starting tasks\n");

    let c = coord.clone();
    let ctrl_handle = thread::Builder::new()
        .name("ctrl".into())
        .spawn(move || run_ctrl_loop(ctrl, ctrl_eqpt, c, &mut ctrl_tm))
        .wrap_err("Failed to spawn the control thread")?;

    let c = coord.clone();
    let per_loop_params = exec_params.per_loop;
    let per_handle = thread::Builder::new()
        .name("per".into())
        .spawn(move || run_per_loop(per_mgr, per_eqpt, &per_loop_params, c, &mut per_tm))
        .wrap_err("Failed to spawn the perception thread")?;

    let ctrl_result = ctrl_handle.join();

    // Make sure perception stops whatever happened to the control thread
    coord.terminate();
    let per_result = per_handle.join();

    // ---- SHUTDOWN ----

    let ctrl_summary = ctrl_result
        .map_err(|_| eyre!("The control thread panicked"))?
        .wrap_err("Control loop error")?;
    let per_summary = per_result
        .map_err(|_| eyre!("The perception thread panicked"))?
        .wrap_err("Perception loop error")?;

    info!(
        "Control loop exited ({:?}) after {} cycles",
        ctrl_summary.exit_reason, ctrl_summary.num_cycles
    );
    info!(
        "Perception processed {} frames and published {} stop requests",
        per_summary.num_frames, per_summary.num_publications
    );

    info!("End of execution");

    Ok(())
}

/// Build the path from the road map and create trajectory control, returning it with the initial
/// pose of the vehicle.
fn init_traj_ctrl(
    traj_params: traj_ctrl::Params,
    road_map_params: &RoadMapParams,
) -> Result<(TrajCtrl, Pose), Report> {
    let road_map =
        TableRoadMap::from_params(road_map_params).wrap_err("Invalid road map")?;

    let first_node = road_map_params
        .node_sequence
        .first()
        .copied()
        .ok_or_else(|| eyre!("The node sequence is empty"))?;

    let points = road_map
        .generate_path(&road_map_params.node_sequence)
        .wrap_err("Failed to generate the path")?;
    let initial_pose = road_map
        .get_node_pose(first_node)
        .wrap_err("Failed to get the initial pose")?;

    let cyclic = traj_params.cyclic;
    let path = WaypointPath::new(points, cyclic).wrap_err("Invalid path")?;
    let tc = TrajCtrl::new(traj_params, &path).wrap_err("Failed to initialise TrajCtrl")?;

    Ok((tc, initial_pose))
}
