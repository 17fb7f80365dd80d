use anyhow::{bail, Context};
use maplet_sync::prelude::*;
use serde::Deserialize;
use std::{env, fs};

/// One step of a scenario file
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    /// A render pass with new props; `mount: null` means not mounted yet
    Render {
        #[serde(default = "default_mount")]
        mount: Option<String>,
        #[serde(default)]
        props: MapProps,
        /// Event kinds whose envelopes are logged
        #[serde(default)]
        log_events: Vec<EventKind>,
    },
    /// Engine-driven camera change, as from a user gesture
    Simulate { camera: CameraPatch },
    Click {
        at: LatLngAltitude,
        #[serde(default)]
        place_id: Option<String>,
    },
    Unmount,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    api_key: String,
    steps: Vec<Step>,
}

fn default_mount() -> Option<String> {
    Some("root".to_string())
}

/// Replays render / simulate / click steps against the headless engine
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let scenario: Scenario = match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading scenario '{}'", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing scenario '{}'", path))?
        }
        None => demo_scenario(),
    };

    let engine = Rc::new(HeadlessEngine::new());
    let provider = MapProvider::new(engine.clone());
    let status = provider
        .load(&HeadlessLoader::succeeding(), LoaderParams::new(scenario.api_key))
        .await?;
    if !status.is_loaded() {
        bail!("headless engine did not load: {}", status);
    }

    let mut controller = MapController::new(&provider);
    let mut last: Option<(MapProps, Option<MountPoint>)> = None;

    for (index, step) in scenario.steps.into_iter().enumerate() {
        log::info!("step {}: {:?}", index, step);
        match step {
            Step::Render {
                mount,
                props,
                log_events,
            } => {
                let props = log_events.into_iter().fold(props, |mut props, kind| {
                    props.handlers = props.handlers.on(kind, |envelope: &EventEnvelope| {
                        log::info!("{:?} from {:?}: {:?}", envelope.kind, envelope.source, envelope.detail)
                    });
                    props
                });
                let mount = mount.map(MountPoint::new);
                controller.render(&props, mount.as_ref())?;
                last = Some((props, mount));
            }
            Step::Simulate { camera } => {
                with_instance(&controller, |instance| instance.simulate_camera(&camera))?;
            }
            Step::Click { at, place_id } => {
                let event = with_instance(&controller, |instance| {
                    instance.click(at, place_id.as_deref())
                })?;
                log::info!("click stopped: {}", event.is_stopped());
            }
            Step::Unmount => {
                controller.unmount();
                last = None;
            }
        }

        // The host re-renders with its current props whenever the engine moved
        if controller.needs_render() {
            if let Some((props, mount)) = &last {
                controller.render(props, mount.as_ref())?;
            }
        }
    }

    if let Some(camera) = controller.tracked_camera() {
        println!("tracked camera: {}", serde_json::to_string(&camera)?);
    }
    println!("{}", serde_json::to_string_pretty(&engine.journal())?);
    Ok(())
}

fn with_instance<R>(
    controller: &MapController,
    f: impl FnOnce(&HeadlessInstance) -> R,
) -> anyhow::Result<R> {
    let handle = controller.map().context("no live map instance")?;
    let instance = handle
        .downcast_ref::<HeadlessInstance>()
        .context("live instance is not headless")?;
    Ok(f(instance))
}

/// Controlled map in San Francisco that the user tries to pan away from
fn demo_scenario() -> Scenario {
    let props = MapPropsBuilder::new()
        .with_id("demo")
        .with_center(37.7749, -122.4194)
        .with_zoom(12.0)
        .controlled(true)
        .build();

    Scenario {
        api_key: "demo".to_string(),
        steps: vec![
            Step::Render {
                mount: default_mount(),
                props,
                log_events: vec![EventKind::CenterChanged, EventKind::Click],
            },
            Step::Simulate {
                camera: CameraPatch {
                    center: Some(LatLngAltitude::new(40.7128, -74.0060, 0.0)),
                    ..Default::default()
                },
            },
            Step::Click {
                at: LatLngAltitude::new(37.78, -122.41, 0.0),
                place_id: Some("ChIJIQBpAG2ahYAR_6128GcTUEo".to_string()),
            },
            Step::Unmount,
        ],
    }
}
