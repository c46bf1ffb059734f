//! Assembling a build — headless demo.
//!
//! Loads a mid-tower case, drops a motherboard, CPU and cooler into it, fills
//! every fan slot, then opens the side panel (which pulls the side fan back
//! out). Frames are simulated at 60 Hz; the final state is printed as JSON.
//!
//! Run with: `RUST_LOG=debug cargo run -p rigsmith --example assemble`

use rigsmith::prelude::*;

const FRAME: f32 = 1.0 / 60.0;

fn run_frames(runtime: &mut Runtime, seconds: f32) {
    let frames = (seconds / FRAME).ceil() as usize;
    for _ in 0..frames {
        runtime.update(FRAME);
    }
}

fn main() {
    env_logger::init();

    let mut loader = JsonLoader::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/examples/assets"));
    let mut runtime = Runtime::new(Scene::new());

    let Some(case) = runtime.add_model(&mut loader, "case.json") else {
        log::error!("The case failed to load");
        return;
    };
    runtime.set_base_model(Some(case));
    if let Some(bounds) = runtime.base_model_bounds() {
        log::info!("Framing camera on {:?} (center {:?})", bounds, bounds.center());
    }

    // Each part waits on its host's placement, so the chain plays in order.
    let mut host = case;
    for source in ["motherboard.json", "cpu.json", "cooler.json"] {
        let Some(part) = runtime.add_model(&mut loader, source) else { continue };
        match runtime.attach_anywhere(host, part, false) {
            Some((mount, _)) => {
                log::info!("{source} goes into {}", runtime.mount(mount).map_or("?", |m| m.name()));
                run_frames(&mut runtime, 1.2);
                host = part;
            }
            None => log::warn!("Nothing on {host} takes {source}"),
        }
    }

    let mut fans = Vec::new();
    loop {
        let Some(fan) = runtime.add_model(&mut loader, "fan.json") else { break };
        if runtime.attach_anywhere(case, fan, false).is_none() {
            log::info!("All fan slots taken after {} fans", fans.len());
            runtime.dispose(fan, true);
            break;
        }
        fans.push(fan);
    }
    runtime.play_animation();
    run_frames(&mut runtime, 1.5);

    let panel = runtime
        .model(case)
        .and_then(|model| {
            model
                .toggles()
                .iter()
                .copied()
                .find(|&toggle| runtime.toggle(toggle).is_some_and(|t| t.name() == "side_panel"))
        });
    if let Some(panel) = panel {
        let tasks = runtime.set_toggle_enabled(panel, false);
        log::info!("Opening the side panel scheduled {} tasks", tasks.len());
        run_frames(&mut runtime, 3.0);
    }

    runtime.dispose_unbounded_models();
    log::info!(
        "{} models live, {} fans attached",
        runtime.models().len(),
        fans.iter()
            .filter(|&&fan| runtime.model(fan).is_some_and(|m| m.mounted_at().is_some()))
            .count()
    );

    #[cfg(feature = "diagnostics")]
    match serde_json::to_string_pretty(&runtime.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Snapshot serialization failed: {e}"),
    }
}
