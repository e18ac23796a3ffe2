//! `inputmux watch`: drive a context from the tokio runtime.

use std::collections::HashMap;
use std::io::Write;
use std::os::fd::AsFd;
use std::path::PathBuf;

use anyhow::{bail, Context as _};
use inputmux_core::{Context, DirectIo};
use inputmux_types::{DeviceId, EventKind};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::output::format_event;

pub async fn run(config: Config, devices: Vec<PathBuf>, json: bool) -> anyhow::Result<()> {
    let devices = if devices.is_empty() {
        config.devices.clone()
    } else {
        devices
    };
    if devices.is_empty() {
        bail!("no devices given on the command line or in the config file");
    }

    let mut ctx = Context::builder(DirectIo)
        .config(config.context)
        .span(info_span!("inputmux", pid = std::process::id()))
        .build()?;

    let mut names: HashMap<DeviceId, String> = HashMap::new();
    for path in &devices {
        match ctx.add_device(path) {
            Ok(id) => {
                names.insert(id, ctx[id].sysname().to_owned());
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping device"),
        }
    }
    if names.is_empty() {
        bail!("none of the devices could be opened");
    }

    let fd = ctx
        .as_fd()
        .try_clone_to_owned()
        .context("failed to duplicate the context descriptor")?;
    let readiness = AsyncFd::with_interest(fd, Interest::READABLE)?;
    info!(devices = names.len(), "watching devices, press Ctrl-C to stop");

    loop {
        let mut stdout = std::io::stdout().lock();
        while let Some(event) = ctx.get_event() {
            let name = names.get(&event.device_id).map_or("?", String::as_str);
            if json {
                serde_json::to_writer(&mut stdout, &event)?;
                writeln!(stdout)?;
            } else {
                writeln!(stdout, "{}", format_event(name, &event))?;
            }
            if event.kind == EventKind::DeviceRemoved {
                names.remove(&event.device_id);
            }
        }
        stdout.flush()?;
        drop(stdout);

        tokio::select! {
            guard = readiness.readable() => {
                let mut guard = guard?;
                // Each dispatch reads a bounded amount per device.
                while ctx.dispatch()? > 0 {}
                guard.clear_ready();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    let ids: Vec<DeviceId> = ctx.devices().collect();
    for id in ids {
        ctx.remove_device(id)?;
    }
    Ok(())
}
